//! Driver for the AT-command MP3 module.
//!
//! Provides [`Player`], which owns the serial port and implements the
//! blocking command/response exchange, and the [`AudioDevice`] trait through
//! which the rest of the crate issues commands.

use core::marker::PhantomData;

use embedded_io::{ErrorKind, Read, ReadReady, Write};

use crate::command::{Command, PlayAction, PlayMode, Query, Switch, TERMINATOR};
use crate::response::{FileName, Frame, Response, decode_file_name};
use crate::time::{TimeInstant, TimeSource, has_elapsed};
use crate::transport::{SerialOpener, UartConfig};

/// How long [`Player::send`] waits for a terminated reply.
pub const RESPONSE_TIMEOUT_MS: u64 = 1000;

/// Size of a single read from the port.
const READ_CHUNK: usize = 32;

/// Errors that can occur while talking to the player.
///
/// Device-side problems (no reply, no `OK`, garbage) are not errors; they are
/// reported through [`Response`]. Only transport faults end up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerError {
    /// The serial channel could not be opened.
    TransportUnavailable,
    /// The requested baud rate or framing is not what the module speaks.
    UnsupportedBaudRate(u32),
    /// The port reported an error while reading or writing.
    Transport(ErrorKind),
    /// The encoded command does not fit the line buffer.
    CommandTooLong,
}

impl core::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlayerError::TransportUnavailable => write!(f, "serial channel unavailable"),
            PlayerError::UnsupportedBaudRate(baud) => {
                write!(f, "unsupported serial configuration at {} baud", baud)
            }
            PlayerError::Transport(kind) => write!(f, "serial transport error: {:?}", kind),
            PlayerError::CommandTooLong => write!(f, "command exceeds line buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlayerError {}

fn transport<E: embedded_io::Error>(err: E) -> PlayerError {
    PlayerError::Transport(err.kind())
}

/// Anything that accepts player commands.
///
/// [`send`](AudioDevice::send) is the single primitive; every other method
/// builds a [`Command`] and forwards to it.
pub trait AudioDevice {
    /// Sends one command and returns whatever came back.
    fn send(&mut self, command: Command<'_>) -> Result<Response, PlayerError>;

    /// `AT`. Succeeds when the module is listening.
    fn test_connection(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::Test)
    }

    /// `AT+VOL=<level>`, clamped to [`MAX_VOLUME`](crate::command::MAX_VOLUME).
    fn set_volume(&mut self, level: u8) -> Result<Response, PlayerError> {
        self.send(Command::SetVolume(level))
    }

    /// `AT+VOL=?`.
    fn query_volume(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::QueryVolume)
    }

    /// `AT+PLAYFILE=<path>`, e.g. `/01/ESPRESSO.MP3`.
    fn play_file(&mut self, path: &str) -> Result<Response, PlayerError> {
        self.send(Command::PlayFile(path))
    }

    /// `AT+PLAYNUM=<number>`.
    fn play_file_number(&mut self, number: u16) -> Result<Response, PlayerError> {
        self.send(Command::PlayFileNumber(number))
    }

    /// `AT+PLAY=PP`. Toggles play/pause.
    fn toggle_pause(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::Playback(PlayAction::PlayPause))
    }

    /// `AT+PLAY=NEXT`.
    fn play_next(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::Playback(PlayAction::Next))
    }

    /// `AT+PLAY=LAST`.
    fn play_previous(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::Playback(PlayAction::Previous))
    }

    /// `AT+TIME=-<seconds>`.
    fn fast_rewind(&mut self, seconds: u16) -> Result<Response, PlayerError> {
        self.send(Command::Rewind(seconds))
    }

    /// `AT+TIME=+<seconds>`.
    fn fast_forward(&mut self, seconds: u16) -> Result<Response, PlayerError> {
        self.send(Command::FastForward(seconds))
    }

    /// `AT+TIME=<second>`. Restarts the current track at `second`.
    fn play_from_second(&mut self, second: u16) -> Result<Response, PlayerError> {
        self.send(Command::Seek(second))
    }

    /// `AT+PROMPT=ON|OFF`.
    fn set_prompt_tone(&mut self, state: Switch) -> Result<Response, PlayerError> {
        self.send(Command::PromptTone(state))
    }

    /// `AT+AMP=ON|OFF`.
    fn set_amplifier(&mut self, state: Switch) -> Result<Response, PlayerError> {
        self.send(Command::Amplifier(state))
    }

    /// `AT+LED=ON|OFF`.
    fn set_led(&mut self, state: Switch) -> Result<Response, PlayerError> {
        self.send(Command::Led(state))
    }

    /// `AT+PLAYMODE=<1..5>`.
    fn set_play_mode(&mut self, mode: PlayMode) -> Result<Response, PlayerError> {
        self.send(Command::PlayMode(mode))
    }

    /// `AT+PLAYMODE=?`.
    fn query_play_mode(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::QueryPlayMode)
    }

    /// `AT+QUERY=<1..5>`.
    fn query(&mut self, query: Query) -> Result<Response, PlayerError> {
        self.send(Command::Query(query))
    }

    /// `AT+STOP`.
    fn stop(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::Stop)
    }

    /// `AT+DEL`. Deletes the file currently playing.
    fn delete_current_file(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::DeleteCurrent)
    }

    /// `AT+REC=RP`. Starts or pauses recording.
    fn record(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::Record)
    }

    /// `AT+REC=SAVE`.
    fn save_recording(&mut self) -> Result<Response, PlayerError> {
        self.send(Command::SaveRecording)
    }

    /// `AT+BAUDRATE=<rate>`.
    ///
    /// The module answers at the old rate and then switches. This driver only
    /// speaks 115200, so anything else loses the link until the port is
    /// reopened.
    fn set_baud_rate(&mut self, rate: u32) -> Result<Response, PlayerError> {
        self.send(Command::BaudRate(rate))
    }

    /// `AT+QUERY=5`. Asks for the name of the file currently playing.
    ///
    /// Returns `Ok(None)` when the reply is missing, incomplete, or not
    /// valid UTF-16. Only transport faults are errors.
    fn query_file_name(&mut self) -> Result<Option<FileName>, PlayerError> {
        let response = self.send(Command::Query(Query::FileName))?;
        let Some(payload) = response.payload() else {
            warn!("file name query failed: {}", response.outcome());
            return Ok(None);
        };

        match decode_file_name(payload) {
            Ok(name) => Ok(Some(name)),
            Err(_err) => {
                warn!("file name reply malformed: {}", _err);
                Ok(None)
            }
        }
    }
}

impl<P: AudioDevice + ?Sized> AudioDevice for &mut P {
    fn send(&mut self, command: Command<'_>) -> Result<Response, PlayerError> {
        (**self).send(command)
    }
}

/// An absent device.
///
/// `None` accepts every command and answers [`Response::Empty`] at once,
/// which lets the controller keep polling buttons when the module could not
/// be opened.
impl<P: AudioDevice> AudioDevice for Option<P> {
    fn send(&mut self, command: Command<'_>) -> Result<Response, PlayerError> {
        match self {
            Some(device) => device.send(command),
            None => {
                debug!("no player attached, dropping {}", command);
                Ok(Response::Empty)
            }
        }
    }
}

/// Drives the MP3 module over a serial port.
///
/// Every command is written as one CRLF-terminated line, then the driver
/// busy-polls the port until the reply ends in CRLF or the response window
/// closes. Commands are therefore strictly serialized; there is no
/// additional client-side cooldown.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `S` - Serial port type
/// * `T` - Time source implementation type
pub struct Player<'t, I: TimeInstant, S, T: TimeSource<I>> {
    port: S,
    time_source: &'t T,
    timeout_ms: u64,
    _instant: PhantomData<I>,
}

impl<'t, I, S, T> Player<'t, I, S, T>
where
    I: TimeInstant,
    S: Read + Write + ReadReady,
    T: TimeSource<I>,
{
    /// Wraps a port that is already open and configured for 115200 8N1.
    pub fn new(port: S, time_source: &'t T) -> Self {
        Self {
            port,
            time_source,
            timeout_ms: RESPONSE_TIMEOUT_MS,
            _instant: PhantomData,
        }
    }

    /// Opens the serial channel described by `config` and wraps it.
    ///
    /// # Errors
    /// * `UnsupportedBaudRate` - `config` is not 115200 8N1
    /// * `TransportUnavailable` - the opener could not claim the lines
    pub fn configure<O>(
        opener: &mut O,
        config: &UartConfig,
        time_source: &'t T,
    ) -> Result<Self, PlayerError>
    where
        O: SerialOpener<Port = S>,
    {
        if !config.is_supported() {
            error!("refusing serial config at {} baud", config.baud_rate);
            return Err(PlayerError::UnsupportedBaudRate(config.baud_rate));
        }

        let port = opener.open(config).map_err(|_| {
            error!("serial channel {} unavailable", config.channel);
            PlayerError::TransportUnavailable
        })?;

        info!(
            "player on UART{} (tx {}, rx {}) at {} baud",
            config.channel, config.tx_pin, config.rx_pin, config.baud_rate
        );
        Ok(Self::new(port, time_source))
    }

    /// Overrides the response window.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Returns the response window in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Returns a reference to the port.
    pub fn port(&self) -> &S {
        &self.port
    }

    /// Returns a mutable reference to the port.
    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    /// Consumes the driver and returns the port.
    pub fn release(self) -> S {
        self.port
    }

    /// Discards bytes that arrived outside any exchange.
    fn drain(&mut self) -> Result<(), PlayerError> {
        let mut scratch = [0u8; READ_CHUNK];
        while self.port.read_ready().map_err(transport)? {
            let read = self.port.read(&mut scratch).map_err(transport)?;
            if read == 0 {
                break;
            }
            trace!("discarding {} stale bytes", read);
        }
        Ok(())
    }

    /// Polls the port until the accumulator ends in CRLF or the window closes.
    fn wait_for_response(&mut self) -> Result<Response, PlayerError> {
        let start = self.time_source.now();
        let mut frame = Frame::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if self.port.read_ready().map_err(transport)? {
                let read = self.port.read(&mut chunk).map_err(transport)?;
                let received = &chunk[..read];

                let room = frame.capacity() - frame.len();
                if received.len() > room {
                    let _ = frame.extend_from_slice(&received[..room]);
                    warn!("reply overflowed {} byte buffer", frame.capacity());
                    return Ok(Response::Overflow(frame));
                }
                let _ = frame.extend_from_slice(received);

                if frame.ends_with(TERMINATOR) {
                    trace!("rx {}", frame.as_slice());
                    return Ok(Response::Complete(frame));
                }
            }

            if has_elapsed(self.time_source.now(), start, self.timeout_ms) {
                break;
            }
        }

        if frame.is_empty() {
            warn!("no reply within {} ms", self.timeout_ms);
            Ok(Response::Empty)
        } else {
            warn!("reply not terminated within {} ms: {}", self.timeout_ms, frame.as_slice());
            Ok(Response::Timeout(frame))
        }
    }
}

impl<'t, I, S, T> AudioDevice for Player<'t, I, S, T>
where
    I: TimeInstant,
    S: Read + Write + ReadReady,
    T: TimeSource<I>,
{
    fn send(&mut self, command: Command<'_>) -> Result<Response, PlayerError> {
        let line = command.frame().map_err(|_| PlayerError::CommandTooLong)?;

        self.drain()?;
        debug!("tx {}", line.as_str());
        self.port.write_all(line.as_bytes()).map_err(transport)?;
        self.port.flush().map_err(transport)?;

        self.wait_for_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeDuration;
    use core::cell::Cell;
    use core::convert::Infallible;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TestDuration(u64);

    impl TimeDuration for TestDuration {
        fn as_millis(&self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TestInstant(u64);

    impl TimeInstant for TestInstant {
        type Duration = TestDuration;

        fn duration_since(&self, earlier: Self) -> Self::Duration {
            TestDuration(self.0 - earlier.0)
        }
    }

    // Clock that moves forward one millisecond every time it is read
    struct TickingClock {
        now: Cell<u64>,
    }

    impl TimeSource<TestInstant> for TickingClock {
        fn now(&self) -> TestInstant {
            let t = self.now.get();
            self.now.set(t + 1);
            TestInstant(t)
        }
    }

    // Port that replies with a fixed byte string once something is written
    struct CannedPort {
        written: Vec<u8, 128>,
        reply: &'static [u8],
        pending: bool,
    }

    impl CannedPort {
        fn new(reply: &'static [u8]) -> Self {
            Self {
                written: Vec::new(),
                reply,
                pending: false,
            }
        }
    }

    impl embedded_io::ErrorType for CannedPort {
        type Error = Infallible;
    }

    impl Read for CannedPort {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            if !self.pending {
                return Ok(0);
            }
            self.pending = false;
            let n = self.reply.len().min(buf.len());
            buf[..n].copy_from_slice(&self.reply[..n]);
            Ok(n)
        }
    }

    impl ReadReady for CannedPort {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(self.pending && !self.reply.is_empty())
        }
    }

    impl Write for CannedPort {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            let _ = self.written.extend_from_slice(buf);
            self.pending = true;
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    fn clock() -> TickingClock {
        TickingClock { now: Cell::new(0) }
    }

    #[test]
    fn send_writes_one_terminated_line() {
        let clock = clock();
        let mut player = Player::<TestInstant, _, _>::new(CannedPort::new(b"OK\r\n"), &clock);

        let response = player.set_volume(10).unwrap();
        assert!(response.is_success());
        assert_eq!(player.release().written.as_slice(), b"AT+VOL=10\r\n");
    }

    #[test]
    fn unterminated_reply_times_out() {
        let clock = clock();
        let mut player = Player::<TestInstant, _, _>::new(CannedPort::new(b"OK"), &clock);

        let response = player.test_connection().unwrap();
        assert_eq!(response, Response::Timeout(Vec::from_slice(b"OK").unwrap()));
        assert!(clock.now.get() >= RESPONSE_TIMEOUT_MS);
    }

    #[test]
    fn silent_port_yields_empty() {
        let clock = clock();
        let mut player = Player::<TestInstant, _, _>::new(CannedPort::new(b""), &clock).with_timeout(50);

        assert_eq!(player.stop().unwrap(), Response::Empty);
    }

    #[test]
    fn absent_device_answers_empty() {
        let mut device: Option<Player<'_, TestInstant, CannedPort, TickingClock>> = None;
        assert_eq!(device.play_file("/01/ESPRESSO.MP3").unwrap(), Response::Empty);
        assert_eq!(device.query_file_name().unwrap(), None);
    }
}
