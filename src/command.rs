//! AT commands understood by the player module and their line framing.

use core::fmt::{self, Write as _};
use heapless::String;

/// Highest volume the module accepts.
pub const MAX_VOLUME: u8 = 30;

/// Capacity of one encoded command line, terminator included.
pub const COMMAND_CAPACITY: usize = 96;

/// Line terminator appended to every command and expected after every reply.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Two-state switch used by `PROMPT`, `AMP` and `LED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    fn as_str(self) -> &'static str {
        match self {
            Switch::On => "ON",
            Switch::Off => "OFF",
        }
    }
}

impl From<bool> for Switch {
    fn from(on: bool) -> Self {
        if on { Switch::On } else { Switch::Off }
    }
}

/// Transport actions sent through `AT+PLAY=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayAction {
    /// Toggle play/pause. Also used to stop after a fade-out.
    PlayPause,
    /// Skip to the next track.
    Next,
    /// Skip to the previous track.
    Previous,
}

/// Playback modes for `AT+PLAYMODE=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PlayMode {
    RepeatOne = 1,
    RepeatAll = 2,
    PlayOnce = 3,
    Random = 4,
    RepeatFolder = 5,
}

/// Queries available through `AT+QUERY=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Query {
    CurrentTrack = 1,
    TotalFiles = 2,
    PlayedTime = 3,
    TotalTime = 4,
    /// Reply payload is UTF-16 text.
    FileName = 5,
}

/// An outbound instruction to the player module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Connectivity test, `AT`.
    Test,
    /// `AT+VOL=<0..30>`. Values above [`MAX_VOLUME`] are clamped.
    SetVolume(u8),
    /// `AT+VOL=?`.
    QueryVolume,
    /// `AT+PLAYFILE=<path>`, e.g. `/01/ESPRESSO.MP3`.
    PlayFile(&'a str),
    /// `AT+PLAYNUM=<n>`.
    PlayFileNumber(u16),
    /// `AT+PLAY=PP|NEXT|LAST`.
    Playback(PlayAction),
    /// `AT+TIME=-<seconds>`, rewind within the current track.
    Rewind(u16),
    /// `AT+TIME=+<seconds>`, fast-forward within the current track.
    FastForward(u16),
    /// `AT+TIME=<second>`, jump to an absolute position.
    Seek(u16),
    /// `AT+PROMPT=ON|OFF`.
    PromptTone(Switch),
    /// `AT+AMP=ON|OFF`.
    Amplifier(Switch),
    /// `AT+LED=ON|OFF`.
    Led(Switch),
    /// `AT+PLAYMODE=<1..5>`.
    PlayMode(PlayMode),
    /// `AT+PLAYMODE=?`.
    QueryPlayMode,
    /// `AT+QUERY=<1..5>`.
    Query(Query),
    /// `AT+STOP`.
    Stop,
    /// `AT+DEL`, removes the file currently playing.
    DeleteCurrent,
    /// `AT+REC=RP`, starts or pauses recording.
    Record,
    /// `AT+REC=SAVE`, writes the recording to storage.
    SaveRecording,
    /// `AT+BAUDRATE=<rate>`. The module switches rate after replying.
    BaudRate(u32),
    /// Any other line, sent as-is.
    Raw(&'a str),
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Command::Test => f.write_str("AT"),
            Command::SetVolume(level) => write!(f, "AT+VOL={}", level.min(MAX_VOLUME)),
            Command::QueryVolume => f.write_str("AT+VOL=?"),
            Command::PlayFile(path) => write!(f, "AT+PLAYFILE={}", path),
            Command::PlayFileNumber(number) => write!(f, "AT+PLAYNUM={}", number),
            Command::Playback(action) => {
                let arg = match action {
                    PlayAction::PlayPause => "PP",
                    PlayAction::Next => "NEXT",
                    PlayAction::Previous => "LAST",
                };
                write!(f, "AT+PLAY={}", arg)
            }
            Command::Rewind(seconds) => write!(f, "AT+TIME=-{}", seconds),
            Command::FastForward(seconds) => write!(f, "AT+TIME=+{}", seconds),
            Command::Seek(second) => write!(f, "AT+TIME={}", second),
            Command::PromptTone(state) => write!(f, "AT+PROMPT={}", state.as_str()),
            Command::Amplifier(state) => write!(f, "AT+AMP={}", state.as_str()),
            Command::Led(state) => write!(f, "AT+LED={}", state.as_str()),
            Command::PlayMode(mode) => write!(f, "AT+PLAYMODE={}", mode as u8),
            Command::QueryPlayMode => f.write_str("AT+PLAYMODE=?"),
            Command::Query(query) => write!(f, "AT+QUERY={}", query as u8),
            Command::Stop => f.write_str("AT+STOP"),
            Command::DeleteCurrent => f.write_str("AT+DEL"),
            Command::Record => f.write_str("AT+REC=RP"),
            Command::SaveRecording => f.write_str("AT+REC=SAVE"),
            Command::BaudRate(rate) => write!(f, "AT+BAUDRATE={}", rate),
            Command::Raw(line) => f.write_str(line),
        }
    }
}

/// Error returned when a command does not fit in [`COMMAND_CAPACITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandTooLong;

impl<'a> Command<'a> {
    /// Encodes the command as one wire line.
    ///
    /// Any CR/LF the caller already put at the end of the text is removed
    /// before the terminator is appended, so every frame ends in exactly one
    /// CRLF.
    pub fn frame(&self) -> Result<String<COMMAND_CAPACITY>, CommandTooLong> {
        let mut line: String<COMMAND_CAPACITY> = String::new();
        write!(line, "{}", self).map_err(|_| CommandTooLong)?;

        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        line.push_str("\r\n").map_err(|_| CommandTooLong)?;
        Ok(line)
    }
}
