//! Shared test infrastructure for espresso-chime integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use espresso_chime::command::Command;
use espresso_chime::response::{Frame, Response};
use espresso_chime::{
    AudioDevice, Player, PlayerError, TimeDuration, TimeInstant, TimeSource,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Manually advanced clock
pub struct MockTimeSource {
    current_time: Cell<u64>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(0),
        }
    }

    pub fn advance(&self, millis: u64) {
        self.current_time.set(self.current_time.get() + millis);
    }

    pub fn millis(&self) -> u64 {
        self.current_time.get()
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        TestInstant(self.current_time.get())
    }
}

// ============================================================================
// Mock Serial Port
// ============================================================================

/// How the mock module answers a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send these bytes back.
    Bytes(Vec<u8>),
    /// Say nothing.
    Silent,
}

/// Serial port that behaves like the MP3 module.
///
/// Every CRLF-terminated line written is recorded. The reply is chosen by
/// the first rule whose prefix matches the line, falling back to `OK\r\n`.
/// Each `read_ready` that finds nothing to read advances the clock by one
/// millisecond so the driver's response window can run out.
pub struct MockPort<'a> {
    clock: &'a MockTimeSource,
    rules: Vec<(String, Reply)>,
    line: Vec<u8>,
    sent: Vec<String>,
    pending: Vec<u8>,
}

impl<'a> MockPort<'a> {
    pub fn new(clock: &'a MockTimeSource) -> Self {
        Self {
            clock,
            rules: Vec::new(),
            line: Vec::new(),
            sent: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Answers lines starting with `prefix` with `reply`.
    pub fn reply(mut self, prefix: &str, reply: &[u8]) -> Self {
        self.rules
            .push((prefix.to_string(), Reply::Bytes(reply.to_vec())));
        self
    }

    /// Never answers lines starting with `prefix`.
    pub fn silent(mut self, prefix: &str) -> Self {
        self.rules.push((prefix.to_string(), Reply::Silent));
        self
    }

    /// Queues bytes as if the module had sent them unprompted.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Lines written so far, without their terminators.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    fn answer(&mut self, line: &str) {
        let reply = self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Bytes(b"OK\r\n".to_vec()));

        if let Reply::Bytes(bytes) = reply {
            self.pending.extend_from_slice(&bytes);
        }
    }
}

impl embedded_io::ErrorType for MockPort<'_> {
    type Error = Infallible;
}

impl embedded_io::Read for MockPort<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl embedded_io::ReadReady for MockPort<'_> {
    fn read_ready(&mut self) -> Result<bool, Infallible> {
        if self.pending.is_empty() {
            self.clock.advance(1);
            Ok(false)
        } else {
            Ok(true)
        }
    }
}

impl embedded_io::Write for MockPort<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.line.extend_from_slice(buf);
        while let Some(end) = self.line.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = self.line.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&line[..end]).into_owned();
            self.answer(&text);
            self.sent.push(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Player wired to the mock port and clock.
pub type TestPlayer<'a> = Player<'a, TestInstant, MockPort<'a>, MockTimeSource>;

/// Encodes text as UTF-16LE, the way the module reports file names.
pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

// ============================================================================
// Mock Audio Device
// ============================================================================

/// Device that records commands without any serial framing.
pub struct RecordingDevice {
    commands: Vec<String>,
    failing: Vec<(String, Response)>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            failing: Vec::new(),
        }
    }

    /// Answers commands starting with `prefix` with `response` instead of `OK`.
    pub fn respond(mut self, prefix: &str, response: Response) -> Self {
        self.failing.push((prefix.to_string(), response));
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Paths passed to `AT+PLAYFILE`, in order.
    pub fn played(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| c.strip_prefix("AT+PLAYFILE="))
            .collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl AudioDevice for RecordingDevice {
    fn send(&mut self, command: Command<'_>) -> Result<Response, PlayerError> {
        let text = command.to_string();
        let response = self
            .failing
            .iter()
            .find(|(prefix, _)| text.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| ok());
        self.commands.push(text);
        Ok(response)
    }
}

/// A complete `OK` reply.
pub fn ok() -> Response {
    Response::Complete(Frame::from_slice(b"OK\r\n").unwrap())
}

// ============================================================================
// Mock Button Pin
// ============================================================================

/// Active-low input whose level follows a shared flag.
pub struct MockPin<'a> {
    pressed: &'a Cell<bool>,
}

impl<'a> MockPin<'a> {
    pub fn new(pressed: &'a Cell<bool>) -> Self {
        Self { pressed }
    }
}

impl embedded_hal::digital::ErrorType for MockPin<'_> {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for MockPin<'_> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.pressed.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed.get())
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Delay that advances the mock clock instead of sleeping.
///
/// An optional trigger sets a flag once, when the total delayed time reaches
/// a threshold, which lets a test "press a button" in the middle of a fade.
pub struct MockDelay<'a> {
    clock: &'a MockTimeSource,
    delays: RefCell<Vec<u32>>,
    total_ms: u64,
    trigger: Option<(u64, &'a Cell<bool>)>,
}

impl<'a> MockDelay<'a> {
    pub fn new(clock: &'a MockTimeSource) -> Self {
        Self {
            clock,
            delays: RefCell::new(Vec::new()),
            total_ms: 0,
            trigger: None,
        }
    }

    /// Sets `flag` once `after_ms` of delay have elapsed.
    pub fn press_after(mut self, after_ms: u64, flag: &'a Cell<bool>) -> Self {
        self.trigger = Some((after_ms, flag));
        self
    }

    /// Millisecond delays requested so far.
    pub fn delays(&self) -> Vec<u32> {
        self.delays.borrow().clone()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(u64::from(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.borrow_mut().push(ms);
        self.clock.advance(u64::from(ms));
        self.total_ms += u64::from(ms);
        if let Some((after, flag)) = self.trigger {
            if self.total_ms >= after {
                flag.set(true);
                self.trigger = None;
            }
        }
    }
}

// ============================================================================
// Mock RNG
// ============================================================================

/// Generator that cycles through a fixed list of values.
pub struct MockRng {
    values: Vec<u32>,
    index: usize,
}

impl MockRng {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            index: 0,
        }
    }
}

impl rand_core::RngCore for MockRng {
    fn next_u32(&mut self) -> u32 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.next_u32() as u8;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
