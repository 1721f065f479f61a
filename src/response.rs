//! Reply framing and classification.

use crate::command::TERMINATOR;
use heapless::{String, Vec};

/// Capacity of the reply accumulator.
pub const RESPONSE_CAPACITY: usize = 128;

/// Capacity of a decoded file name.
pub const FILE_NAME_CAPACITY: usize = 64;

/// Raw reply bytes.
pub type Frame = Vec<u8, RESPONSE_CAPACITY>;

/// A decoded file name.
pub type FileName = String<FILE_NAME_CAPACITY>;

/// Token the module includes in every successful reply.
const SUCCESS_TOKEN: &[u8] = b"OK";

/// What came back after a command was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Terminator observed; frame includes it.
    Complete(Frame),
    /// Bytes arrived but no terminator within the response window.
    Timeout(Frame),
    /// The accumulator filled up before a terminator arrived.
    Overflow(Frame),
    /// Nothing arrived at all.
    Empty,
}

/// Classification of a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Complete reply carrying `OK`.
    Success,
    /// Complete reply without `OK`.
    DeviceError,
    /// Partial reply, no terminator.
    Timeout,
    /// No reply.
    NoResponse,
    /// Reply could not be interpreted.
    Malformed,
}

impl Response {
    /// Classifies the reply.
    pub fn outcome(&self) -> Outcome {
        match self {
            Response::Complete(frame) if contains(frame, SUCCESS_TOKEN) => Outcome::Success,
            Response::Complete(_) => Outcome::DeviceError,
            Response::Timeout(_) => Outcome::Timeout,
            Response::Overflow(_) => Outcome::Malformed,
            Response::Empty => Outcome::NoResponse,
        }
    }

    /// True for a complete reply carrying `OK`.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome() == Outcome::Success
    }

    /// Raw bytes received, terminator included when present.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Response::Complete(frame) | Response::Timeout(frame) | Response::Overflow(frame) => {
                frame.as_slice()
            }
            Response::Empty => &[],
        }
    }

    /// Reply bytes with the trailing terminator removed.
    ///
    /// Only complete replies have a payload.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Response::Complete(frame) => Some(strip_suffix(frame, TERMINATOR)),
            _ => None,
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn strip_suffix<'a>(bytes: &'a [u8], suffix: &[u8]) -> &'a [u8] {
    bytes.strip_suffix(suffix).unwrap_or(bytes)
}

/// Errors from decoding a file-name reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Odd number of bytes, cannot be UTF-16.
    OddLength,
    /// Unpaired surrogate.
    InvalidUtf16,
    /// Decoded text does not fit in [`FILE_NAME_CAPACITY`].
    TooLong,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::OddLength => write!(f, "payload has odd length"),
            DecodeError::InvalidUtf16 => write!(f, "payload is not valid UTF-16"),
            DecodeError::TooLong => write!(f, "file name exceeds capacity"),
        }
    }
}

/// Decodes the payload of an `AT+QUERY=5` reply.
///
/// The module answers with the name in UTF-16, optionally followed by an
/// ASCII `OK` line. Trailing CR/LF and the `OK` token are stripped, a BOM
/// selects byte order (little-endian otherwise), and surrounding whitespace
/// and NULs are trimmed from the decoded text.
pub fn decode_file_name(payload: &[u8]) -> Result<FileName, DecodeError> {
    let mut bytes = trim_line_end(payload);
    if let Some(rest) = bytes.strip_suffix(SUCCESS_TOKEN) {
        bytes = trim_line_end(rest);
    }

    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength);
    }

    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        _ => (false, bytes),
    };

    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    let mut decoded: FileName = String::new();
    for unit in char::decode_utf16(units) {
        let ch = unit.map_err(|_| DecodeError::InvalidUtf16)?;
        decoded.push(ch).map_err(|_| DecodeError::TooLong)?;
    }

    let trimmed = decoded.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    let mut name: FileName = String::new();
    name.push_str(trimmed).map_err(|_| DecodeError::TooLong)?;
    Ok(name)
}

fn trim_line_end(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = bytes {
        bytes = rest;
    }
    bytes
}
