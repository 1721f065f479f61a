#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Player`**: Owns the serial port and performs one command/response exchange at a time
//! - **`AudioDevice`**: Trait through which everything else issues player commands
//! - **`Command`** / **`Response`**: The AT line sent and the classified reply received
//! - **`Button`**: Debounced active-low input with a per-press "handled" marker
//! - **`PatternTable`**: Sorted, exact-match map from `L`/`R` sequences to sound files
//! - **`Recognizer`**: The Idle/Capturing state machine behind the secret game
//! - **`Controller`**: Polls both buttons each tick, plays tracks, fades out on release
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Hardware is reached only through `embedded-hal` pins and delays and an
//! `embedded-io` serial port, so the whole controller runs unchanged on a
//! host with mocks.

#[macro_use]
mod fmt;

pub mod time;
pub mod types;
pub mod command;
pub mod response;
pub mod transport;
pub mod player;
pub mod patterns;
pub mod config;
pub mod game;
pub mod button;
pub mod controller;

pub use button::{Button, ButtonState};
pub use command::{Command, PlayAction, PlayMode, Query, Switch, MAX_VOLUME};
pub use config::{ControllerConfig, GameConfig};
pub use controller::{ControlError, Controller, FadeOutcome, PlaybackSession};
pub use game::{FailReason, GameEvent, GameInput, GameState, Recognizer};
pub use patterns::{DEFAULT_PATTERNS, DefaultPatternTable, Pattern, PatternError, PatternTable};
pub use player::{AudioDevice, Player, PlayerError, RESPONSE_TIMEOUT_MS};
pub use response::{DecodeError, FileName, Outcome, Response, decode_file_name};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use transport::{BAUD_RATE, SerialOpener, UartConfig};
pub use types::{Side, SoundChoice, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_assets() {
        let config = ControllerConfig::default();
        assert_eq!(config.left_track, "/01/FROTHER.MP3");
        assert_eq!(config.right_track, "/01/ESPRESSO.MP3");

        let table = DefaultPatternTable::from_pairs(DEFAULT_PATTERNS).unwrap();
        assert_eq!(table.max_len(), 4);
        assert_eq!(table.lookup("LR"), Some("TM-FIREM.MP3"));
    }
}
