//! Secret press-sequence game.
//!
//! Provides [`Recognizer`], the two-state machine that captures left/right
//! presses while in game mode and resolves them against a [`PatternTable`]
//! when both buttons are pressed together.

use core::fmt::Write as _;

use heapless::{String, Vec};
use rand_core::RngCore;

use crate::config::GameConfig;
use crate::patterns::{MAX_PATTERN_LEN, PatternTable, sequence_key};
use crate::player::{AudioDevice, PlayerError};
use crate::time::{TimeInstant, has_elapsed};
use crate::types::Symbol;

/// Capacity of a full sound path such as `/02/TM-SOOTY.MP3`.
pub const PATH_CAPACITY: usize = 48;

/// One symbol more than the longest pattern, so overflow is observable.
const CAPTURE_CAPACITY: usize = MAX_PATTERN_LEN + 1;

/// A folder-qualified sound path.
pub type SoundPath = String<PATH_CAPACITY>;

/// Mode of the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameState {
    /// Not in game mode. Buttons drive direct playback.
    Idle,
    /// Capturing a sequence. Every press belongs to the game.
    Capturing,
}

/// Input routed to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameInput {
    /// Both buttons pressed together.
    Both,
    /// A single button pressed.
    Press(Symbol),
}

/// Why a capture ended without a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailReason {
    /// The committed sequence is not in the table.
    NoMatch,
    /// More symbols were entered than the longest pattern has.
    SequenceOverflow,
    /// The capture window ran out.
    CaptureExpired,
}

/// What an input did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameEvent {
    /// Input not eligible (idle single press, or still settling).
    Ignored,
    /// Game mode entered.
    Entered,
    /// Symbol captured.
    Appended(Symbol),
    /// Sequence committed and found; the file was requested.
    Matched(&'static str),
    /// Capture ended with the failure sound.
    Failed(FailReason),
}

/// Joins a folder and a file name.
pub fn sound_path(folder: &str, file: &str) -> Option<SoundPath> {
    let mut path = SoundPath::new();
    write!(path, "{}{}", folder, file).ok()?;
    Some(path)
}

/// Captures press sequences and resolves them against a pattern table.
///
/// The recognizer never owns the player; every operation that plays a sound
/// borrows it for the duration of the call.
///
/// # Type Parameters
/// * `'a` - Lifetime of the pattern table reference
/// * `I` - Time instant type
/// * `G` - Random number generator for randomised sound choices
/// * `N` - Pattern table capacity
pub struct Recognizer<'a, I: TimeInstant, G: RngCore, const N: usize> {
    table: &'a PatternTable<N>,
    config: GameConfig,
    rng: G,
    state: GameState,
    sequence: Vec<Symbol, CAPTURE_CAPACITY>,
    capture_start: Option<I>,
    last_accepted: Option<I>,
}

impl<'a, I: TimeInstant, G: RngCore, const N: usize> Recognizer<'a, I, G, N> {
    /// Creates an idle recognizer.
    pub fn new(table: &'a PatternTable<N>, config: GameConfig, rng: G) -> Self {
        Self {
            table,
            config,
            rng,
            state: GameState::Idle,
            sequence: Vec::new(),
            capture_start: None,
            last_accepted: None,
        }
    }

    /// Returns the current mode.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Returns true while capturing.
    pub fn is_capturing(&self) -> bool {
        self.state == GameState::Capturing
    }

    /// Symbols captured so far.
    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    /// Returns the game settings.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Enters game mode from `Idle`.
    ///
    /// Clears the sequence, applies the game volume, and plays the startup
    /// sound. Returns [`GameEvent::Ignored`] if already capturing.
    pub fn enter<P: AudioDevice>(
        &mut self,
        player: &mut P,
        now: I,
    ) -> Result<GameEvent, PlayerError> {
        if self.is_capturing() {
            return Ok(GameEvent::Ignored);
        }

        info!("entering game mode");
        self.sequence.clear();
        self.state = GameState::Capturing;
        self.capture_start = Some(now);
        self.last_accepted = Some(now);

        if let Some(level) = self.config.volume {
            let response = player.set_volume(level)?;
            if !response.is_success() {
                warn!("game volume not confirmed: {}", response.outcome());
            }
        }

        let startup = self.config.startup_sound.pick(&mut self.rng);
        if let Some(file) = startup {
            self.play(player, file)?;
        }

        Ok(GameEvent::Entered)
    }

    /// Handles one input.
    ///
    /// From `Idle` only [`GameInput::Both`] does anything (it enters game
    /// mode). While capturing, inputs inside the settle window are ignored,
    /// `Both` commits the sequence, and a press appends a symbol.
    pub fn handle<P: AudioDevice>(
        &mut self,
        input: GameInput,
        player: &mut P,
        now: I,
    ) -> Result<GameEvent, PlayerError> {
        if !self.is_capturing() {
            return match input {
                GameInput::Both => self.enter(player, now),
                GameInput::Press(_) => Ok(GameEvent::Ignored),
            };
        }

        if let Some(last) = self.last_accepted {
            if !has_elapsed(now, last, self.config.settle_ms) {
                trace!("input inside settle window");
                return Ok(GameEvent::Ignored);
            }
        }
        self.last_accepted = Some(now);

        if let (Some(window), Some(start)) = (self.config.capture_window_ms, self.capture_start) {
            if has_elapsed(now, start, window) {
                return self.fail(player, FailReason::CaptureExpired);
            }
        }

        match input {
            GameInput::Both => self.commit(player),
            GameInput::Press(symbol) => self.append(player, symbol),
        }
    }

    /// Leaves game mode without playing anything.
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn append<P: AudioDevice>(
        &mut self,
        player: &mut P,
        symbol: Symbol,
    ) -> Result<GameEvent, PlayerError> {
        // Capacity is one past the longest possible pattern, so a failed push
        // implies overflow as well.
        let pushed = self.sequence.push(symbol).is_ok();
        if !pushed || self.sequence.len() > self.table.max_len() {
            return self.fail(player, FailReason::SequenceOverflow);
        }

        info!("captured {}", symbol);
        let ack = match symbol {
            Symbol::Left => self.config.left_ack,
            Symbol::Right => self.config.right_ack,
        };
        self.play(player, ack)?;
        Ok(GameEvent::Appended(symbol))
    }

    fn commit<P: AudioDevice>(&mut self, player: &mut P) -> Result<GameEvent, PlayerError> {
        match self.table.lookup_symbols(&self.sequence) {
            Some(file) => {
                info!("sequence matched, playing {}", file);
                self.reset();
                self.play(player, file)?;
                Ok(GameEvent::Matched(file))
            }
            None => self.fail(player, FailReason::NoMatch),
        }
    }

    fn fail<P: AudioDevice>(
        &mut self,
        player: &mut P,
        reason: FailReason,
    ) -> Result<GameEvent, PlayerError> {
        let key = sequence_key(&self.sequence).unwrap_or_default();
        match reason {
            FailReason::NoMatch => info!("no pattern for sequence {}", key.as_str()),
            FailReason::SequenceOverflow => {
                info!("sequence {} longer than any pattern", key.as_str())
            }
            FailReason::CaptureExpired => info!("capture window expired at {}", key.as_str()),
        }

        self.reset();
        let failure = self.config.failure_sound.pick(&mut self.rng);
        if let Some(file) = failure {
            self.play(player, file)?;
        }
        Ok(GameEvent::Failed(reason))
    }

    fn reset(&mut self) {
        self.sequence.clear();
        self.state = GameState::Idle;
        self.capture_start = None;
    }

    fn play<P: AudioDevice>(&self, player: &mut P, file: &str) -> Result<(), PlayerError> {
        let Some(path) = sound_path(self.config.folder, file) else {
            warn!("sound path too long: {}{}", self.config.folder, file);
            return Ok(());
        };

        let response = player.play_file(&path)?;
        if !response.is_success() {
            warn!("play {} not confirmed: {}", path.as_str(), response.outcome());
        }
        Ok(())
    }
}
