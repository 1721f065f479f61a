//! The control loop.
//!
//! Provides [`Controller`], which polls both buttons once per tick, plays
//! each button's track on a fresh press, fades playback out on release, and
//! hands every press to the [`Recognizer`] while the secret game is running.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin};
use rand_core::RngCore;

use crate::button::Button;
use crate::command::{MAX_VOLUME, Switch};
use crate::config::ControllerConfig;
use crate::game::{GameEvent, GameInput, GameState, Recognizer};
use crate::player::{AudioDevice, PlayerError};
use crate::time::{TimeInstant, TimeSource};
use crate::types::{Side, Symbol};

/// Errors that stop the control loop.
///
/// Device-side trouble never shows up here; it is logged and the loop
/// carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// The serial transport failed.
    Player(PlayerError),
    /// A button pin could not be read.
    Input(digital::ErrorKind),
}

impl From<PlayerError> for ControlError {
    fn from(err: PlayerError) -> Self {
        ControlError::Player(err)
    }
}

impl core::fmt::Display for ControlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ControlError::Player(err) => write!(f, "player: {}", err),
            ControlError::Input(kind) => write!(f, "button input error: {:?}", kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ControlError {}

fn pin_error<E: digital::Error>(err: E) -> ControlError {
    ControlError::Input(err.kind())
}

/// What the controller believes the module is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackSession {
    /// Track most recently started by a button.
    pub current: Option<&'static str>,
    /// A direct-play track is playing.
    pub playing: bool,
    /// The last playback ended with a completed fade-out.
    pub faded_out: bool,
}

/// Result of a fade-out attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FadeOutcome {
    /// Volume reached zero and the pause toggle was sent.
    Completed,
    /// A button was pressed mid-fade; volume restored.
    Interrupted,
}

/// Owns the buttons, the player, and the game, and runs one tick at a time.
///
/// # Type Parameters
/// * `'a` - Lifetime of the time source and pattern table references
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `P` - Player (or `Option` of one, when the module may be absent)
/// * `L` / `R` - Left and right button pins
/// * `D` - Delay provider for fades and the tick interval
/// * `G` - Random number generator used by the game
/// * `N` - Pattern table capacity
pub struct Controller<'a, I, T, P, L, R, D, G, const N: usize>
where
    I: TimeInstant,
    T: TimeSource<I>,
    P: AudioDevice,
    L: InputPin,
    R: InputPin,
    D: DelayNs,
    G: RngCore,
{
    player: P,
    left: Button<L, I>,
    right: Button<R, I>,
    delay: D,
    time_source: &'a T,
    game: Recognizer<'a, I, G, N>,
    config: ControllerConfig,
    session: PlaybackSession,
    fade_armed: bool,
}

impl<'a, I, T, P, L, R, D, G, const N: usize> Controller<'a, I, T, P, L, R, D, G, N>
where
    I: TimeInstant,
    T: TimeSource<I>,
    P: AudioDevice,
    L: InputPin,
    R: InputPin,
    D: DelayNs,
    G: RngCore,
{
    /// Creates a controller with no playback session and the game idle.
    pub fn new(
        player: P,
        left: L,
        right: R,
        delay: D,
        time_source: &'a T,
        game: Recognizer<'a, I, G, N>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            player,
            left: Button::new(left, config.button_settle_ms),
            right: Button::new(right, config.button_settle_ms),
            delay,
            time_source,
            game,
            config,
            session: PlaybackSession::default(),
            fade_armed: false,
        }
    }

    /// Puts the module into a known state: prompt tone off, default volume.
    pub fn begin(&mut self) -> Result<(), ControlError> {
        let response = self.player.set_prompt_tone(Switch::Off)?;
        info!("prompt tone disabled: {}", response.outcome());
        self.set_volume(self.config.default_volume)?;
        Ok(())
    }

    /// Runs one poll-and-dispatch cycle.
    ///
    /// Blocks for at most one response window per command issued, plus the
    /// fade steps when a fade-out runs.
    pub fn tick(&mut self) -> Result<(), ControlError> {
        let now = self.time_source.now();
        self.left.poll(now).map_err(pin_error)?;
        self.right.poll(now).map_err(pin_error)?;

        let chord = self.left.is_pressed()
            && self.right.is_pressed()
            && (self.left.is_fresh_press() || self.right.is_fresh_press());

        if self.game.is_capturing() {
            return self.dispatch_game(chord, now);
        }

        if chord {
            self.left.mark_handled();
            self.right.mark_handled();
            // Game sounds replace whatever was playing; nothing left to fade.
            self.session = PlaybackSession::default();
            self.fade_armed = false;
            self.game.enter(&mut self.player, now)?;
            return Ok(());
        }

        if self.left.is_fresh_press() {
            self.left.mark_handled();
            self.fade_armed = true;
            self.play_for(Side::Left)?;
        }
        if self.right.is_fresh_press() {
            self.right.mark_handled();
            self.fade_armed = true;
            self.play_for(Side::Right)?;
        }

        // One fade per press: a fade that was interrupted or whose pause went
        // unconfirmed waits for the next debounced press before running again.
        let released = !self.left.is_pressed() && !self.right.is_pressed();
        if released && self.session.playing && self.fade_armed {
            self.fade_out()?;
        }

        Ok(())
    }

    /// Ticks forever, pausing `tick_interval_ms` between ticks.
    ///
    /// Only returns on a transport or input fault.
    pub fn run(&mut self) -> Result<Infallible, ControlError> {
        loop {
            self.tick()?;
            self.delay.delay_ms(self.config.tick_interval_ms);
        }
    }

    /// Stops playback and leaves game mode.
    pub fn shutdown(&mut self) -> Result<(), ControlError> {
        self.game.cancel();
        self.session = PlaybackSession::default();
        let response = self.player.stop()?;
        info!("playback stopped: {}", response.outcome());
        Ok(())
    }

    /// Returns the playback session.
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Returns true if releasing both buttons will start a fade-out.
    pub fn fade_pending(&self) -> bool {
        self.fade_armed && self.session.playing
    }

    /// Returns the game mode.
    pub fn game_state(&self) -> GameState {
        self.game.state()
    }

    /// Returns the recognizer.
    pub fn game(&self) -> &Recognizer<'a, I, G, N> {
        &self.game
    }

    /// Returns the player.
    pub fn player(&self) -> &P {
        &self.player
    }

    /// Returns the player mutably.
    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn dispatch_game(&mut self, chord: bool, now: I) -> Result<(), ControlError> {
        let input = if chord {
            GameInput::Both
        } else if self.left.is_fresh_press() {
            GameInput::Press(Symbol::Left)
        } else if self.right.is_fresh_press() {
            GameInput::Press(Symbol::Right)
        } else {
            return Ok(());
        };

        let event = self.game.handle(input, &mut self.player, now)?;
        // An ignored press stays fresh so it counts once the settle window ends.
        if event == GameEvent::Ignored {
            return Ok(());
        }

        match input {
            GameInput::Both => {
                self.left.mark_handled();
                self.right.mark_handled();
            }
            GameInput::Press(Symbol::Left) => self.left.mark_handled(),
            GameInput::Press(Symbol::Right) => self.right.mark_handled(),
        }
        debug!("game event {}", event);
        Ok(())
    }

    fn play_for(&mut self, side: Side) -> Result<(), ControlError> {
        let track = match side {
            Side::Left => self.config.left_track,
            Side::Right => self.config.right_track,
        };

        let session = self.session;
        if session.playing && !session.faded_out && session.current == Some(track) {
            debug!("{} already playing", track);
            return Ok(());
        }

        self.set_volume(self.config.default_volume)?;

        let response = self.player.play_file(track)?;
        if !response.is_success() {
            warn!("play {} not confirmed: {}", track, response.outcome());
            return Ok(());
        }
        info!("playing {} for {}", track, side);

        if self.config.query_after_play {
            if let Some(_name) = self.player.query_file_name()? {
                info!("module reports {}", _name.as_str());
            }
        }

        self.session = PlaybackSession {
            current: Some(track),
            playing: true,
            faded_out: false,
        };
        Ok(())
    }

    /// Steps the volume from the default down to zero, then pauses.
    ///
    /// Re-reads both pins before every step; a press aborts the fade and
    /// restores the default volume with the session left playing. Whatever
    /// the outcome, `tick` will not fade again until a new press is handled.
    pub fn fade_out(&mut self) -> Result<FadeOutcome, ControlError> {
        self.fade_armed = false;
        let full = self.config.default_volume.min(MAX_VOLUME);
        let step = self.config.fade_step.max(1);
        let mut level = full;

        loop {
            let pressed_again = self.left.read_raw().map_err(pin_error)?
                || self.right.read_raw().map_err(pin_error)?;
            if pressed_again {
                info!("button pressed during fade, restoring volume");
                self.set_volume(full)?;
                return Ok(FadeOutcome::Interrupted);
            }

            self.set_volume(level)?;
            if level == 0 {
                break;
            }
            self.delay.delay_ms(self.config.fade_step_delay_ms);
            level = level.saturating_sub(step);
        }

        let response = self.player.toggle_pause()?;
        if !response.is_success() {
            warn!("pause after fade not confirmed: {}", response.outcome());
            return Ok(FadeOutcome::Completed);
        }

        info!("faded out");
        self.session = PlaybackSession {
            current: None,
            playing: false,
            faded_out: true,
        };

        if self.config.restore_volume_after_fade {
            self.set_volume(full)?;
        }
        Ok(FadeOutcome::Completed)
    }

    fn set_volume(&mut self, level: u8) -> Result<(), ControlError> {
        let response = self.player.set_volume(level)?;
        if !response.is_success() {
            warn!("volume {} not confirmed: {}", level, response.outcome());
        }
        Ok(())
    }
}
