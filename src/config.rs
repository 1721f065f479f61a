//! Tunables and asset names.
//!
//! The defaults describe the deployed machine: two buttons on a coffee
//! station, tracks in folder `01`, game effects in folder `02`.

use crate::types::SoundChoice;

/// Direct-play and fade settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Track played by the left button.
    pub left_track: &'static str,
    /// Track played by the right button.
    pub right_track: &'static str,
    /// Volume applied before every direct play, 0-30.
    pub default_volume: u8,
    /// Volume decrement per fade step.
    pub fade_step: u8,
    /// Pause between fade steps.
    pub fade_step_delay_ms: u32,
    /// Pause between ticks in [`Controller::run`](crate::Controller::run).
    pub tick_interval_ms: u32,
    /// Time a raw button reading must hold before it is believed.
    pub button_settle_ms: u64,
    /// Ask the module for the playing file name after each direct play.
    pub query_after_play: bool,
    /// Set the volume back to `default_volume` once a fade-out has stopped
    /// playback.
    pub restore_volume_after_fade: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            left_track: "/01/FROTHER.MP3",
            right_track: "/01/ESPRESSO.MP3",
            default_volume: 10,
            fade_step: 3,
            fade_step_delay_ms: 100,
            tick_interval_ms: 100,
            button_settle_ms: 20,
            query_after_play: true,
            restore_volume_after_fade: false,
        }
    }
}

/// Secret game settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GameConfig {
    /// Folder prepended to every game sound, with both slashes.
    pub folder: &'static str,
    /// Played on entering game mode.
    pub startup_sound: SoundChoice,
    /// Played on a miss, an overflow, or an expired capture.
    pub failure_sound: SoundChoice,
    /// Acknowledges a left press.
    pub left_ack: &'static str,
    /// Acknowledges a right press.
    pub right_ack: &'static str,
    /// Volume set on entering game mode. `None` leaves it alone.
    pub volume: Option<u8>,
    /// Inputs arriving sooner than this after an accepted one are ignored.
    pub settle_ms: u64,
    /// Longest a capture may run. `None` for no limit.
    pub capture_window_ms: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            folder: "/02/",
            startup_sound: SoundChoice::Fixed("ST-MARIO.MP3"),
            failure_sound: SoundChoice::Fixed("NO-MARIO.MP3"),
            left_ack: "BEEP1.MP3",
            right_ack: "BEEP2.MP3",
            volume: Some(5),
            settle_ms: 300,
            capture_window_ms: None,
        }
    }
}
