//! Debounced, edge-marked push button.

use embedded_hal::digital::InputPin;

use crate::time::{TimeInstant, has_elapsed};

/// Debounced logical state of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Released,
    Pressed,
}

/// A pull-up, active-low push button.
///
/// A raw reading has to hold for `settle_ms` before the logical state
/// follows it. Each press also carries a "handled" marker: the owner calls
/// [`mark_handled`](Button::mark_handled) once it has acted on a press, and
/// the marker clears when the button is released, so one press-release cycle
/// produces exactly one action.
pub struct Button<P: InputPin, I: TimeInstant> {
    pin: P,
    settle_ms: u64,
    state: ButtonState,
    raw_pressed: bool,
    raw_since: Option<I>,
    handled: bool,
}

impl<P: InputPin, I: TimeInstant> Button<P, I> {
    /// Creates a released button.
    pub fn new(pin: P, settle_ms: u64) -> Self {
        Self {
            pin,
            settle_ms,
            state: ButtonState::Released,
            raw_pressed: false,
            raw_since: None,
            handled: false,
        }
    }

    /// Samples the pin without debouncing. Low means pressed.
    pub fn read_raw(&mut self) -> Result<bool, P::Error> {
        self.pin.is_low()
    }

    /// Samples the pin and updates the debounced state.
    pub fn poll(&mut self, now: I) -> Result<ButtonState, P::Error> {
        let raw = self.read_raw()?;
        if raw != self.raw_pressed || self.raw_since.is_none() {
            self.raw_pressed = raw;
            self.raw_since = Some(now);
        }

        let settled = self
            .raw_since
            .is_some_and(|since| has_elapsed(now, since, self.settle_ms));

        if settled {
            self.state = if raw {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            };
            if !raw {
                self.handled = false;
            }
        }

        Ok(self.state)
    }

    /// Returns the debounced state from the last poll.
    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Returns true if the debounced state is `Pressed`.
    pub fn is_pressed(&self) -> bool {
        self.state == ButtonState::Pressed
    }

    /// Returns true if pressed and not yet acted on.
    pub fn is_fresh_press(&self) -> bool {
        self.is_pressed() && !self.handled
    }

    /// Marks the current press as acted on.
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }
}
