//! Single status LED showing the gate state.
//!
//! | State               | LED   |
//! |---------------------|-------|
//! | Closed, Stopped     | off   |
//! | Open                | on    |
//! | Opening, Closing    | blink |
//!
//! [`StatusLed::tick`] is driven by the scheduler at the blink half-period;
//! the pin itself is written by the caller via [`StatusLed::apply`].

use embedded_hal::digital::OutputPin;

use crate::gate::GateState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Off,
    On,
    Blink,
}

impl LedPattern {
    pub const fn for_state(state: GateState) -> Self {
        match state {
            GateState::Open => Self::On,
            GateState::Opening | GateState::Closing => Self::Blink,
            GateState::Closed | GateState::Stopped => Self::Off,
        }
    }
}

#[derive(Debug, Default)]
pub struct StatusLed {
    lit: bool,
}

impl StatusLed {
    pub fn new() -> Self {
        Self { lit: false }
    }

    /// Advance one blink phase for `state`. Returns the new level.
    pub fn tick(&mut self, state: GateState) -> bool {
        self.lit = match LedPattern::for_state(state) {
            LedPattern::Off => false,
            LedPattern::On => true,
            LedPattern::Blink => !self.lit,
        };
        self.lit
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn apply<P: OutputPin>(&self, pin: &mut P) -> Result<(), P::Error> {
        if self.lit { pin.set_high() } else { pin.set_low() }
    }
}
