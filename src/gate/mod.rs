//! Gate motion state machine and interlocked relay sequencing.
//!
//! ```text
//!             open()             travel timer / end_reached()
//!   Closed ──────────▶ Opening ────────────────────────────▶ Open
//!     ▲                 │   ▲                                  │
//!     │          close()│   │open()                     close()│
//!     │                 ▼   │                                  │
//!     └────────────── Closing ◀────────────────────────────────┘
//!   travel timer /
//!   end_reached()
//!
//!   (any) ── stop() / emergency_stop() ──▶ Stopped ── open()/close() ──▶ Opening/Closing
//! ```
//!
//! [`GateController`] is the only owner of the relay bank. Every relay write
//! happens inside one of its sequences, so the interlock rules on
//! [`RelayVector`] hold at every observable instant:
//!
//! - drive: (drop the opposing line) → ENABLE on → settle → STOP off →
//!   settle → drive line on
//! - release: OPEN off → CLOSE off → STOP on → settle → ENABLE off
//!
//! Motion is refused while the overheat latch is set; stopping never is.

pub mod relays;

pub use relays::{RelayLine, RelayVector};

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::RelayPort;
use crate::config::GateConfig;
use crate::error::GateError;
use crate::safety::SafetyLatch;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Closed,
    Opening,
    Open,
    Closing,
    Stopped,
}

impl GateState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
        }
    }

    /// A travel is in progress.
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a state change, handed back to the caller for notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GateState,
    pub to: GateState,
}

impl Transition {
    /// `false` for re-entry into the same state (e.g. stop while stopped).
    pub fn is_change(self) -> bool {
        self.from != self.to
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Settle delays and the travel timer, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTiming {
    pub enable_settle_ms: u32,
    pub stop_release_settle_ms: u32,
    pub stop_settle_ms: u32,
    pub travel_time_ms: u32,
}

impl From<&GateConfig> for RelayTiming {
    fn from(config: &GateConfig) -> Self {
        Self {
            enable_settle_ms: config.enable_settle_ms,
            stop_release_settle_ms: config.stop_release_settle_ms,
            stop_settle_ms: config.stop_settle_ms,
            travel_time_ms: config.travel_time_ms,
        }
    }
}

impl Default for RelayTiming {
    fn default() -> Self {
        Self::from(&GateConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Open,
    Close,
}

impl Direction {
    const fn drive_line(self) -> RelayLine {
        match self {
            Self::Open => RelayLine::Open,
            Self::Close => RelayLine::Close,
        }
    }

    const fn opposing_line(self) -> RelayLine {
        match self {
            Self::Open => RelayLine::Close,
            Self::Close => RelayLine::Open,
        }
    }

    const fn travel_state(self) -> GateState {
        match self {
            Self::Open => GateState::Opening,
            Self::Close => GateState::Closing,
        }
    }

    const fn end_state(self) -> GateState {
        match self {
            Self::Open => GateState::Open,
            Self::Close => GateState::Closed,
        }
    }
}

// ---------------------------------------------------------------------------
// Emergency stop seam
// ---------------------------------------------------------------------------

/// Immediate, unconditional stop. Implemented by [`GateController`] and
/// invoked by the thermal monitor; never reachable from a user command.
pub trait EmergencyStop {
    fn emergency_stop(&mut self) -> Transition;
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct GateController<R, D> {
    relays: R,
    delay: D,
    timing: RelayTiming,
    state: GateState,
    /// Set while Opening/Closing.
    travel_started_ms: Option<u64>,
}

impl<R: RelayPort, D: DelayNs> GateController<R, D> {
    /// The gate is assumed closed at power-up.
    pub fn new(relays: R, delay: D, timing: RelayTiming) -> Self {
        Self {
            relays,
            delay,
            timing,
            state: GateState::Closed,
            travel_started_ms: None,
        }
    }

    /// Drive the boot-time safe vector.
    pub fn init(&mut self) {
        self.release_drive(false);
        self.state = GateState::Closed;
        self.travel_started_ms = None;
        info!("relay bank initialised: {:?}", self.relays.vector());
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn relays(&self) -> RelayVector {
        self.relays.vector()
    }

    pub fn travel_started_ms(&self) -> Option<u64> {
        self.travel_started_ms
    }

    pub(crate) fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Start opening. `Ok(None)` if already open or opening.
    pub fn open(
        &mut self,
        latch: SafetyLatch,
        now_ms: u64,
    ) -> Result<Option<Transition>, GateError> {
        self.drive(Direction::Open, latch, now_ms)
    }

    /// Start closing. `Ok(None)` if already closed or closing.
    pub fn close(
        &mut self,
        latch: SafetyLatch,
        now_ms: u64,
    ) -> Result<Option<Transition>, GateError> {
        self.drive(Direction::Close, latch, now_ms)
    }

    /// Release the drive lines and brake. Always succeeds.
    pub fn stop(&mut self) -> Transition {
        self.release_drive(true);
        self.travel_started_ms = None;
        self.enter(GateState::Stopped)
    }

    /// Complete the travel once the configured travel time has elapsed.
    pub fn update(&mut self, now_ms: u64) -> Option<Transition> {
        let started = self.travel_started_ms?;
        if now_ms.saturating_sub(started) < u64::from(self.timing.travel_time_ms) {
            return None;
        }
        self.complete_travel()
    }

    /// End-of-travel event from an external source (limit switch hook).
    pub fn end_reached(&mut self) -> Option<Transition> {
        self.complete_travel()
    }

    /// Pulse OPEN, pause, pulse CLOSE, each under a full interlock sequence,
    /// then return to the safe vector. State is left unchanged. Returns
    /// `false` without touching the relays while a travel is in progress.
    pub fn self_test_pulse(&mut self, pulse_ms: u32) -> bool {
        if self.state.is_moving() {
            return false;
        }
        self.pulse(RelayLine::Open, pulse_ms);
        self.delay.delay_ms(pulse_ms);
        self.pulse(RelayLine::Close, pulse_ms);
        info!("relay self-test pulses complete");
        true
    }

    fn drive(
        &mut self,
        direction: Direction,
        latch: SafetyLatch,
        now_ms: u64,
    ) -> Result<Option<Transition>, GateError> {
        if latch.overheated {
            warn!(
                "{} refused: overheat latch set",
                direction.travel_state()
            );
            return Err(GateError::Blocked);
        }
        if self.state == direction.travel_state() || self.state == direction.end_state() {
            info!("gate already {}", self.state);
            return Ok(None);
        }

        let opposing = direction.opposing_line();
        if self.relays.vector().get(opposing) {
            self.relays.write(opposing, false);
        }
        self.engage(direction.drive_line());

        self.travel_started_ms = Some(now_ms);
        Ok(Some(self.enter(direction.travel_state())))
    }

    fn pulse(&mut self, line: RelayLine, pulse_ms: u32) {
        self.engage(line);
        self.delay.delay_ms(pulse_ms);
        self.release_drive(true);
    }

    /// ENABLE on → settle → STOP off → settle → `line` on.
    fn engage(&mut self, line: RelayLine) {
        self.relays.write(RelayLine::Enable, true);
        self.delay.delay_ms(self.timing.enable_settle_ms);
        self.relays.write(RelayLine::Stop, false);
        self.delay.delay_ms(self.timing.stop_release_settle_ms);
        self.relays.write(line, true);
    }

    /// OPEN off → CLOSE off → STOP on → (settle) → ENABLE off.
    fn release_drive(&mut self, settle: bool) {
        self.relays.write(RelayLine::Open, false);
        self.relays.write(RelayLine::Close, false);
        self.relays.write(RelayLine::Stop, true);
        if settle {
            self.delay.delay_ms(self.timing.stop_settle_ms);
        }
        self.relays.write(RelayLine::Enable, false);
    }

    fn complete_travel(&mut self) -> Option<Transition> {
        let end = match self.state {
            GateState::Opening => GateState::Open,
            GateState::Closing => GateState::Closed,
            _ => return None,
        };
        self.release_drive(true);
        self.travel_started_ms = None;
        Some(self.enter(end))
    }

    fn enter(&mut self, to: GateState) -> Transition {
        let from = self.state;
        self.state = to;
        info!("gate {from} -> {to}");
        Transition { from, to }
    }
}

impl<R: RelayPort, D: DelayNs> EmergencyStop for GateController<R, D> {
    fn emergency_stop(&mut self) -> Transition {
        self.release_drive(false);
        self.travel_started_ms = None;
        let transition = self.enter(GateState::Stopped);
        error!("EMERGENCY STOP (was {})", transition.from);
        transition
    }
}
