//! Status reporting.
//!
//! Snapshots are pure values built from whatever the core last observed;
//! building one never touches the sensor or the relays.

use serde::Serialize;

use crate::gate::GateState;
use crate::safety::{SafetyLatch, ThermalReading};

/// Point-in-time view of the controller, suitable for logging or sending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: GateState,
    pub overheated: bool,
    pub temperature: Option<ThermalReading>,
    pub sensor_available: bool,
    pub network_connected: bool,
    pub uptime_ms: u64,
}

impl StatusSnapshot {
    /// Whole minutes since boot.
    pub fn uptime_minutes(&self) -> u64 {
        self.uptime_ms / 60_000
    }
}

/// Build a snapshot. Deterministic in its inputs.
pub fn build_snapshot(
    state: GateState,
    latch: SafetyLatch,
    last_reading: Option<ThermalReading>,
    sensor_available: bool,
    network_connected: bool,
    uptime_ms: u64,
) -> StatusSnapshot {
    StatusSnapshot {
        state,
        overheated: latch.overheated,
        temperature: last_reading,
        sensor_available,
        network_connected,
        uptime_ms,
    }
}

/// Coarse classification used in temperature replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    /// Above 80 °C.
    Critical,
    /// Above 60 °C.
    High,
    /// Above 40 °C.
    Normal,
    Low,
}

impl TemperatureBand {
    pub fn of(celsius: f32) -> Self {
        if celsius > 80.0 {
            Self::Critical
        } else if celsius > 60.0 {
            Self::High
        } else if celsius > 40.0 {
            Self::Normal
        } else {
            Self::Low
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}
