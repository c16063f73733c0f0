//! Unified error types for the SmartGate firmware.
//!
//! Every variant is `Copy` so faults can be handed between the thermal
//! monitor, the gate controller and the notifier without allocation.
//! Nothing in here is fatal: the control loop turns each error into a
//! degraded-mode flag, a log line or an outbound notification.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The temperature sensor could not be read.
    Sensor(SensorFault),
    /// The remote messaging channel failed this cycle.
    Transport(TransportFault),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// No sensor answered, or the input sits at a supply rail (open/short).
    NotPresent,
    /// The conversion or read itself failed.
    ReadFailed,
    /// The value is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent => write!(f, "sensor not present"),
            Self::ReadFailed => write!(f, "sensor read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport faults
// ---------------------------------------------------------------------------

/// Failures of the remote messaging channel. All of them mean "no data this
/// cycle"; the transport owns its own reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    NotConnected,
    PollFailed,
    SendFailed,
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::PollFailed => write!(f, "poll failed"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}

impl From<TransportFault> for Error {
    fn from(e: TransportFault) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Gate errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// Motion refused because the overheat latch is set.
    Blocked,
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked by overheat latch"),
        }
    }
}

/// Convenience alias used throughout the firmware.
pub type Result<T> = core::result::Result<T, Error>;
