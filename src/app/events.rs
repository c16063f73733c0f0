//! Outbound notifications.
//!
//! The [`GateService`](super::service::GateService) and the
//! [`ThermalMonitor`](crate::safety::ThermalMonitor) emit these through the
//! [`NotificationSink`](super::ports::NotificationSink) port. Adapters on the
//! other side decide what to do with them: log to serial, format a short
//! message for the remote operator, or both.

use heapless::String;

use crate::error::SensorFault;
use crate::gate::GateState;
use crate::safety::ThermalReading;

use super::commands::Command;
use super::status::{StatusSnapshot, TemperatureBand};

/// Structured notifications emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The service has started (carries whether a sensor answered).
    Started { sensor_available: bool },

    /// The gate moved between states.
    StateChanged { from: GateState, to: GateState },

    /// Open/close repeated while already travelling or at that end.
    AlreadyInState { state: GateState },

    /// A command was refused (overheat latch set, or gate moving for a
    /// self-test).
    Blocked { command: Command },

    /// The thermal monitor forced an emergency stop.
    EmergencyStop,

    /// Rising edge of the overheat latch.
    Overheat { celsius: f32 },

    /// Temperature moved by more than the significant delta.
    TemperatureChanged { celsius: f32 },

    /// The sensor stopped answering.
    SensorFault(SensorFault),

    /// A sample succeeded after a fault.
    SensorRestored,

    /// The overheat latch was cleared by an operator.
    LatchReset,

    /// Reply to a temperature query.
    Temperature {
        reading: ThermalReading,
        band: TemperatureBand,
    },

    /// Reply to a temperature query when no reading could be taken.
    TemperatureUnavailable(SensorFault),

    /// Reply to a status query.
    Status(StatusSnapshot),

    SelfTestStep(SelfTestStep),

    SelfTestComplete,

    Help,

    /// Unrecognised input; adapters answer with the help text.
    UnknownCommand { raw: String<64> },
}

/// Progress reports emitted during a self-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelfTestStep {
    Started,
    RelaysPulsed,
    Temperature(Result<f32, SensorFault>),
    State(GateState),
}
