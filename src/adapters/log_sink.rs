//! Log-based notification adapter.
//!
//! Implements [`NotificationSink`] by writing every notification to the
//! ESP-IDF logger (UART in production, stderr on host). The remote
//! notifier implements the same trait for the operator's chat.

use log::{error, info, warn};

use crate::app::events::{Notification, SelfTestStep};
use crate::app::ports::NotificationSink;

/// Adapter that logs every [`Notification`] to the serial console.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for LogNotifier {
    fn notify(&mut self, notification: &Notification) {
        match notification {
            Notification::Started { sensor_available } => {
                info!("START | sensor={}", if *sensor_available { "present" } else { "absent" });
            }
            Notification::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            Notification::AlreadyInState { state } => {
                info!("STATE | already {state}");
            }
            Notification::Blocked { command } => {
                warn!("BLOCK | '{}' refused", command.name());
            }
            Notification::EmergencyStop => {
                error!("ESTOP | gate halted");
            }
            Notification::Overheat { celsius } => {
                error!("THERM | overheat {celsius:.1}\u{00b0}C, motion locked");
            }
            Notification::TemperatureChanged { celsius } => {
                info!("THERM | {celsius:.1}\u{00b0}C");
            }
            Notification::SensorFault(fault) => {
                warn!("THERM | sensor fault: {fault}");
            }
            Notification::SensorRestored => {
                info!("THERM | sensor restored");
            }
            Notification::LatchReset => {
                warn!("THERM | overheat latch reset");
            }
            Notification::Temperature { reading, band } => {
                info!("QUERY | T={:.1}\u{00b0}C ({})", reading.celsius, band.name());
            }
            Notification::TemperatureUnavailable(fault) => {
                warn!("QUERY | temperature unavailable: {fault}");
            }
            Notification::Status(snapshot) => {
                let json = serde_json::to_string(snapshot).unwrap_or_default();
                info!("STATUS | {json}");
            }
            Notification::SelfTestStep(step) => match step {
                SelfTestStep::Started => info!("TEST | started"),
                SelfTestStep::RelaysPulsed => info!("TEST | relays pulsed"),
                SelfTestStep::Temperature(Ok(c)) => info!("TEST | T={c:.1}\u{00b0}C"),
                SelfTestStep::Temperature(Err(e)) => warn!("TEST | temperature: {e}"),
                SelfTestStep::State(state) => info!("TEST | gate {state}"),
            },
            Notification::SelfTestComplete => {
                info!("TEST | complete");
            }
            Notification::Help => {
                info!("HELP | sent");
            }
            Notification::UnknownCommand { raw } => {
                warn!("CMD | unknown '{raw}'");
            }
        }
    }
}
