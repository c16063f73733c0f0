//! Remote operator adapters.
//!
//! [`RemoteNotifier`] turns notifications into short English messages and
//! sends them over any [`RemoteChannel`]. Delivery is best effort: while the
//! channel is down, messages are dropped (the log keeps them).
//!
//! [`NullRemote`] stands in when no transport is configured, the same way a
//! null transport stands in for an absent RPC client.

use log::{debug, warn};

use crate::app::commands::Command;
use crate::app::events::{Notification, SelfTestStep};
use crate::app::ports::{InboundMessage, MAX_INBOUND, NotificationSink, RemoteChannel};
use crate::app::status::StatusSnapshot;
use crate::error::TransportFault;

pub const HELP_TEXT: &str = "Commands: open, close, stop, temp, status, test, reset, help\n\
                             Console: O-open, C-close, S-stop, T-temperature";

// ───────────────────────────────────────────────────────────────
// Null channel
// ───────────────────────────────────────────────────────────────

/// A channel that is never connected.
#[derive(Debug, Default)]
pub struct NullRemote;

impl RemoteChannel for NullRemote {
    fn poll(&mut self) -> Result<heapless::Vec<InboundMessage, MAX_INBOUND>, TransportFault> {
        Err(TransportFault::NotConnected)
    }

    fn send(&mut self, _text: &str) -> Result<(), TransportFault> {
        Err(TransportFault::NotConnected)
    }

    fn is_connected(&self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Notifier
// ───────────────────────────────────────────────────────────────

/// Borrows the channel for the duration of one dispatch so the runtime can
/// keep polling it between notifications.
pub struct RemoteNotifier<'a, M> {
    channel: &'a mut M,
}

impl<'a, M: RemoteChannel> RemoteNotifier<'a, M> {
    pub fn new(channel: &'a mut M) -> Self {
        Self { channel }
    }
}

impl<M: RemoteChannel> NotificationSink for RemoteNotifier<'_, M> {
    fn notify(&mut self, notification: &Notification) {
        if !self.channel.is_connected() {
            debug!("remote offline; notification not sent");
            return;
        }
        let text = render(notification);
        if let Err(e) = self.channel.send(&text) {
            warn!("remote notification not delivered: {e}");
        }
    }
}

/// Operator-facing text for one notification.
pub fn render(notification: &Notification) -> String {
    match notification {
        Notification::Started { sensor_available } => format!(
            "Gate controller online. Temperature sensor: {}.",
            if *sensor_available { "connected" } else { "not found" }
        ),
        Notification::StateChanged { to, .. } => format!("Gate {to}."),
        Notification::AlreadyInState { state } => format!("Gate already {state}."),
        Notification::Blocked { command: Command::SelfTest } => {
            "Self-test refused: gate moving or overheated.".to_string()
        }
        Notification::Blocked { command } => format!(
            "'{}' blocked: gate overheated. Send 'reset' once it has cooled.",
            command.name()
        ),
        Notification::EmergencyStop => "EMERGENCY STOP: gate halted.".to_string(),
        Notification::Overheat { celsius } => {
            format!("CRITICAL OVERHEAT: {celsius:.1}°C. Motion locked until reset.")
        }
        Notification::TemperatureChanged { celsius } => format!("Temperature: {celsius:.1}°C"),
        Notification::SensorFault(fault) => format!("Temperature sensor error: {fault}."),
        Notification::SensorRestored => "Temperature sensor restored.".to_string(),
        Notification::LatchReset => "Overheat latch reset.".to_string(),
        Notification::Temperature { reading, band } => {
            format!("Temperature: {:.1}°C ({})", reading.celsius, band.name())
        }
        Notification::TemperatureUnavailable(fault) => {
            format!("Temperature unavailable: {fault}.")
        }
        Notification::Status(snapshot) => render_status(snapshot),
        Notification::SelfTestStep(step) => match step {
            SelfTestStep::Started => "Self-test started.".to_string(),
            SelfTestStep::RelaysPulsed => "1. Relays pulsed.".to_string(),
            SelfTestStep::Temperature(Ok(c)) => format!("2. Temperature: {c:.1}°C"),
            SelfTestStep::Temperature(Err(e)) => format!("2. Temperature: {e}"),
            SelfTestStep::State(state) => format!("3. Gate: {state}"),
        },
        Notification::SelfTestComplete => "Self-test complete.".to_string(),
        Notification::Help => HELP_TEXT.to_string(),
        Notification::UnknownCommand { raw } => format!("Unknown command '{raw}'.\n{HELP_TEXT}"),
    }
}

fn render_status(s: &StatusSnapshot) -> String {
    let temperature = match s.temperature {
        Some(r) if r.valid => format!("{:.1}°C", r.celsius),
        Some(_) => "sensor error".to_string(),
        None if s.sensor_available => "no reading yet".to_string(),
        None => "no sensor".to_string(),
    };
    format!(
        "Gate: {}\nOverheated: {}\nTemperature: {}\nNetwork: {}\nUptime: {} min",
        s.state,
        if s.overheated { "YES" } else { "no" },
        temperature,
        if s.network_connected { "connected" } else { "offline" },
        s.uptime_minutes(),
    )
}
