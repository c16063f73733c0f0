//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GateService (domain)
//! ```
//!
//! Driven adapters (relay bank, temperature sensor, messaging transport,
//! console, notifiers) implement these traits. The
//! [`GateService`](super::service::GateService) consumes them via generics,
//! so the domain core never touches hardware directly.

use heapless::{String, Vec};

use crate::error::{SensorFault, TransportFault};
use crate::gate::{RelayLine, RelayVector};
use crate::scheduler::Task;

use super::events::Notification;

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-only access to the four gate relays.
///
/// Only [`GateController`](crate::gate::GateController) holds one. Sequencing
/// and timing are the controller's job; implementations just drive lines.
pub trait RelayPort {
    /// Drive one line. `asserted == true` energises the relay.
    fn write(&mut self, line: RelayLine, asserted: bool);

    /// The vector last written to the bank.
    fn vector(&self) -> RelayVector;
}

// ───────────────────────────────────────────────────────────────
// Thermal sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Slow, fallible temperature sensor with a two-phase read.
pub trait ThermalSensor {
    /// Check that a sensor answers at all. Called once at startup.
    fn probe(&mut self) -> Result<(), SensorFault> {
        Ok(())
    }

    /// Kick off a conversion.
    fn start_conversion(&mut self) -> Result<(), SensorFault>;

    /// Fetch the converted value. Valid once `conversion_time_ms` has elapsed
    /// since [`start_conversion`](Self::start_conversion).
    fn read_celsius(&mut self) -> Result<f32, SensorFault>;

    /// Time the sensor needs between start and read.
    fn conversion_time_ms(&self) -> u32 {
        750
    }
}

// ───────────────────────────────────────────────────────────────
// Remote channel port (driven adapter: transport ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Upper bound on messages handed over per poll.
pub const MAX_INBOUND: usize = 8;

/// One text message received from the remote channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: i64,
    pub text: String<64>,
}

/// Bidirectional text channel to a remote operator.
///
/// Connection establishment, retry and the wire format stay inside the
/// adapter; a failed poll or send only means "nothing this cycle".
pub trait RemoteChannel {
    fn poll(&mut self) -> Result<Vec<InboundMessage, MAX_INBOUND>, TransportFault>;

    fn send(&mut self, text: &str) -> Result<(), TransportFault>;

    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Console port (driven adapter: serial → domain)
// ───────────────────────────────────────────────────────────────

/// Longest console line the dispatcher accepts.
pub const CONSOLE_LINE_LEN: usize = 16;

/// Local serial console. Returns at most one pending line per call.
pub trait ConsoleChannel {
    fn poll(&mut self) -> Option<String<CONSOLE_LINE_LEN>>;
}

// ───────────────────────────────────────────────────────────────
// Notification sink port (driven adapter: domain → operator)
// ───────────────────────────────────────────────────────────────

/// The domain emits [`Notification`]s through this port. Adapters decide
/// where they go (log, remote chat, both).
pub trait NotificationSink {
    fn notify(&mut self, notification: &Notification);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &mut T {
    fn notify(&mut self, notification: &Notification) {
        (**self).notify(notification);
    }
}

/// Fan a notification out to two sinks, in order.
impl<A: NotificationSink, B: NotificationSink> NotificationSink for (A, B) {
    fn notify(&mut self, notification: &Notification) {
        self.0.notify(notification);
        self.1.notify(notification);
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the control loop)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`Scheduler`](crate::scheduler::Scheduler) invokes
/// for each task that is due. The scheduler itself knows nothing about the
/// gate, the sensor or the transport.
pub trait SchedulerDelegate {
    fn on_task_due(&mut self, task: Task, now_ms: u64);
}
