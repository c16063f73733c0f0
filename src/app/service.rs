//! Application service: the hexagonal core.
//!
//! [`GateService`] owns the gate controller and the thermal monitor. It
//! exposes a hardware-agnostic API: the relay bank and the settle delay are
//! owned by the controller, every other port is injected at call sites, so
//! the whole service is testable with mock adapters.
//!
//! ```text
//!  ThermalSensor ──▶ ┌──────────────────────────────┐ ──▶ NotificationSink
//!                    │          GateService          │
//!  command text  ──▶ │  ThermalMonitor · Controller  │ ──▶ RelayPort
//!                    └──────────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::GateConfig;
use crate::error::{GateError, SensorFault};
use crate::gate::{GateController, GateState, RelayTiming, RelayVector, Transition};
use crate::safety::{SafetyLatch, ThermalMonitor, ThermalReading};

use super::commands::{Command, CommandSource, DispatchOutcome};
use super::events::{Notification, SelfTestStep};
use super::ports::{NotificationSink, RelayPort, ThermalSensor};
use super::status::{StatusSnapshot, TemperatureBand, build_snapshot};

/// Per-iteration facts the service cannot observe itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopContext {
    pub now_ms: u64,
    pub network_connected: bool,
}

// ───────────────────────────────────────────────────────────────
// GateService
// ───────────────────────────────────────────────────────────────

pub struct GateService<R, D> {
    gate: GateController<R, D>,
    monitor: ThermalMonitor,
    config: GateConfig,
    started_ms: u64,
}

impl<R: RelayPort, D: DelayNs> GateService<R, D> {
    /// Construct the service. Relays are not touched until [`start`](Self::start).
    pub fn new(config: GateConfig, relays: R, delay: D) -> Self {
        let gate = GateController::new(relays, delay, RelayTiming::from(&config));
        let monitor = ThermalMonitor::new(&config);
        Self {
            gate,
            monitor,
            config,
            started_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the safe relay vector, probe the sensor, announce startup.
    pub fn start(
        &mut self,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        now_ms: u64,
    ) {
        self.started_ms = now_ms;
        self.gate.init();
        let sensor_available = self.monitor.probe(sensor);
        sink.notify(&Notification::Started { sensor_available });
        info!(
            "GateService started: gate {}, sensor {}",
            self.gate.state(),
            if sensor_available { "present" } else { "absent" }
        );
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    pub fn latch(&self) -> SafetyLatch {
        self.monitor.latch()
    }

    pub fn relays(&self) -> RelayVector {
        self.gate.relays()
    }

    pub fn gate(&self) -> &GateController<R, D> {
        &self.gate
    }

    pub fn monitor(&self) -> &ThermalMonitor {
        &self.monitor
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn snapshot(&self, ctx: LoopContext) -> StatusSnapshot {
        build_snapshot(
            self.gate.state(),
            self.monitor.latch(),
            self.monitor.last_reading(),
            self.monitor.sensor_available(),
            ctx.network_connected,
            ctx.now_ms.saturating_sub(self.started_ms),
        )
    }

    // ── Command handling ──────────────────────────────────────

    /// Validate the source, parse the text and execute one command.
    pub fn dispatch(
        &mut self,
        raw: &str,
        source: CommandSource,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        ctx: LoopContext,
    ) -> DispatchOutcome {
        if let CommandSource::Remote { sender_id } = source {
            if self.config.authorized_sender != Some(sender_id) {
                warn!("dropping remote message from unauthorised sender {sender_id}");
                return DispatchOutcome::Rejected;
            }
        }
        let command = Command::parse(raw);
        info!("command '{}' from {:?}", command.name(), source);
        self.execute(command, sensor, sink, ctx)
    }

    /// Route an already-parsed command.
    pub fn execute(
        &mut self,
        command: Command,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        ctx: LoopContext,
    ) -> DispatchOutcome {
        match command {
            Command::Open => {
                let result = self.gate.open(self.monitor.latch(), ctx.now_ms);
                Self::motion_outcome(Command::Open, result, self.gate.state(), sink)
            }
            Command::Close => {
                let result = self.gate.close(self.monitor.latch(), ctx.now_ms);
                Self::motion_outcome(Command::Close, result, self.gate.state(), sink)
            }
            Command::Stop => {
                let transition = self.gate.stop();
                notify_transition(sink, transition);
                DispatchOutcome::Executed(Command::Stop)
            }
            Command::EmergencyStop => {
                warn!("emergency stop is not an operator command");
                DispatchOutcome::Rejected
            }
            Command::ResetSafety => {
                self.monitor.reset_latch(sink);
                DispatchOutcome::Executed(Command::ResetSafety)
            }
            Command::QueryStatus => {
                sink.notify(&Notification::Status(self.snapshot(ctx)));
                DispatchOutcome::Executed(Command::QueryStatus)
            }
            Command::QueryTemperature => {
                let reply = match self.sample_now(sensor, sink, ctx) {
                    Ok(reading) => Notification::Temperature {
                        reading,
                        band: TemperatureBand::of(reading.celsius),
                    },
                    Err(fault) => Notification::TemperatureUnavailable(fault),
                };
                sink.notify(&reply);
                DispatchOutcome::Executed(Command::QueryTemperature)
            }
            Command::SelfTest => self.self_test(sensor, sink, ctx),
            Command::Help => {
                sink.notify(&Notification::Help);
                DispatchOutcome::Executed(Command::Help)
            }
            Command::Unknown(raw) => {
                sink.notify(&Notification::UnknownCommand { raw: raw.clone() });
                DispatchOutcome::Executed(Command::Unknown(raw))
            }
        }
    }

    // ── Thermal cycle ─────────────────────────────────────────

    /// Scheduled sampling, first half. Returns whether a conversion started;
    /// an unavailable sensor is skipped.
    pub fn begin_scheduled_sample(
        &mut self,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        ctx: LoopContext,
    ) -> bool {
        if !self.monitor.sensor_available() {
            return false;
        }
        self.monitor.begin_sample(sensor, ctx.now_ms, sink).is_ok()
    }

    /// Scheduled sampling, second half: read and apply the safety policies.
    pub fn finish_scheduled_sample(
        &mut self,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        ctx: LoopContext,
    ) {
        if !self.monitor.conversion_pending() {
            return;
        }
        if let Ok(reading) = self.monitor.finish_sample(sensor, ctx.now_ms, sink) {
            self.monitor
                .evaluate(reading, &mut self.gate, sink, ctx.network_connected);
        }
    }

    /// Blocking sample for operator queries, with the safety policies applied.
    pub fn sample_now(
        &mut self,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        ctx: LoopContext,
    ) -> Result<ThermalReading, SensorFault> {
        let reading = self
            .monitor
            .sample(sensor, self.gate.delay_mut(), ctx.now_ms, sink)?;
        self.monitor
            .evaluate(reading, &mut self.gate, sink, ctx.network_connected);
        Ok(reading)
    }

    // ── Travel ────────────────────────────────────────────────

    /// Travel timer check; call every loop iteration.
    pub fn update(&mut self, sink: &mut impl NotificationSink, ctx: LoopContext) {
        if let Some(transition) = self.gate.update(ctx.now_ms) {
            notify_transition(sink, transition);
        }
    }

    /// End-of-travel event (limit switch).
    pub fn end_reached(&mut self, sink: &mut impl NotificationSink) {
        if let Some(transition) = self.gate.end_reached() {
            notify_transition(sink, transition);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn motion_outcome(
        command: Command,
        result: Result<Option<Transition>, GateError>,
        state: GateState,
        sink: &mut impl NotificationSink,
    ) -> DispatchOutcome {
        match result {
            Ok(Some(transition)) => {
                notify_transition(sink, transition);
                DispatchOutcome::Executed(command)
            }
            Ok(None) => {
                sink.notify(&Notification::AlreadyInState { state });
                DispatchOutcome::Executed(command)
            }
            Err(GateError::Blocked) => {
                sink.notify(&Notification::Blocked {
                    command: command.clone(),
                });
                DispatchOutcome::Blocked(command)
            }
        }
    }

    /// Relay pulses, fresh temperature, state report. Refused while
    /// overheated or while a travel is in progress.
    fn self_test(
        &mut self,
        sensor: &mut impl ThermalSensor,
        sink: &mut impl NotificationSink,
        ctx: LoopContext,
    ) -> DispatchOutcome {
        if self.monitor.latch().overheated || self.gate.state().is_moving() {
            warn!("self-test refused (gate {}, latch {:?})", self.gate.state(), self.monitor.latch());
            sink.notify(&Notification::Blocked {
                command: Command::SelfTest,
            });
            return DispatchOutcome::Blocked(Command::SelfTest);
        }

        sink.notify(&Notification::SelfTestStep(SelfTestStep::Started));
        let pulsed = self.gate.self_test_pulse(self.config.self_test_pulse_ms);
        debug_assert!(pulsed, "gate started moving during self-test");
        sink.notify(&Notification::SelfTestStep(SelfTestStep::RelaysPulsed));

        let temperature = self.sample_now(sensor, sink, ctx).map(|r| r.celsius);
        sink.notify(&Notification::SelfTestStep(SelfTestStep::Temperature(temperature)));
        sink.notify(&Notification::SelfTestStep(SelfTestStep::State(self.gate.state())));
        sink.notify(&Notification::SelfTestComplete);
        DispatchOutcome::Executed(Command::SelfTest)
    }
}

fn notify_transition(sink: &mut impl NotificationSink, transition: Transition) {
    if transition.is_change() {
        sink.notify(&Notification::StateChanged {
            from: transition.from,
            to: transition.to,
        });
    } else {
        debug!("gate re-entered {}", transition.to);
    }
}
