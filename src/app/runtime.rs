//! Control loop runtime.
//!
//! [`GateRuntime`] owns the service, the scheduler and every port adapter,
//! and runs one loop iteration per [`run_once`](GateRuntime::run_once):
//!
//! ```text
//!  Scheduler.tick ──▶ GateUpdate     → travel timer
//!                 ──▶ ThermalSample  → start conversion, arm ThermalRead
//!                 ──▶ ThermalRead    → read + safety policies
//!                 ──▶ RemotePoll     → dispatch each inbound message
//!                 ──▶ StatusLed      → next blink phase
//!  Console        ──▶ at most one line per iteration
//! ```
//!
//! Notifications fan out to the injected sink and to the remote channel.

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::adapters::remote::RemoteNotifier;
use crate::config::GateConfig;
use crate::drivers::status_led::StatusLed;
use crate::scheduler::{Scheduler, Task};

use super::commands::{CommandSource, DispatchOutcome};
use super::ports::{
    ConsoleChannel, NotificationSink, RelayPort, RemoteChannel, SchedulerDelegate, ThermalSensor,
};
use super::service::{GateService, LoopContext};

/// Adapters driven from the loop.
struct LoopIo<S, M, C, N> {
    sensor: S,
    remote: M,
    console: C,
    sink: N,
    led: StatusLed,
}

impl<S, M: RemoteChannel, C, N: NotificationSink> LoopIo<S, M, C, N> {
    fn context(&self, now_ms: u64) -> LoopContext {
        LoopContext {
            now_ms,
            network_connected: self.remote.is_connected(),
        }
    }
}

pub struct GateRuntime<R, D, S, M, C, N> {
    service: GateService<R, D>,
    scheduler: Scheduler,
    io: LoopIo<S, M, C, N>,
}

impl<R, D, S, M, C, N> GateRuntime<R, D, S, M, C, N>
where
    R: RelayPort,
    D: DelayNs,
    S: ThermalSensor,
    M: RemoteChannel,
    C: ConsoleChannel,
    N: NotificationSink,
{
    pub fn new(
        config: GateConfig,
        relays: R,
        delay: D,
        sensor: S,
        remote: M,
        console: C,
        sink: N,
    ) -> Self {
        Self {
            scheduler: Scheduler::from_config(&config, 0),
            service: GateService::new(config, relays, delay),
            io: LoopIo {
                sensor,
                remote,
                console,
                sink,
                led: StatusLed::new(),
            },
        }
    }

    /// Initialise the relays, probe the sensor and anchor the schedules at
    /// `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.scheduler = Scheduler::from_config(self.service.config(), now_ms);
        let io = &mut self.io;
        let mut sink = (&mut io.sink, RemoteNotifier::new(&mut io.remote));
        self.service.start(&mut io.sensor, &mut sink, now_ms);
    }

    /// One loop iteration.
    pub fn run_once(&mut self, now_ms: u64) {
        let mut tasks = LoopTasks {
            service: &mut self.service,
            io: &mut self.io,
            arm_read_ms: None,
        };
        self.scheduler.tick(now_ms, &mut tasks);
        if let Some(delay_ms) = tasks.arm_read_ms {
            self.scheduler.arm_one_shot(Task::ThermalRead, delay_ms, now_ms);
        }

        if let Some(line) = self.io.console.poll() {
            let ctx = self.io.context(now_ms);
            let io = &mut self.io;
            let mut sink = (&mut io.sink, RemoteNotifier::new(&mut io.remote));
            self.service
                .dispatch(&line, CommandSource::Console, &mut io.sensor, &mut sink, ctx);
        }
    }

    /// End-of-travel event (limit switch hook).
    pub fn end_reached(&mut self) {
        let io = &mut self.io;
        let mut sink = (&mut io.sink, RemoteNotifier::new(&mut io.remote));
        self.service.end_reached(&mut sink);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn service(&self) -> &GateService<R, D> {
        &self.service
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn status_led(&self) -> &StatusLed {
        &self.io.led
    }

    /// Current status LED level.
    pub fn led_lit(&self) -> bool {
        self.io.led.is_lit()
    }

    pub fn sink(&self) -> &N {
        &self.io.sink
    }

    pub fn remote(&self) -> &M {
        &self.io.remote
    }

    pub fn remote_mut(&mut self) -> &mut M {
        &mut self.io.remote
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.io.sensor
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.io.console
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Borrowed view of the runtime while the scheduler is ticking.
struct LoopTasks<'a, R, D, S, M, C, N> {
    service: &'a mut GateService<R, D>,
    io: &'a mut LoopIo<S, M, C, N>,
    /// Set when a conversion started; the runtime arms the read afterwards.
    arm_read_ms: Option<u32>,
}

impl<R, D, S, M, C, N> LoopTasks<'_, R, D, S, M, C, N>
where
    R: RelayPort,
    D: DelayNs,
    S: ThermalSensor,
    M: RemoteChannel,
    N: NotificationSink,
{
    /// Dispatch every message the channel has for us.
    fn poll_remote(&mut self, ctx: LoopContext) -> crate::error::Result<usize> {
        if !ctx.network_connected {
            return Ok(0);
        }
        let messages = self.io.remote.poll()?;
        for message in &messages {
            let source = CommandSource::Remote {
                sender_id: message.sender_id,
            };
            let io = &mut *self.io;
            let mut sink = (&mut io.sink, RemoteNotifier::new(&mut io.remote));
            let outcome = self
                .service
                .dispatch(&message.text, source, &mut io.sensor, &mut sink, ctx);
            if outcome == DispatchOutcome::Rejected {
                warn!("remote message from {} ignored", message.sender_id);
            }
        }
        Ok(messages.len())
    }
}

impl<R, D, S, M, C, N> SchedulerDelegate for LoopTasks<'_, R, D, S, M, C, N>
where
    R: RelayPort,
    D: DelayNs,
    S: ThermalSensor,
    M: RemoteChannel,
    N: NotificationSink,
{
    fn on_task_due(&mut self, task: Task, now_ms: u64) {
        let ctx = self.io.context(now_ms);
        let io = &mut *self.io;
        let mut sink = (&mut io.sink, RemoteNotifier::new(&mut io.remote));

        match task {
            Task::GateUpdate => self.service.update(&mut sink, ctx),
            Task::ThermalSample => {
                if self
                    .service
                    .begin_scheduled_sample(&mut io.sensor, &mut sink, ctx)
                {
                    self.arm_read_ms = Some(io.sensor.conversion_time_ms());
                }
            }
            Task::ThermalRead => {
                self.service
                    .finish_scheduled_sample(&mut io.sensor, &mut sink, ctx);
            }
            Task::RemotePoll => {
                if let Err(e) = self.poll_remote(ctx) {
                    warn!("remote poll: {e}");
                }
            }
            Task::StatusLed => {
                io.led.tick(self.service.state());
            }
        }
    }
}
