//! Integration tests for the GateService → GateController → relays pipeline.
//!
//! These run on the host and drive the service exactly as the control loop
//! does: commands in, relay writes and notifications out.

use super::mock_hw::{HwLog, HwOp, MockRelays, MockSensor, RecordingDelay, RecordingSink, hw_log};

use smartgate::app::commands::{Command, CommandSource, DispatchOutcome};
use smartgate::app::events::{Notification, SelfTestStep};
use smartgate::app::service::{GateService, LoopContext};
use smartgate::config::GateConfig;
use smartgate::error::SensorFault;
use smartgate::gate::{GateState, RelayLine, RelayVector};

const OPERATOR: i64 = 4242;
const CONSOLE: CommandSource = CommandSource::Console;

type Service = GateService<MockRelays, RecordingDelay>;

struct Rig {
    svc: Service,
    log: HwLog,
    sensor: MockSensor,
    sink: RecordingSink,
}

fn ctx(now_ms: u64) -> LoopContext {
    LoopContext {
        now_ms,
        network_connected: true,
    }
}

/// Started service with the startup writes and notification cleared.
fn make_rig() -> Rig {
    let config = GateConfig {
        authorized_sender: Some(OPERATOR),
        ..GateConfig::default()
    };
    let log = hw_log();
    let mut svc = GateService::new(config, MockRelays::new(&log), RecordingDelay::new(&log));
    let mut sensor = MockSensor::new();
    let mut sink = RecordingSink::new();
    svc.start(&mut sensor, &mut sink, 0);
    log.borrow_mut().clear();
    sink.clear();
    Rig { svc, log, sensor, sink }
}

impl Rig {
    fn console(&mut self, text: &str, now_ms: u64) -> DispatchOutcome {
        self.svc
            .dispatch(text, CONSOLE, &mut self.sensor, &mut self.sink, ctx(now_ms))
    }

    fn remote(&mut self, sender_id: i64, text: &str) -> DispatchOutcome {
        self.svc.dispatch(
            text,
            CommandSource::Remote { sender_id },
            &mut self.sensor,
            &mut self.sink,
            ctx(0),
        )
    }

    /// Feed one reading through a blocking sample.
    fn inject(&mut self, celsius: f32) {
        self.sensor.push(celsius);
        self.svc
            .sample_now(&mut self.sensor, &mut self.sink, ctx(0))
            .expect("reading accepted");
    }

    fn writes(&self) -> Vec<(RelayLine, bool)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|op| match op {
                HwOp::Write(line, on) => Some((*line, *on)),
                HwOp::Delay(_) => None,
            })
            .collect()
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_drives_safe_vector_and_announces() {
    let log = hw_log();
    let mut svc = GateService::new(
        GateConfig::default(),
        MockRelays::new(&log),
        RecordingDelay::new(&log),
    );
    let mut sensor = MockSensor::absent();
    let mut sink = RecordingSink::new();
    svc.start(&mut sensor, &mut sink, 0);

    assert_eq!(svc.state(), GateState::Closed);
    assert_eq!(svc.relays(), RelayVector::SAFE);
    assert_eq!(
        sink.notifications,
        vec![Notification::Started { sensor_available: false }]
    );
}

// ── Open scenario ─────────────────────────────────────────────

#[test]
fn open_from_closed_runs_interlocked_sequence() {
    let mut rig = make_rig();

    let outcome = rig.console("O", 0);

    assert_eq!(outcome, DispatchOutcome::Executed(Command::Open));
    assert_eq!(rig.svc.state(), GateState::Opening);
    assert_eq!(
        *rig.log.borrow(),
        vec![
            HwOp::Write(RelayLine::Enable, true),
            HwOp::Delay(100),
            HwOp::Write(RelayLine::Stop, false),
            HwOp::Delay(50),
            HwOp::Write(RelayLine::Open, true),
        ]
    );
    assert_eq!(
        rig.sink.count(|n| matches!(
            n,
            Notification::StateChanged { to: GateState::Opening, .. }
        )),
        1
    );
}

#[test]
fn close_while_opening_reverses_safely() {
    let mut rig = make_rig();
    rig.console("open", 0);
    rig.log.borrow_mut().clear();

    rig.console("close", 1_000);

    assert_eq!(rig.svc.state(), GateState::Closing);
    let writes = rig.writes();
    assert_eq!(writes.first(), Some(&(RelayLine::Open, false)));
    assert_eq!(writes.last(), Some(&(RelayLine::Close, true)));
    assert!(!rig.svc.relays().open);
}

#[test]
fn repeated_open_is_acknowledged_without_relay_writes() {
    let mut rig = make_rig();
    rig.console("open", 0);
    rig.sink.clear();
    rig.log.borrow_mut().clear();

    let outcome = rig.console("open", 500);

    assert_eq!(outcome, DispatchOutcome::Executed(Command::Open));
    assert!(rig.log.borrow().is_empty());
    assert_eq!(
        rig.sink.notifications,
        vec![Notification::AlreadyInState { state: GateState::Opening }]
    );
}

#[test]
fn travel_timer_completes_open() {
    let mut rig = make_rig();
    rig.console("open", 0);
    rig.sink.clear();

    rig.svc.update(&mut rig.sink, ctx(19_999));
    assert_eq!(rig.svc.state(), GateState::Opening);

    rig.svc.update(&mut rig.sink, ctx(20_000));
    assert_eq!(rig.svc.state(), GateState::Open);
    assert!(!rig.svc.relays().is_driving());
    assert_eq!(
        rig.sink.notifications,
        vec![Notification::StateChanged {
            from: GateState::Opening,
            to: GateState::Open
        }]
    );
}

#[test]
fn stop_works_while_overheated() {
    let mut rig = make_rig();
    rig.console("open", 0);
    rig.inject(75.0);
    rig.sink.clear();

    let outcome = rig.console("stop", 100);

    assert_eq!(outcome, DispatchOutcome::Executed(Command::Stop));
    assert_eq!(rig.svc.state(), GateState::Stopped);
    assert_eq!(rig.svc.relays(), RelayVector::SAFE);
}

// ── Overheat scenarios ────────────────────────────────────────

#[test]
fn critical_reading_trips_emergency_stop_and_latch() {
    let mut rig = make_rig();
    rig.console("open", 0);
    rig.sink.clear();
    rig.log.borrow_mut().clear();

    rig.inject(75.0);

    assert_eq!(rig.svc.state(), GateState::Stopped);
    assert!(rig.svc.latch().overheated);
    assert!(!rig.svc.relays().is_driving());
    assert!(rig.svc.relays().stop);
    assert_eq!(rig.sink.count(|n| matches!(n, Notification::Overheat { .. })), 1);
    assert_eq!(rig.sink.count(|n| *n == Notification::EmergencyStop), 1);
    // Only the conversion wait; the emergency release itself has no settle.
    assert_eq!(
        rig.log.borrow().iter().filter(|op| matches!(op, HwOp::Delay(_))).count(),
        1
    );
}

#[test]
fn cooling_does_not_clear_latch() {
    let mut rig = make_rig();
    rig.inject(75.0);
    rig.inject(25.0);
    rig.inject(20.0);
    assert!(rig.svc.latch().overheated);
}

#[test]
fn repeated_critical_readings_notify_overheat_once() {
    let mut rig = make_rig();
    rig.inject(75.0);
    rig.inject(80.0);
    assert_eq!(rig.sink.count(|n| matches!(n, Notification::Overheat { .. })), 1);
}

#[test]
fn open_while_overheated_is_blocked_without_relay_change() {
    let mut rig = make_rig();
    rig.inject(75.0);
    rig.sink.clear();
    rig.log.borrow_mut().clear();
    let before = rig.svc.relays();

    let outcome = rig.console("open", 0);

    assert_eq!(outcome, DispatchOutcome::Blocked(Command::Open));
    assert!(rig.log.borrow().is_empty(), "no relay write while blocked");
    assert_eq!(rig.svc.relays(), before);
    assert_eq!(rig.svc.state(), GateState::Stopped);
    assert_eq!(
        rig.sink.notifications,
        vec![Notification::Blocked { command: Command::Open }]
    );
}

#[test]
fn reset_then_open_succeeds() {
    let mut rig = make_rig();
    rig.inject(75.0);

    assert_eq!(
        rig.console("reset", 0),
        DispatchOutcome::Executed(Command::ResetSafety)
    );
    assert!(!rig.svc.latch().overheated);
    assert_eq!(rig.console("open", 0), DispatchOutcome::Executed(Command::Open));
    assert_eq!(rig.svc.state(), GateState::Opening);
}

#[test]
fn significant_change_is_debounced() {
    let mut rig = make_rig();
    rig.inject(30.0);
    rig.inject(33.0);
    rig.inject(36.0);
    let changes: Vec<f32> = rig
        .sink
        .notifications
        .iter()
        .filter_map(|n| match n {
            Notification::TemperatureChanged { celsius } => Some(*celsius),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![30.0, 36.0]);
}

#[test]
fn critical_jump_reports_both_trip_and_change() {
    let mut rig = make_rig();
    rig.inject(30.0);
    rig.sink.clear();

    rig.inject(75.0);

    assert!(rig.svc.latch().overheated);
    assert_eq!(rig.sink.count(|n| matches!(n, Notification::Overheat { .. })), 1);
    assert_eq!(
        rig.sink
            .count(|n| *n == Notification::TemperatureChanged { celsius: 75.0 }),
        1
    );
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn sensor_fault_degrades_and_query_restores() {
    let mut rig = make_rig();
    rig.sensor.push_fault(SensorFault::ReadFailed);

    rig.console("t", 0);
    assert!(!rig.svc.monitor().sensor_available());
    assert_eq!(rig.sink.count(|n| matches!(n, Notification::SensorFault(_))), 1);
    assert_eq!(
        rig.sink.count(|n| matches!(n, Notification::TemperatureUnavailable(_))),
        1
    );

    // Scheduled sampling skips an unavailable sensor.
    assert!(!rig.svc.begin_scheduled_sample(&mut rig.sensor, &mut rig.sink, ctx(0)));

    rig.sensor.push(22.5);
    rig.console("t", 0);
    assert!(rig.svc.monitor().sensor_available());
    assert_eq!(rig.sink.count(|n| *n == Notification::SensorRestored), 1);
    assert_eq!(rig.svc.state(), GateState::Closed);
}

#[test]
fn scheduled_sample_applies_policies() {
    let mut rig = make_rig();
    rig.sensor.push(71.0);

    assert!(rig.svc.begin_scheduled_sample(&mut rig.sensor, &mut rig.sink, ctx(0)));
    rig.svc
        .finish_scheduled_sample(&mut rig.sensor, &mut rig.sink, ctx(750));

    assert!(rig.svc.latch().overheated);
    assert_eq!(rig.svc.state(), GateState::Stopped);
}

// ── Dispatcher ────────────────────────────────────────────────

#[test]
fn unknown_text_yields_help_without_state_change() {
    let mut rig = make_rig();

    let outcome = rig.console("xyzzy", 0);

    assert!(matches!(
        outcome,
        DispatchOutcome::Executed(Command::Unknown(ref raw)) if raw.as_str() == "xyzzy"
    ));
    assert_eq!(rig.svc.state(), GateState::Closed);
    assert!(rig.log.borrow().is_empty());
    assert_eq!(rig.sink.notifications.len(), 1);
    assert!(matches!(
        &rig.sink.notifications[0],
        Notification::UnknownCommand { raw } if raw.as_str() == "xyzzy"
    ));
}

#[test]
fn remote_commands_need_authorised_sender() {
    let mut rig = make_rig();

    assert_eq!(rig.remote(7, "/open"), DispatchOutcome::Rejected);
    assert_eq!(rig.svc.state(), GateState::Closed);
    assert!(rig.sink.notifications.is_empty());

    assert_eq!(
        rig.remote(OPERATOR, "/open"),
        DispatchOutcome::Executed(Command::Open)
    );
    assert_eq!(rig.svc.state(), GateState::Opening);
}

#[test]
fn status_query_reports_snapshot() {
    let mut rig = make_rig();
    rig.inject(41.0);
    rig.sink.clear();

    rig.console("status", 120_000);

    let Some(Notification::Status(snapshot)) = rig.sink.notifications.first() else {
        panic!("expected a status reply, got {:?}", rig.sink.notifications);
    };
    assert_eq!(snapshot.state, GateState::Closed);
    assert!(!snapshot.overheated);
    assert_eq!(snapshot.temperature.map(|r| r.celsius), Some(41.0));
    assert_eq!(snapshot.uptime_minutes(), 2);
}

#[test]
fn emergency_stop_is_not_operator_issuable() {
    let mut rig = make_rig();
    rig.console("open", 0);
    let outcome = rig.svc.execute(
        Command::EmergencyStop,
        &mut rig.sensor,
        &mut rig.sink,
        ctx(0),
    );
    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(rig.svc.state(), GateState::Opening);
}

// ── Self-test ─────────────────────────────────────────────────

#[test]
fn self_test_reports_each_step() {
    let mut rig = make_rig();
    rig.sensor.push(24.0);

    let outcome = rig.console("test", 0);

    assert_eq!(outcome, DispatchOutcome::Executed(Command::SelfTest));
    assert_eq!(rig.svc.state(), GateState::Closed);
    assert_eq!(rig.svc.relays(), RelayVector::SAFE);
    let steps: Vec<SelfTestStep> = rig
        .sink
        .notifications
        .iter()
        .filter_map(|n| match n {
            Notification::SelfTestStep(step) => Some(*step),
            _ => None,
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            SelfTestStep::Started,
            SelfTestStep::RelaysPulsed,
            SelfTestStep::Temperature(Ok(24.0)),
            SelfTestStep::State(GateState::Closed),
        ]
    );
    assert_eq!(rig.sink.notifications.last(), Some(&Notification::SelfTestComplete));
    assert!(rig.writes().contains(&(RelayLine::Open, true)));
    assert!(rig.writes().contains(&(RelayLine::Close, true)));
}

#[test]
fn self_test_is_gated_by_latch() {
    let mut rig = make_rig();
    rig.inject(75.0);
    rig.log.borrow_mut().clear();

    let outcome = rig.console("test", 0);

    assert_eq!(outcome, DispatchOutcome::Blocked(Command::SelfTest));
    assert!(rig.log.borrow().is_empty());
}
