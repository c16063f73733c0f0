//! Integration tests for the scheduler-driven control loop.
//!
//! Time is simulated: each `run_once(now_ms)` is one loop iteration at the
//! given uptime.

use super::mock_hw::{MockConsole, MockRelays, MockRemote, MockSensor, NoDelay, RecordingSink, hw_log};

use smartgate::app::events::Notification;
use smartgate::app::runtime::GateRuntime;
use smartgate::config::GateConfig;
use smartgate::gate::{GateState, RelayVector};
use smartgate::scheduler::Task;

const OPERATOR: i64 = 4242;

type Runtime = GateRuntime<MockRelays, NoDelay, MockSensor, MockRemote, MockConsole, RecordingSink>;

fn make_runtime(remote: MockRemote) -> Runtime {
    let config = GateConfig {
        authorized_sender: Some(OPERATOR),
        ..GateConfig::default()
    };
    let log = hw_log();
    GateRuntime::new(
        config,
        MockRelays::new(&log),
        NoDelay,
        MockSensor::new(),
        remote,
        MockConsole::default(),
        RecordingSink::new(),
    )
}

#[test]
fn start_announces_on_both_sinks() {
    let mut rt = make_runtime(MockRemote::online());
    rt.start(0);

    assert_eq!(rt.service().relays(), RelayVector::SAFE);
    assert_eq!(
        rt.sink().notifications,
        vec![Notification::Started { sensor_available: true }]
    );
    assert_eq!(rt.remote().sent.len(), 1);
    assert!(rt.remote().sent[0].starts_with("Gate controller online"));
}

#[test]
fn thermal_read_follows_conversion_time() {
    let mut rt = make_runtime(MockRemote::offline());
    rt.sensor_mut().push(75.0);
    rt.start(0);

    rt.run_once(0);
    assert_eq!(rt.sensor_mut().conversions, 1);
    assert!(rt.scheduler().is_armed(Task::ThermalRead));

    rt.run_once(700);
    assert!(!rt.service().latch().overheated, "read must wait for the conversion");

    rt.run_once(750);
    assert!(rt.service().latch().overheated);
    assert_eq!(rt.service().state(), GateState::Stopped);
    assert!(!rt.scheduler().is_armed(Task::ThermalRead));
}

#[test]
fn remote_commands_are_dispatched_and_answered() {
    let mut rt = make_runtime(MockRemote::online());
    rt.start(0);
    rt.remote_mut().sent.clear();
    rt.remote_mut().receive(99, "/open");
    rt.remote_mut().receive(OPERATOR, "/open");

    rt.run_once(0);

    assert_eq!(rt.service().state(), GateState::Opening);
    assert!(rt.remote().inbox.is_empty());
    assert_eq!(rt.remote().sent, vec!["Gate opening.".to_string()]);
    assert!(rt.led_lit(), "moving gate blinks, first phase lit");
}

#[test]
fn repeated_remote_close_gets_a_reply() {
    let mut rt = make_runtime(MockRemote::online());
    rt.start(0);
    rt.remote_mut().sent.clear();
    rt.remote_mut().receive(OPERATOR, "close");

    rt.run_once(0);

    assert_eq!(rt.service().state(), GateState::Closed);
    assert_eq!(rt.remote().sent, vec!["Gate already closed.".to_string()]);
}

#[test]
fn poll_failure_only_skips_the_cycle() {
    let mut rt = make_runtime(MockRemote::online());
    rt.start(0);
    rt.remote_mut().poll_fails = true;
    rt.remote_mut().receive(OPERATOR, "open");

    rt.run_once(0);
    assert_eq!(rt.service().state(), GateState::Closed);

    rt.remote_mut().poll_fails = false;
    rt.run_once(1_000);
    assert_eq!(rt.service().state(), GateState::Opening);
}

#[test]
fn offline_remote_is_not_polled() {
    let mut rt = make_runtime(MockRemote::offline());
    rt.start(0);
    rt.remote_mut().receive(OPERATOR, "open");

    rt.run_once(0);

    assert_eq!(rt.remote().inbox.len(), 1);
    assert_eq!(rt.service().state(), GateState::Closed);
}

#[test]
fn console_lines_are_taken_one_per_iteration() {
    let mut rt = make_runtime(MockRemote::offline());
    rt.start(0);
    rt.console_mut().type_line("O");
    rt.console_mut().type_line("S");

    rt.run_once(0);
    assert_eq!(rt.service().state(), GateState::Opening);

    rt.run_once(50);
    assert_eq!(rt.service().state(), GateState::Stopped);
    assert_eq!(rt.service().relays(), RelayVector::SAFE);
}

#[test]
fn travel_completes_inside_the_loop() {
    let mut rt = make_runtime(MockRemote::offline());
    rt.start(0);
    rt.console_mut().type_line("o");
    rt.run_once(0);

    let mut now = 0;
    while now < 19_900 {
        now += 100;
        rt.run_once(now);
    }
    assert_eq!(rt.service().state(), GateState::Opening);

    rt.run_once(20_000);
    assert_eq!(rt.service().state(), GateState::Open);
    assert!(!rt.service().relays().is_driving());
}

#[test]
fn end_reached_completes_travel_early() {
    let mut rt = make_runtime(MockRemote::offline());
    rt.start(0);
    rt.console_mut().type_line("o");
    rt.run_once(0);

    rt.end_reached();

    assert_eq!(rt.service().state(), GateState::Open);
    assert_eq!(
        rt.sink()
            .count(|n| matches!(n, Notification::StateChanged { to: GateState::Open, .. })),
        1
    );
}
