//! Mock adapters for integration tests.
//!
//! Relays and delays share one operation log so tests can assert on the
//! exact interleaving of relay writes and settle pauses without touching
//! real GPIO.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use smartgate::app::events::Notification;
use smartgate::app::ports::{
    CONSOLE_LINE_LEN, ConsoleChannel, InboundMessage, MAX_INBOUND, NotificationSink, RelayPort,
    RemoteChannel, ThermalSensor,
};
use smartgate::error::{SensorFault, TransportFault};
use smartgate::gate::{RelayLine, RelayVector};

// ── Hardware operation record ─────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwOp {
    Write(RelayLine, bool),
    Delay(u32),
}

pub type HwLog = Rc<RefCell<Vec<HwOp>>>;

pub fn hw_log() -> HwLog {
    Rc::new(RefCell::new(Vec::new()))
}

// ── MockRelays ────────────────────────────────────────────────

/// Records writes and panics on any vector that breaks the interlock.
pub struct MockRelays {
    vector: RelayVector,
    log: HwLog,
}

impl MockRelays {
    pub fn new(log: &HwLog) -> Self {
        Self {
            vector: RelayVector::default(),
            log: Rc::clone(log),
        }
    }
}

impl RelayPort for MockRelays {
    fn write(&mut self, line: RelayLine, asserted: bool) {
        let next = self.vector.with(line, asserted);
        assert!(next.is_interlocked(), "interlock broken by {line:?}={asserted}: {next:?}");
        self.vector = next;
        self.log.borrow_mut().push(HwOp::Write(line, asserted));
    }

    fn vector(&self) -> RelayVector {
        self.vector
    }
}

// ── Delays ────────────────────────────────────────────────────

pub struct RecordingDelay {
    log: HwLog,
}

impl RecordingDelay {
    pub fn new(log: &HwLog) -> Self {
        Self { log: Rc::clone(log) }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(HwOp::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(HwOp::Delay(ms));
    }
}

/// Returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── MockSensor ────────────────────────────────────────────────

/// Hands out queued readings; an empty queue reads as a failed read.
pub struct MockSensor {
    pub present: bool,
    pub readings: VecDeque<Result<f32, SensorFault>>,
    pub conversions: usize,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new() -> Self {
        Self {
            present: true,
            readings: VecDeque::new(),
            conversions: 0,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new()
        }
    }

    pub fn push(&mut self, celsius: f32) {
        self.readings.push_back(Ok(celsius));
    }

    pub fn push_fault(&mut self, fault: SensorFault) {
        self.readings.push_back(Err(fault));
    }
}

impl ThermalSensor for MockSensor {
    fn probe(&mut self) -> Result<(), SensorFault> {
        if self.present { Ok(()) } else { Err(SensorFault::NotPresent) }
    }

    fn start_conversion(&mut self) -> Result<(), SensorFault> {
        if !self.present {
            return Err(SensorFault::NotPresent);
        }
        self.conversions += 1;
        Ok(())
    }

    fn read_celsius(&mut self) -> Result<f32, SensorFault> {
        self.readings.pop_front().unwrap_or(Err(SensorFault::ReadFailed))
    }
}

// ── MockRemote ────────────────────────────────────────────────

pub struct MockRemote {
    pub connected: bool,
    pub poll_fails: bool,
    pub inbox: Vec<InboundMessage>,
    pub sent: Vec<String>,
}

#[allow(dead_code)]
impl MockRemote {
    pub fn online() -> Self {
        Self {
            connected: true,
            poll_fails: false,
            inbox: Vec::new(),
            sent: Vec::new(),
        }
    }

    pub fn offline() -> Self {
        Self {
            connected: false,
            ..Self::online()
        }
    }

    pub fn receive(&mut self, sender_id: i64, text: &str) {
        self.inbox.push(InboundMessage {
            sender_id,
            text: heapless::String::try_from(text).expect("test message fits"),
        });
    }
}

impl RemoteChannel for MockRemote {
    fn poll(&mut self) -> Result<heapless::Vec<InboundMessage, MAX_INBOUND>, TransportFault> {
        if !self.connected {
            return Err(TransportFault::NotConnected);
        }
        if self.poll_fails {
            return Err(TransportFault::PollFailed);
        }
        let mut batch = heapless::Vec::new();
        while !self.inbox.is_empty() && !batch.is_full() {
            let message = self.inbox.remove(0);
            batch.push(message).expect("batch has room");
        }
        Ok(batch)
    }

    fn send(&mut self, text: &str) -> Result<(), TransportFault> {
        if !self.connected {
            return Err(TransportFault::NotConnected);
        }
        self.sent.push(text.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── MockConsole ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockConsole {
    pub lines: VecDeque<heapless::String<CONSOLE_LINE_LEN>>,
}

#[allow(dead_code)]
impl MockConsole {
    pub fn type_line(&mut self, line: &str) {
        self.lines
            .push_back(heapless::String::try_from(line).expect("console line fits"));
    }
}

impl ConsoleChannel for MockConsole {
    fn poll(&mut self) -> Option<heapless::String<CONSOLE_LINE_LEN>> {
        self.lines.pop_front()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub notifications: Vec<Notification>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Notification) -> bool) -> usize {
        self.notifications.iter().filter(|n| pred(n)).count()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}
