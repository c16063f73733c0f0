//! Thermal safety monitor.
//!
//! The monitor owns the overheat latch. Each reading goes through two
//! independent policies, in this order:
//!
//! 1. **Threshold**: a reading strictly above the critical temperature forces
//!    an emergency stop and sets the latch. Nothing but an explicit
//!    [`ThermalMonitor::reset_latch`] clears it; cooling down does not.
//! 2. **Significant change**: while the network is up, a reading that
//!    differs from the last notified one by more than the configured delta
//!    is reported, critical or not.
//!
//! ## Sensor faults
//!
//! A failed conversion or read marks the sensor unavailable and is reported
//! once. Scheduled sampling skips an unavailable sensor; explicit operator
//! queries still try, and the first good reading restores it.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use serde::Serialize;

use crate::app::events::Notification;
use crate::app::ports::{NotificationSink, ThermalSensor};
use crate::config::GateConfig;
use crate::error::SensorFault;
use crate::gate::EmergencyStop;

/// Latched overheat flag. Gates every motion command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SafetyLatch {
    pub overheated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermalReading {
    pub celsius: f32,
    pub timestamp_ms: u64,
    /// `false` marks a failed read; `celsius` then holds the last good value.
    pub valid: bool,
}

/// Thermal safety monitor.
pub struct ThermalMonitor {
    critical_c: f32,
    significant_delta_c: f32,
    latch: SafetyLatch,
    sensor_available: bool,
    conversion_pending: bool,
    last_reading: Option<ThermalReading>,
    last_notified_c: Option<f32>,
}

impl ThermalMonitor {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            critical_c: config.critical_temperature_c,
            significant_delta_c: config.significant_delta_c,
            latch: SafetyLatch::default(),
            sensor_available: true,
            conversion_pending: false,
            last_reading: None,
            last_notified_c: None,
        }
    }

    /// Startup presence check. Returns whether the sensor answered.
    pub fn probe(&mut self, sensor: &mut impl ThermalSensor) -> bool {
        match sensor.probe() {
            Ok(()) => {
                info!("temperature sensor found");
                self.sensor_available = true;
            }
            Err(e) => {
                warn!("temperature sensor unavailable: {e}");
                self.sensor_available = false;
            }
        }
        self.sensor_available
    }

    pub fn latch(&self) -> SafetyLatch {
        self.latch
    }

    pub fn sensor_available(&self) -> bool {
        self.sensor_available
    }

    pub fn conversion_pending(&self) -> bool {
        self.conversion_pending
    }

    pub fn last_reading(&self) -> Option<ThermalReading> {
        self.last_reading
    }

    // ── Sampling ──────────────────────────────────────────────────

    /// Start a conversion. The caller reads it back with
    /// [`finish_sample`](Self::finish_sample) once the conversion time has
    /// elapsed.
    pub fn begin_sample(
        &mut self,
        sensor: &mut impl ThermalSensor,
        now_ms: u64,
        sink: &mut impl NotificationSink,
    ) -> Result<(), SensorFault> {
        match sensor.start_conversion() {
            Ok(()) => {
                self.conversion_pending = true;
                Ok(())
            }
            Err(e) => {
                self.record_fault(e, now_ms, sink);
                Err(e)
            }
        }
    }

    /// Read back a conversion started by [`begin_sample`](Self::begin_sample).
    pub fn finish_sample(
        &mut self,
        sensor: &mut impl ThermalSensor,
        now_ms: u64,
        sink: &mut impl NotificationSink,
    ) -> Result<ThermalReading, SensorFault> {
        self.conversion_pending = false;
        let celsius = match sensor.read_celsius() {
            Ok(c) if c.is_finite() => c,
            Ok(_) => {
                self.record_fault(SensorFault::OutOfRange, now_ms, sink);
                return Err(SensorFault::OutOfRange);
            }
            Err(e) => {
                self.record_fault(e, now_ms, sink);
                return Err(e);
            }
        };

        let reading = ThermalReading {
            celsius,
            timestamp_ms: now_ms,
            valid: true,
        };
        self.last_reading = Some(reading);
        if !self.sensor_available {
            self.sensor_available = true;
            info!("temperature sensor restored ({celsius:.1} °C)");
            sink.notify(&Notification::SensorRestored);
        }
        Ok(reading)
    }

    /// Blocking sample: start, wait the conversion time, read.
    pub fn sample(
        &mut self,
        sensor: &mut impl ThermalSensor,
        delay: &mut impl DelayNs,
        now_ms: u64,
        sink: &mut impl NotificationSink,
    ) -> Result<ThermalReading, SensorFault> {
        self.begin_sample(sensor, now_ms, sink)?;
        let conversion_ms = sensor.conversion_time_ms();
        delay.delay_ms(conversion_ms);
        self.finish_sample(sensor, now_ms + u64::from(conversion_ms), sink)
    }

    // ── Policies ──────────────────────────────────────────────────

    /// Apply the threshold and significant-change policies to one reading.
    pub fn evaluate(
        &mut self,
        reading: ThermalReading,
        gate: &mut impl EmergencyStop,
        sink: &mut impl NotificationSink,
        network_connected: bool,
    ) {
        let celsius = reading.celsius;
        if celsius > self.critical_c {
            let transition = gate.emergency_stop();
            if transition.is_change() {
                sink.notify(&Notification::EmergencyStop);
            }
            if !self.latch.overheated {
                self.latch.overheated = true;
                error!("OVERHEAT LATCHED at {celsius:.1} °C (limit {:.1})", self.critical_c);
                sink.notify(&Notification::Overheat { celsius });
            }
        }

        if network_connected
            && self
                .last_notified_c
                .is_none_or(|last| (celsius - last).abs() > self.significant_delta_c)
        {
            self.last_notified_c = Some(celsius);
            sink.notify(&Notification::TemperatureChanged { celsius });
        }
    }

    /// Operator acknowledgement: clear the overheat latch.
    pub fn reset_latch(&mut self, sink: &mut impl NotificationSink) {
        if self.latch.overheated {
            warn!("overheat latch cleared by operator");
        }
        self.latch.overheated = false;
        sink.notify(&Notification::LatchReset);
    }

    // ── Internal ──────────────────────────────────────────────────

    fn record_fault(&mut self, fault: SensorFault, now_ms: u64, sink: &mut impl NotificationSink) {
        self.conversion_pending = false;
        self.last_reading = Some(ThermalReading {
            celsius: self.last_reading.map_or(0.0, |r| r.celsius),
            timestamp_ms: now_ms,
            valid: false,
        });
        if self.sensor_available {
            self.sensor_available = false;
            warn!("temperature sensor fault: {fault}");
            sink.notify(&Notification::SensorFault(fault));
        }
    }
}
