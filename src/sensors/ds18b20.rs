//! DS18B20 motor-housing probe on a one-wire bus.
//!
//! The first device with the DS18B20 family code found by a ROM search is
//! used; any other devices on the bus are ignored. The two-phase
//! [`ThermalSensor`] contract maps onto the chip directly:
//!
//! - `probe`: ROM search
//! - `start_conversion`: Convert T (skip ROM, every sensor on the bus)
//! - `read_celsius`: scratchpad read (CRC checked by the driver)
//!
//! At 12-bit resolution the conversion takes up to 750 ms.
//!
//! The bus crates are written against `embedded-hal` 0.2, so the pin and
//! delay bounds here use the 0.2 traits.

use core::fmt::Debug;

use ds18b20::{Ds18b20, Resolution};
use embedded_hal_p2::blocking::delay::DelayUs;
use embedded_hal_p2::digital::v2::{InputPin, OutputPin};
use log::{info, warn};
use one_wire_bus::{Address, OneWire, OneWireError};

use crate::app::ports::ThermalSensor;
use crate::error::SensorFault;

const FAMILY_CODE: u8 = 0x28;

/// Datasheet range.
const MIN_C: f32 = -55.0;
const MAX_C: f32 = 125.0;

pub struct Ds18b20Probe<P, D> {
    bus: OneWire<P>,
    delay: D,
    /// ROM code of the probe, once found.
    address: Option<u64>,
    conversion_time_ms: u32,
}

impl<P, E, D> Ds18b20Probe<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    E: Debug,
    D: DelayUs<u16>,
{
    /// Take the bus pin. `conversion_time_ms` is raised to the 12-bit
    /// conversion time if set lower.
    pub fn new(pin: P, delay: D, conversion_time_ms: u32) -> Result<Self, SensorFault> {
        let bus = OneWire::new(pin).map_err(fault)?;
        let minimum = Resolution::Bits12.max_measurement_time_millis() as u32;
        Ok(Self {
            bus,
            delay,
            address: None,
            conversion_time_ms: conversion_time_ms.max(minimum),
        })
    }

    /// ROM search for the first DS18B20 on the bus.
    fn search(&mut self) -> Result<u64, SensorFault> {
        for found in self.bus.devices(false, &mut self.delay) {
            let address = found.map_err(fault)?;
            if (address.0 & 0xFF) as u8 == FAMILY_CODE {
                info!("DS18B20 at {:016X}", address.0);
                return Ok(address.0);
            }
        }
        Err(SensorFault::NotPresent)
    }

    fn device(&mut self) -> Result<Ds18b20, SensorFault> {
        let raw = match self.address {
            Some(raw) => raw,
            None => {
                let raw = self.search()?;
                self.address = Some(raw);
                raw
            }
        };
        Ds18b20::new::<E>(Address(raw)).map_err(fault)
    }
}

impl<P, E, D> ThermalSensor for Ds18b20Probe<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    E: Debug,
    D: DelayUs<u16>,
{
    fn probe(&mut self) -> Result<(), SensorFault> {
        self.address = None;
        self.device().map(|_| ())
    }

    fn start_conversion(&mut self) -> Result<(), SensorFault> {
        self.device()?;
        ds18b20::start_simultaneous_temp_measurement(&mut self.bus, &mut self.delay)
            .map_err(fault)
    }

    fn read_celsius(&mut self) -> Result<f32, SensorFault> {
        let device = self.device()?;
        let data = device
            .read_data(&mut self.bus, &mut self.delay)
            .map_err(fault)?;
        if (MIN_C..=MAX_C).contains(&data.temperature) {
            Ok(data.temperature)
        } else {
            Err(SensorFault::OutOfRange)
        }
    }

    fn conversion_time_ms(&self) -> u32 {
        self.conversion_time_ms
    }
}

fn fault<E: Debug>(e: OneWireError<E>) -> SensorFault {
    warn!("one-wire: {:?}", e);
    match e {
        OneWireError::BusNotHigh => SensorFault::NotPresent,
        _ => SensorFault::ReadFailed,
    }
}
