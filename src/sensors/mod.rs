//! Sensor drivers behind the [`ThermalSensor`](crate::app::ports::ThermalSensor) port.

pub mod ds18b20;
