//! Actuator drivers and peripheral helpers.

pub mod relay_bank;
pub mod status_led;
