//! Application core: gate domain logic behind port traits.
//!
//! This module holds the business rules for the gate controller: command
//! parsing and dispatch, status reporting and the control loop runtime.
//! Interaction with hardware and transports happens through the **port
//! traits** in [`ports`], so the whole layer runs on the host under test.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runtime;
pub mod service;
pub mod status;
