//! Gate controller configuration
//!
//! All tunable parameters for the SmartGate firmware. Defaults reproduce the
//! timings of the field-installed controller; a JSON document can override
//! any subset of them (missing fields keep their default).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    // --- Thermal safety ---
    /// Readings strictly above this trip the emergency stop (Celsius).
    pub critical_temperature_c: f32,
    /// Minimum change since the last notified reading worth reporting (Celsius).
    pub significant_delta_c: f32,

    // --- Relay sequencing ---
    /// Pause after asserting ENABLE before releasing STOP (ms).
    pub enable_settle_ms: u32,
    /// Pause after releasing STOP before asserting a drive line (ms).
    pub stop_release_settle_ms: u32,
    /// Pause after asserting STOP before dropping ENABLE (ms).
    pub stop_settle_ms: u32,
    /// Drive-line pulse width used by the self-test (ms).
    pub self_test_pulse_ms: u32,
    /// Time after which a travel is considered complete (ms).
    pub travel_time_ms: u32,

    // --- Timing ---
    /// Thermal sampling period (ms).
    pub sample_interval_ms: u32,
    /// Sensor conversion time between start and read (ms).
    pub conversion_time_ms: u32,
    /// Remote channel poll period (ms).
    pub remote_poll_interval_ms: u32,
    /// Main loop period (ms).
    pub loop_interval_ms: u32,
    /// Status LED blink half-period (ms).
    pub led_blink_interval_ms: u32,

    // --- Remote access ---
    /// Only remote messages from this sender are executed. `None` rejects
    /// every remote command.
    pub authorized_sender: Option<i64>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            // Thermal safety
            critical_temperature_c: 70.0,
            significant_delta_c: 5.0,

            // Relay sequencing
            enable_settle_ms: 100,
            stop_release_settle_ms: 50,
            stop_settle_ms: 200,
            self_test_pulse_ms: 300,
            travel_time_ms: 20_000,

            // Timing
            sample_interval_ms: 2000,
            conversion_time_ms: 750,
            remote_poll_interval_ms: 1000,
            loop_interval_ms: 100,
            led_blink_interval_ms: 500,

            authorized_sender: None,
        }
    }
}

/// Longest blocking relay settle the loop tolerates.
const MAX_SETTLE_MS: u32 = 2000;

impl GateConfig {
    /// Parse a JSON override and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Build-time override if present, defaults otherwise.
    pub fn load(json: Option<&str>) -> crate::error::Result<Self> {
        match json {
            Some(json) => Ok(Self::from_json(json)?),
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would make the interlock or the safety monitor
    /// meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(30.0..=120.0).contains(&self.critical_temperature_c) {
            return Err(ConfigError::ValidationFailed(
                "critical_temperature_c must be 30–120",
            ));
        }
        if !(self.significant_delta_c > 0.0 && self.significant_delta_c < 50.0) {
            return Err(ConfigError::ValidationFailed(
                "significant_delta_c must be between 0 and 50",
            ));
        }
        if self.enable_settle_ms > MAX_SETTLE_MS
            || self.stop_release_settle_ms > MAX_SETTLE_MS
            || self.stop_settle_ms > MAX_SETTLE_MS
            || self.self_test_pulse_ms > MAX_SETTLE_MS
        {
            return Err(ConfigError::ValidationFailed(
                "relay settle delays must be <= 2000 ms",
            ));
        }
        if self.travel_time_ms == 0 || self.travel_time_ms > 300_000 {
            return Err(ConfigError::ValidationFailed(
                "travel_time_ms must be 1–300000",
            ));
        }
        if self.loop_interval_ms == 0
            || self.remote_poll_interval_ms == 0
            || self.led_blink_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if self.sample_interval_ms <= self.conversion_time_ms {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must exceed conversion_time_ms",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be parsed.
    Corrupted,
    /// Parsed, but a value is out of range.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "configuration data corrupted"),
            Self::ValidationFailed(msg) => write!(f, "configuration validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
