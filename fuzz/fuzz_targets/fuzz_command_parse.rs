//! Fuzz target: `Command::parse` and `GateConfig::from_json`
//!
//! Feeds arbitrary UTF-8 to the command parser and the config loader and
//! asserts that neither panics, that unknown commands never exceed their
//! fixed capacity, and that an accepted config always validates.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartgate::app::commands::{Command, MAX_RAW_LEN};
use smartgate::config::GateConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    match Command::parse(text) {
        Command::Unknown(raw) => {
            assert!(raw.len() <= MAX_RAW_LEN, "unknown command overflowed");
            assert!(text.trim().starts_with(raw.as_str()), "raw must be a prefix of the input");
        }
        Command::EmergencyStop => panic!("emergency stop must not be parseable"),
        _ => {}
    }

    if let Ok(config) = GateConfig::from_json(text) {
        assert!(config.validate().is_ok(), "from_json returned an invalid config");
    }
});
