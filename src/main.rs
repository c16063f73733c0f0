//! SmartGate Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RelayBank        Ds18b20Probe    LogNotifier    SystemClock   │
//! │  (RelayPort)      (ThermalSensor) (Sink)         (Clock)       │
//! │  QueuedConsole    NullRemote                                   │
//! │  (ConsoleChannel) (RemoteChannel)                              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              GateService (pure logic)                  │    │
//! │  │  Relay interlock · Overheat latch · Commands           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GateRuntime (scheduler-driven loop)                           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{OutputPin as _, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use log::{info, warn};

use smartgate::adapters::console::{ConsoleQueue, QueuedConsole, spawn_stdin_reader};
use smartgate::adapters::log_sink::LogNotifier;
use smartgate::adapters::remote::NullRemote;
use smartgate::adapters::time::SystemClock;
use smartgate::app::ports::Clock;
use smartgate::app::runtime::GateRuntime;
use smartgate::config::GateConfig;
use smartgate::drivers::relay_bank::RelayBank;
use smartgate::error::Error;
use smartgate::pins;
use smartgate::sensors::ds18b20::Ds18b20Probe;

/// Lines typed on the serial console, filled by the reader thread.
static CONSOLE: ConsoleQueue = ConsoleQueue::new();

/// Configuration baked in at build time via `SMARTGATE_CONFIG` (JSON).
fn load_config() -> GateConfig {
    let source = option_env!("SMARTGATE_CONFIG");
    match GateConfig::load(source) {
        Ok(cfg) if source.is_some() => {
            info!("Config: SMARTGATE_CONFIG applied");
            cfg
        }
        Ok(cfg) => {
            info!("Config: built-in defaults");
            cfg
        }
        Err(e) => {
            warn!("SMARTGATE_CONFIG rejected ({}), using defaults", e);
            GateConfig::default()
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SmartGate v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!(
        "Relays: open={} close={} stop={} enable={} | LED={} | DS18B20=GPIO{}",
        pins::RELAY_OPEN_GPIO,
        pins::RELAY_CLOSE_GPIO,
        pins::RELAY_STOP_GPIO,
        pins::RELAY_ENABLE_GPIO,
        pins::STATUS_LED_GPIO,
        pins::TEMP_ONEWIRE_GPIO,
    );

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    let loop_interval_ms = config.loop_interval_ms;

    // ── 3. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let io = peripherals.pins;

    let relays = RelayBank::new(
        PinDriver::output(io.gpio26.downgrade_output())?,
        PinDriver::output(io.gpio27.downgrade_output())?,
        PinDriver::output(io.gpio14.downgrade_output())?,
        PinDriver::output(io.gpio12.downgrade_output())?,
    );
    let mut led_pin = PinDriver::output(io.gpio5)?;

    let onewire = PinDriver::input_output_od(io.gpio4)?;
    let sensor =
        Ds18b20Probe::new(onewire, Ets, config.conversion_time_ms).map_err(Error::from)?;

    spawn_stdin_reader(&CONSOLE)?;
    let console = QueuedConsole::new(&CONSOLE);

    if config.authorized_sender.is_some() {
        warn!("Remote: authorised sender configured but no transport built in");
    }

    let clock = SystemClock::new();
    let mut runtime = GateRuntime::new(
        config,
        relays,
        FreeRtos,
        sensor,
        NullRemote,
        console,
        LogNotifier::new(),
    );

    // ── 4. Start: relays to the safe vector, probe the sensor ─
    runtime.start(clock.now_ms());
    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        runtime.run_once(clock.now_ms());

        if let Err(e) = runtime.status_led().apply(&mut led_pin) {
            warn!("status LED write failed: {:?}", e);
        }

        FreeRtos::delay_ms(loop_interval_ms);
    }
}
