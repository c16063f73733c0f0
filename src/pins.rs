//! GPIO / peripheral pin assignments for the SmartGate controller board.
//!
//! Single source of truth: the binary builds its drivers from these numbers
//! and the pin objects it takes from `Peripherals` must match them.

// ---------------------------------------------------------------------------
// Gate motor relay bank (4-channel relay module, active HIGH)
// ---------------------------------------------------------------------------

/// Drives the motor in the opening direction.
pub const RELAY_OPEN_GPIO: i32 = 26;
/// Drives the motor in the closing direction.
pub const RELAY_CLOSE_GPIO: i32 = 27;
/// Hard-stop/brake line. Asserted at boot.
pub const RELAY_STOP_GPIO: i32 = 14;
/// Master enable for the drive lines.
pub const RELAY_ENABLE_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// Gate status LED (see `drivers::status_led`).
pub const STATUS_LED_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// One-wire bus for the DS18B20 motor-housing probe (4.7 kΩ pull-up).
pub const TEMP_ONEWIRE_GPIO: i32 = 4;
