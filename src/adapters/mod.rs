//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `console`  | ConsoleChannel     | UART stdin reader thread    |
//! | `log_sink` | NotificationSink   | Serial log output           |
//! | `remote`   | NotificationSink   | Any RemoteChannel transport |
//! |            | RemoteChannel      | Null transport              |
//! | `time`     | Clock              | ESP32 system timer          |

pub mod console;
pub mod log_sink;
pub mod remote;
pub mod time;
