//! Inbound commands and the text vocabulary that produces them.
//!
//! The remote channel and the serial console both deliver free text. It is
//! normalised here into one [`Command`] set so the
//! [`GateService`](super::service::GateService) never sees raw strings.
//!
//! Normalisation: surrounding whitespace is trimmed, the text is lowercased,
//! one leading `/` is dropped, and a `@botname` suffix on a slash command is
//! ignored (`/open@gate_bot` → `open`).

use heapless::String;

/// Longest raw text kept for an unrecognised command.
pub const MAX_RAW_LEN: usize = 64;

/// Commands the dispatcher routes into the gate core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Stop,
    /// Raised internally by the thermal monitor. Never parsed from text.
    EmergencyStop,
    ResetSafety,
    QueryStatus,
    QueryTemperature,
    SelfTest,
    Help,
    /// Anything else, truncated to [`MAX_RAW_LEN`] bytes.
    Unknown(String<MAX_RAW_LEN>),
}

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Remote { sender_id: i64 },
    Console,
}

/// What the dispatcher did with one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Routed to its handler.
    Executed(Command),
    /// Refused by the overheat latch (or a travel in progress, for the
    /// self-test).
    Blocked(Command),
    /// Dropped before parsing: unauthorised sender, or not user-issuable.
    Rejected,
}

impl Command {
    /// Parse operator text. Never fails: unknown text becomes
    /// [`Command::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();
        let word = match lowered.strip_prefix('/') {
            Some(rest) => rest.split('@').next().unwrap_or(rest),
            None => lowered.as_str(),
        };

        match word {
            "open" | "o" | "открыть" | "открой" => Self::Open,
            "close" | "c" | "закрыть" | "закрой" => Self::Close,
            "stop" | "s" | "стоп" | "остановить" => Self::Stop,
            "temp" | "t" | "temperature" | "температура" | "т" => Self::QueryTemperature,
            "status" | "статус" => Self::QueryStatus,
            "test" | "тест" => Self::SelfTest,
            "reset" | "r" | "сброс" => Self::ResetSafety,
            "help" | "start" | "h" | "?" | "помощь" => Self::Help,
            _ => Self::Unknown(truncate(trimmed)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
            Self::EmergencyStop => "emergency-stop",
            Self::ResetSafety => "reset",
            Self::QueryStatus => "status",
            Self::QueryTemperature => "temperature",
            Self::SelfTest => "test",
            Self::Help => "help",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Copy as many whole characters as fit.
fn truncate(text: &str) -> String<MAX_RAW_LEN> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
