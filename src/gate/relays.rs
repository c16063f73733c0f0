//! Relay line identities and the interlock rules over the four-line vector.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RelayLine {
    Open = 0,
    Close = 1,
    Stop = 2,
    Enable = 3,
}

impl RelayLine {
    pub const ALL: [Self; 4] = [Self::Open, Self::Close, Self::Stop, Self::Enable];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Stop => "STOP",
            Self::Enable => "ENABLE",
        }
    }

    /// OPEN or CLOSE.
    pub const fn is_drive(self) -> bool {
        matches!(self, Self::Open | Self::Close)
    }
}

/// Snapshot of the four relay outputs.
///
/// Two invariants hold for every vector the controller drives: `open` and
/// `close` are never both asserted, and neither drive line is asserted while
/// `enable` is released. A relay that fails to release can still leave a
/// drive line recorded as asserted with `enable` down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RelayVector {
    pub open: bool,
    pub close: bool,
    pub stop: bool,
    pub enable: bool,
}

impl RelayVector {
    /// Boot-time vector: drive lines off, brake on, enable off.
    pub const SAFE: Self = Self {
        open: false,
        close: false,
        stop: true,
        enable: false,
    };

    pub const fn get(self, line: RelayLine) -> bool {
        match line {
            RelayLine::Open => self.open,
            RelayLine::Close => self.close,
            RelayLine::Stop => self.stop,
            RelayLine::Enable => self.enable,
        }
    }

    /// The vector after driving `line` to `asserted`.
    #[must_use]
    pub const fn with(mut self, line: RelayLine, asserted: bool) -> Self {
        match line {
            RelayLine::Open => self.open = asserted,
            RelayLine::Close => self.close = asserted,
            RelayLine::Stop => self.stop = asserted,
            RelayLine::Enable => self.enable = asserted,
        }
        self
    }

    pub const fn is_interlocked(self) -> bool {
        let no_conflict = !(self.open && self.close);
        let drive_needs_enable = self.enable || (!self.open && !self.close);
        no_conflict && drive_needs_enable
    }

    /// Either drive line asserted.
    pub const fn is_driving(self) -> bool {
        self.open || self.close
    }
}
