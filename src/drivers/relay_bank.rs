//! Four-channel gate relay module (OPEN / CLOSE / STOP / ENABLE).
//!
//! ## Safety contract
//!
//! Sequencing belongs to [`GateController`](crate::gate::GateController);
//! this driver only refuses asserting a drive line when the result would
//! break the interlock. Releases (and STOP/ENABLE writes) always go through.
//!
//! A drive line that fails to release stays recorded as asserted, and the
//! bank drops ENABLE on the spot so the motor loses power regardless.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: on ESP-IDF the binary
//! hands in `PinDriver`s, on host the tests hand in recording mocks.

use embedded_hal::digital::{Error as _, OutputPin};
use log::{error, warn};

use crate::app::ports::RelayPort;
use crate::gate::{RelayLine, RelayVector};

pub struct RelayBank<P> {
    /// Indexed by `RelayLine as usize`.
    pins: [P; 4],
    vector: RelayVector,
}

impl<P: OutputPin> RelayBank<P> {
    /// Pins are not driven until the controller initialises the bank.
    pub fn new(open: P, close: P, stop: P, enable: P) -> Self {
        Self {
            pins: [open, close, stop, enable],
            vector: RelayVector::default(),
        }
    }
}

impl<P: OutputPin> RelayBank<P> {
    fn drive(&mut self, line: RelayLine, asserted: bool) -> bool {
        let pin = &mut self.pins[line as usize];
        let result = if asserted { pin.set_high() } else { pin.set_low() };
        match result {
            Ok(()) => {
                self.vector = self.vector.with(line, asserted);
                true
            }
            Err(e) => {
                error!("relay {} write failed: {:?}", line.name(), e.kind());
                false
            }
        }
    }
}

impl<P: OutputPin> RelayPort for RelayBank<P> {
    fn write(&mut self, line: RelayLine, asserted: bool) {
        if asserted && line.is_drive() {
            let next = self.vector.with(line, true);
            if !next.is_interlocked() {
                error!(
                    "relay {} refused: would break interlock ({:?})",
                    line.name(),
                    next
                );
                return;
            }
        }

        if !self.drive(line, asserted) && !asserted && line.is_drive() {
            warn!("{} stuck, cutting ENABLE", line.name());
            self.drive(RelayLine::Enable, false);
        }
    }

    fn vector(&self) -> RelayVector {
        self.vector
    }
}
