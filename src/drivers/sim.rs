//! Host-side GPIO simulation.
//!
//! [`SimPin`] implements both `InputPin` and `OutputPin` over a shared
//! level, so a test can hold one clone and drive or inspect the pin while
//! a driver owns another.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

#[derive(Debug, Clone, Default)]
pub struct SimPin {
    high: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        let pin = Self::default();
        pin.high.set(high);
        pin
    }

    /// Drive the simulated input level.
    pub fn drive(&self, high: bool) {
        self.high.set(high);
    }

    /// Level last written by a driver.
    pub fn is_set_high(&self) -> bool {
        self.high.get()
    }

    /// Make every read (and write) fail until cleared.
    pub fn fail_reads(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self) -> Result<(), ErrorKind> {
        if self.failing.get() {
            Err(ErrorKind::Other)
        } else {
            Ok(())
        }
    }
}

impl ErrorType for SimPin {
    type Error = ErrorKind;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.high.set(true);
        Ok(())
    }
}
