//! Reed-contact door sensor.
//!
//! A plain digital input read through `embedded_hal::digital::InputPin`.
//! Which level means "open" depends on how the contact is wired, so it is
//! configurable.  A failed read keeps the last known value: the door
//! monitor never sees a phantom transition from a bus glitch.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::SensorError;

pub struct ReedSwitch<P> {
    pin: P,
    gpio: i32,
    open_high: bool,
    last_open: bool,
    read_failures: u32,
}

impl<P: InputPin> ReedSwitch<P> {
    pub fn new(pin: P, gpio: i32, open_high: bool) -> Self {
        Self {
            pin,
            gpio,
            open_high,
            last_open: false,
            read_failures: 0,
        }
    }

    /// GPIO this contact is wired to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Read the contact.  On success the value becomes the new sticky value.
    pub fn read(&mut self) -> Result<bool, SensorError> {
        let high = self
            .pin
            .is_high()
            .map_err(|_| SensorError::GpioReadFailed)?;
        self.last_open = high == self.open_high;
        Ok(self.last_open)
    }

    /// Read the contact, falling back to the last known value on error.
    pub fn is_open(&mut self) -> bool {
        match self.read() {
            Ok(open) => open,
            Err(e) => {
                self.read_failures = self.read_failures.saturating_add(1);
                warn!(
                    "GPIO{}: {} (#{}), keeping open={}",
                    self.gpio, e, self.read_failures, self.last_open
                );
                self.last_open
            }
        }
    }

    /// Reads that failed since construction.
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }
}
