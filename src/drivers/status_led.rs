//! Single-colour status LED.
//!
//! Drives one GPIO through `embedded_hal::digital::OutputPin`.  The
//! ESP32-CAM's red LED is wired active-low; the flash LED is active-high.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P> {
    pin: P,
    active_low: bool,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Wrap `pin` and switch the LED off.
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut led = Self {
            pin,
            active_low,
            lit: true,
        };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        if on == self.lit {
            return;
        }
        let high = on != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.lit = on,
            Err(_) => warn!("Status LED: failed to drive pin {}", if high { "high" } else { "low" }),
        }
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
