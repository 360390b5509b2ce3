//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the reed switch and the door indicator LED, exposing them through
//! [`SensorPort`] and [`IndicatorPort`].  Generic over `embedded-hal` pins:
//! `PinDriver`s on the ESP32, [`SimPin`](crate::drivers::sim::SimPin)s on
//! the host.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{IndicatorPort, SensorPort};
use crate::drivers::reed_switch::ReedSwitch;
use crate::drivers::status_led::StatusLed;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<S, L> {
    reed: ReedSwitch<S>,
    indicator: StatusLed<L>,
}

impl<S: InputPin, L: OutputPin> HardwareAdapter<S, L> {
    pub fn new(reed: ReedSwitch<S>, indicator: StatusLed<L>) -> Self {
        Self { reed, indicator }
    }

    pub fn reed(&self) -> &ReedSwitch<S> {
        &self.reed
    }

    pub fn indicator(&self) -> &StatusLed<L> {
        &self.indicator
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: InputPin, L: OutputPin> SensorPort for HardwareAdapter<S, L> {
    fn door_open(&mut self) -> bool {
        self.reed.is_open()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<S: InputPin, L: OutputPin> IndicatorPort for HardwareAdapter<S, L> {
    fn set_indicator(&mut self, on: bool) {
        self.indicator.set(on);
    }
}
