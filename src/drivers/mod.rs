//! Peripheral drivers over `embedded-hal` pins and the ESP-IDF watchdog.

pub mod reed_switch;
pub mod status_led;
pub mod watchdog;

#[cfg(not(target_os = "espidf"))]
pub mod sim;
