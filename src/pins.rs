//! GPIO pin assignments for the ESP32-CAM (AI-Thinker) board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Digital input: reed contact on the mailbox trap door.
/// Level meaning "open" is `SystemConfig::sensor_open_high`.
pub const MAIL_SENSOR_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// LEDs
// ---------------------------------------------------------------------------

/// Camera flash LED.  Forced off at boot; it shares the SD-card bus and
/// floats high otherwise.
pub const FLASH_LED_GPIO: i32 = 4;
/// Red on-board LED (active LOW), lit while the trap door is open.
pub const STATUS_LED_GPIO: i32 = 33;
