//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements              | Connects to                 |
//! |----------------|-------------------------|-----------------------------|
//! | `hardware`     | SensorPort              | Reed contact (GPIO16)       |
//! |                | IndicatorPort           | Red on-board LED (GPIO33)   |
//! | `log_sink`     | EventSink               | Serial log output           |
//! | `nvs`          | ConfigPort, StoragePort | NVS / in-memory store       |
//! | `telegram`     | ChannelPort             | Telegram Bot API over HTTPS |
//! | `time`         | ClockPort, DelayNs      | ESP32 system timer          |
//! | `wifi`         | ConnectivityPort        | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod telegram;
pub mod time;
pub(super) mod utils;
pub mod wifi;
