//! Imail Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    TelegramChannel   NvsAdapter   Esp32Time   │
//! │  (Sensor+Indicator) (ChannelPort)     (Config+NVS) (Clock)     │
//! │  WifiAdapter        LogEventSink                               │
//! │  (Connectivity)     (EventSink)                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  DoorMonitor (FSM) · CommandServicer                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use core::time::Duration;
use std::cell::OnceCell;

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::sntp::EspSntp;
use log::{info, warn};

use imail::adapters::hardware::HardwareAdapter;
use imail::adapters::log_sink::LogEventSink;
use imail::adapters::nvs::NvsAdapter;
use imail::adapters::telegram::http::Supervised;
use imail::adapters::telegram::{EspHttpTransport, TelegramChannel};
use imail::adapters::time::Esp32TimeAdapter;
use imail::adapters::wifi::{ConnectivityPort, WifiAdapter};
use imail::app::ports::ConfigPort;
use imail::app::service::AppService;
use imail::config::{MAX_LOOP_INTERVAL_MS, MAX_TYPING_MS, SystemConfig};
use imail::drivers::reed_switch::ReedSwitch;
use imail::drivers::status_led::StatusLed;
use imail::drivers::watchdog::{DEFAULT_TIMEOUT_MS, Watchdog};
use imail::error::Error;
use imail::pins;

/// Per-request timeout of the Bot API client.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Retry period while WiFi or SNTP are not up yet.
const BRINGUP_RETRY_MS: u32 = 500;

// The watchdog is fed before every request and once per loop; the widest
// gap is one request, one typing pause and one loop wait.
const _: () = assert!(
    HTTP_TIMEOUT.as_millis() as u64 + MAX_TYPING_MS as u64 + MAX_LOOP_INTERVAL_MS as u64
        < DEFAULT_TIMEOUT_MS as u64
);

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Imail v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut clock = Esp32TimeAdapter::new();

    // ── 2. Load config + credentials from NVS ─────────────────
    let nvs = NvsAdapter::new().map_err(Error::from)?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    let creds = nvs.load_credentials()?;
    info!("Credentials loaded: {:?}", creds);

    // ── 3. GPIO ───────────────────────────────────────────────
    // The flash LED floats high unless driven; keep it dark.
    let mut flash = StatusLed::new(PinDriver::output(peripherals.pins.gpio4)?, false);
    flash.off();
    let indicator = StatusLed::new(PinDriver::output(peripherals.pins.gpio33)?, true);
    let reed = ReedSwitch::new(
        PinDriver::input(peripherals.pins.gpio16)?,
        pins::MAIL_SENSOR_GPIO,
        config.sensor_open_high,
    );
    let mut hw = HardwareAdapter::new(reed, indicator);
    info!(
        "GPIO: reed=GPIO{} indicator=GPIO{} flash=GPIO{}",
        pins::MAIL_SENSOR_GPIO,
        pins::STATUS_LED_GPIO,
        pins::FLASH_LED_GPIO
    );

    // ── 4. WiFi (blocking until associated) ───────────────────
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, None).map_err(Error::from)?;
    wifi.set_credentials(&creds.wifi_ssid, &creds.wifi_password)
        .map_err(Error::from)?;
    while let Err(e) = wifi.connect() {
        warn!("WiFi: {}, retrying", e);
        clock.delay_ms(BRINGUP_RETRY_MS);
    }

    // ── 5. SNTP (TLS needs wall-clock time) ──────────────────
    let _sntp = EspSntp::new_default()?;
    while !clock.wall_clock_synced() {
        clock.delay_ms(BRINGUP_RETRY_MS);
    }
    info!("SNTP: wall clock synced");

    // ── 6. Chat channel ───────────────────────────────────────
    // Armed after start(); until then the feeds are no-ops.
    let watchdog: OnceCell<Watchdog> = OnceCell::new();
    let transport = Supervised::new(EspHttpTransport::new(HTTP_TIMEOUT), || {
        if let Some(wd) = watchdog.get() {
            wd.feed();
        }
    });
    let mut channel = TelegramChannel::new(transport, &creds.bot_token);
    let mut sink = LogEventSink::new();

    // ── 7. Start: blocks until the trap door is closed ────────
    let mut app = AppService::new(config);
    app.start(&mut hw, &mut channel, &mut clock, &mut sink);

    // The boot wait above may last indefinitely; only supervise the
    // steady-state loop.
    let watchdog = watchdog.get_or_init(Watchdog::default);

    info!("System ready. Entering main loop.");

    // ── 8. Main loop ──────────────────────────────────────────
    loop {
        app.tick(&mut hw, &mut channel, &mut clock, &mut sink);
        watchdog.feed();
        clock.delay_ms(app.loop_interval_ms());
    }
}
