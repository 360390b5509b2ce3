//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the Imail
//! firmware, and reads the device credentials (bot token, WiFi network).
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Namespace isolation: config lives in `imail`, secrets in `auth`.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit().
//! - The simulation backend keeps everything in a `HashMap` (dev/test only).

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::{MAX_LOOP_INTERVAL_MS, MAX_TYPING_MS, SystemConfig};
use crate::error::{Error, Result};
use log::{info, warn};

use super::utils::{is_chat_id, is_printable_ascii, is_token_secret};
use super::wifi::{ConnectivityError, validate_password, validate_ssid};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "imail";
const CONFIG_KEY: &str = "syscfg";
const CRED_NAMESPACE: &str = "auth";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

pub const BOT_TOKEN_KEY: &str = "bot_token";
pub const WIFI_SSID_KEY: &str = "wifi_ssid";
pub const WIFI_PASS_KEY: &str = "wifi_pass";

/// Capacity of a Telegram bot token (`<bot id>:<35-char secret>`).
pub const BOT_TOKEN_CAP: usize = 64;

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// Secrets the firmware needs to reach the chat service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: heapless::String<BOT_TOKEN_CAP>,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
}

// Keeps secrets out of logs.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_password", &"<redacted>")
            .finish()
    }
}

/// A bot token is `<numeric bot id>:<secret>`.
pub fn validate_bot_token(token: &str) -> core::result::Result<(), ConfigError> {
    let valid = match token.split_once(':') {
        Some((id, secret)) => {
            !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && is_token_secret(secret)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(
            "bot token must be <bot id>:<secret>",
        ))
    }
}

// ───────────────────────────────────────────────────────────────
// Config validation
// ───────────────────────────────────────────────────────────────

fn validate_config(cfg: &SystemConfig) -> core::result::Result<(), ConfigError> {
    let id = cfg.authorized_chat_id.as_str();
    if !id.is_empty() && !is_chat_id(id) {
        return Err(ConfigError::ValidationFailed(
            "authorized_chat_id must be a numeric chat id",
        ));
    }
    if cfg.device_name.is_empty() || !is_printable_ascii(&cfg.device_name) {
        return Err(ConfigError::ValidationFailed(
            "device_name must be 1–16 printable ASCII bytes",
        ));
    }
    if !(10..=MAX_LOOP_INTERVAL_MS).contains(&cfg.loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "loop_interval_ms must be 10–1000",
        ));
    }
    if !(1000..=600_000).contains(&cfg.stuck_grace_ms) {
        return Err(ConfigError::ValidationFailed(
            "stuck_grace_ms must be 1000–600000",
        ));
    }
    if !(100..=60_000).contains(&cfg.command_poll_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "command_poll_interval_ms must be 100–60000",
        ));
    }
    if cfg.notify_typing_ms > MAX_TYPING_MS || cfg.reply_typing_ms > MAX_TYPING_MS {
        return Err(ConfigError::ValidationFailed(
            "typing pauses must be at most 5000 ms",
        ));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// NvsAdapter
// ───────────────────────────────────────────────────────────────

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> core::result::Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK
                {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name (max 15 bytes).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> core::result::Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> core::result::Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and `handle` is a valid out-pointer.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: `handle` was opened above and is not used after this.
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── Credentials ───────────────────────────────────────────

    /// Load the device credentials.
    ///
    /// Each value comes from the `auth` namespace if present, otherwise
    /// from the `IMAIL_BOT_TOKEN` / `IMAIL_WIFI_SSID` /
    /// `IMAIL_WIFI_PASSWORD` build-time variables.
    pub fn load_credentials(&self) -> Result<Credentials> {
        let bot_token = self
            .read_text::<BOT_TOKEN_CAP>(BOT_TOKEN_KEY)
            .or_else(|| env_text(option_env!("IMAIL_BOT_TOKEN")))
            .ok_or(Error::Config(ConfigError::NotFound))?;
        let wifi_ssid = self
            .read_text::<32>(WIFI_SSID_KEY)
            .or_else(|| env_text(option_env!("IMAIL_WIFI_SSID")))
            .ok_or(Error::Connectivity(ConnectivityError::NoCredentials))?;
        let wifi_password = self
            .read_text::<64>(WIFI_PASS_KEY)
            .or_else(|| env_text(option_env!("IMAIL_WIFI_PASSWORD")))
            .unwrap_or_default();

        validate_bot_token(&bot_token)?;
        validate_ssid(&wifi_ssid)?;
        validate_password(&wifi_password)?;

        Ok(Credentials {
            bot_token,
            wifi_ssid,
            wifi_password,
        })
    }

    fn read_text<const N: usize>(&self, key: &str) -> Option<heapless::String<N>> {
        let mut buf = [0u8; N];
        let len = match self.read(CRED_NAMESPACE, key, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return None,
            Err(e) => {
                warn!("NvsAdapter: reading '{}' failed: {}", key, e);
                return None;
            }
        };
        let text = core::str::from_utf8(&buf[..len]).ok()?;
        heapless::String::try_from(text).ok().filter(|s| !s.is_empty())
    }
}

fn env_text<const N: usize>(value: Option<&'static str>) -> Option<heapless::String<N>> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| heapless::String::try_from(v).ok())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> core::result::Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg: SystemConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
                let key = Self::c_name(CONFIG_KEY);
                let mut size: usize = 0;

                // First call: get size
                // SAFETY: null data pointer asks NVS for the blob length only.
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr().cast(), core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                // SAFETY: `buf` holds exactly `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> core::result::Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                let key = Self::c_name(CONFIG_KEY);
                // SAFETY: `bytes` outlives the call; NVS copies the blob.
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                // SAFETY: `handle` is open read-write.
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(
        &self,
        namespace: &str,
        key: &str,
        buf: &mut [u8],
    ) -> core::result::Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key = Self::c_name(key);
                let mut size = buf.len();
                // SAFETY: `buf` has room for `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(
        &mut self,
        namespace: &str,
        key: &str,
        data: &[u8],
    ) -> core::result::Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key = Self::c_name(key);
                // SAFETY: `data` outlives the call; NVS copies the blob.
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                // SAFETY: `handle` is open read-write.
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> core::result::Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key = Self::c_name(key);
                // SAFETY: `key` is NUL-terminated.
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr().cast()) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                // SAFETY: `handle` is open read-write.
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => Ok(()),
                // Namespace never created: nothing to delete.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(()),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key = Self::c_name(key);
                // SAFETY: `key` is NUL-terminated; the type out-pointer may be null.
                let ret =
                    unsafe { nvs_find_key(handle, key.as_ptr().cast(), core::ptr::null_mut()) };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }
}
