//! HTTPS transport for the Bot API.
//!
//! [`HttpTransport`] is the one seam between the Telegram adapter and the
//! network stack.  On the ESP32 it is backed by the ESP-IDF HTTP client
//! with the built-in certificate bundle; tests substitute a scripted mock.

use crate::app::ports::ChannelError;

/// Blocking JSON-over-HTTPS POST.
pub trait HttpTransport {
    /// POST `body` as `application/json` to `url`.
    ///
    /// The response body is appended to `response` (cleared first) and
    /// the HTTP status is returned.  Connection-level failures map to
    /// [`ChannelError::Io`] or [`ChannelError::Timeout`].
    ///
    /// A body longer than [`MAX_RESPONSE_BYTES`] yields
    /// [`ChannelError::Oversize`]; `response` then holds the first
    /// `MAX_RESPONSE_BYTES` bytes.
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        response: &mut Vec<u8>,
    ) -> Result<u16, ChannelError>;
}

/// Upper bound on a buffered response.  Eight ordinary updates fit with
/// room to spare; a batch carrying maximum-length texts may not, and the
/// channel then falls back to fetching one update at a time.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024;

// ───────────────────────────────────────────────────────────────
// Supervised transport
// ───────────────────────────────────────────────────────────────

/// Runs `feed` before every request it forwards to `inner`.
///
/// Used to feed the task watchdog: one loop iteration may issue many
/// blocking requests, but no two feeds are ever further apart than one
/// request timeout plus one typing pause.
pub struct Supervised<T, F> {
    inner: T,
    feed: F,
}

impl<T: HttpTransport, F: FnMut()> Supervised<T, F> {
    pub fn new(inner: T, feed: F) -> Self {
        Self { inner, feed }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: HttpTransport, F: FnMut()> HttpTransport for Supervised<T, F> {
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        response: &mut Vec<u8>,
    ) -> Result<u16, ChannelError> {
        (self.feed)();
        self.inner.post_json(url, body, response)
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspHttpTransport;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use esp_idf_svc::io::{Read, Write};
    use log::{info, warn};

    use super::{ChannelError, HttpTransport, MAX_RESPONSE_BYTES};

    /// ESP-IDF HTTP client over TLS, trusting the bundled CA roots.
    pub struct EspHttpTransport {
        timeout: Duration,
        conn: Option<EspHttpConnection>,
    }

    impl EspHttpTransport {
        pub fn new(timeout: Duration) -> Self {
            Self {
                timeout,
                conn: None,
            }
        }

        fn connection(&mut self) -> Result<&mut EspHttpConnection, ChannelError> {
            if self.conn.is_none() {
                let cfg = Configuration {
                    timeout: Some(self.timeout),
                    crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                    ..Default::default()
                };
                let conn = EspHttpConnection::new(&cfg).map_err(|e| {
                    warn!("HTTP: client init failed: {}", e);
                    ChannelError::Io
                })?;
                info!("HTTP: client ready");
                self.conn = Some(conn);
            }
            self.conn.as_mut().ok_or(ChannelError::Io)
        }

        fn exchange(
            conn: &mut EspHttpConnection,
            url: &str,
            body: &[u8],
            response: &mut Vec<u8>,
        ) -> Result<u16, ChannelError> {
            let len = body.len().to_string();
            let headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", len.as_str()),
            ];
            conn.initiate_request(Method::Post, url, &headers)
                .map_err(|_| ChannelError::Io)?;
            conn.write_all(body).map_err(|_| ChannelError::Io)?;
            conn.initiate_response().map_err(|_| ChannelError::Timeout)?;
            let status = conn.status();

            let mut chunk = [0u8; 512];
            loop {
                let n = conn.read(&mut chunk).map_err(|_| ChannelError::Io)?;
                if n == 0 {
                    break;
                }
                let room = MAX_RESPONSE_BYTES - response.len();
                if n > room {
                    response.extend_from_slice(&chunk[..room]);
                    return Err(ChannelError::Oversize);
                }
                response.extend_from_slice(&chunk[..n]);
            }
            Ok(status)
        }
    }

    impl HttpTransport for EspHttpTransport {
        fn post_json(
            &mut self,
            url: &str,
            body: &[u8],
            response: &mut Vec<u8>,
        ) -> Result<u16, ChannelError> {
            response.clear();
            let conn = self.connection()?;
            let result = Self::exchange(conn, url, body, response);
            if result.is_err() {
                // Start from a fresh TLS session next time.
                self.conn = None;
            }
            result
        }
    }
}
