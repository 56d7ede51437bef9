//! http-probe — HTTP reachability adapter for image references.
//!
//! Purpose
//! - Implement the `ImageProbe` port from the `domain` crate by issuing a
//!   HEAD request for each referenced image, routed through a proxy.
//! - Bound every request with a timeout so a slow host cannot hold a caller.
//!
//! API
//! - `HttpImageProbe::new(timeout)` (or `default()` for a 10 second timeout)
//! - `ImageProbe::head_status(url, proxy)` → `Result<u16, ProbeError>`
//!
//! Notes
//! - Uses blocking networking via `reqwest::blocking`; async callers must run
//!   checks on a blocking thread (e.g. `tokio::task::spawn_blocking`).
//! - Clients are cached per proxy address for the lifetime of the probe.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use domain::{ImageProbe, ProbeError};
use reqwest::blocking::Client;
use tracing::{debug, trace};
use url::Url;

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reachability probe backed by `reqwest`.
pub struct HttpImageProbe {
    timeout: Duration,
    clients: Mutex<HashMap<String, Client>>,
}

impl HttpImageProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client_for(&self, proxy: &Url) -> Result<Client, ProbeError> {
        let key = proxy.as_str().to_string();
        // Check cache first; building a client is comparatively expensive.
        if let Some(client) = self.clients.lock().ok().and_then(|c| c.get(&key).cloned()) {
            return Ok(client);
        }

        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ProbeError::InvalidProxy(e.to_string()))?;
        let client = Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        if let Ok(mut cache) = self.clients.lock() {
            cache.insert(key, client.clone());
        }
        Ok(client)
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ImageProbe for HttpImageProbe {
    fn head_status(&self, url: &str, proxy: &Url) -> Result<u16, ProbeError> {
        let client = self.client_for(proxy)?;
        trace!(%url, proxy = %proxy, "http-probe: HEAD");
        let resp = client.head(url).send().map_err(|e| {
            debug!(%url, err = %e, "http-probe: request failed");
            ProbeError::Transport(e.to_string())
        })?;
        let status = resp.status().as_u16();
        debug!(%url, status, "http-probe: HEAD done");
        Ok(status)
    }
}
