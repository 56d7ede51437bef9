use std::sync::Mutex;

use url::Url;

use crate::{ImageProbe, ProbeError};

/// In-memory [`ImageProbe`] answering every HEAD with a fixed outcome and
/// recording the probed URLs.
pub struct StaticProbe {
    outcome: Result<u16, ProbeError>,
    probed: Mutex<Vec<String>>,
}

impl StaticProbe {
    pub fn with_status(status: u16) -> Self {
        Self {
            outcome: Ok(status),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ProbeError) -> Self {
        Self {
            outcome: Err(err),
            probed: Mutex::new(Vec::new()),
        }
    }

    /// URLs probed so far, in call order.
    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.probed.lock().map(|p| p.len()).unwrap_or_default()
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::with_status(200)
    }
}

impl ImageProbe for StaticProbe {
    fn head_status(&self, url: &str, _proxy: &Url) -> Result<u16, ProbeError> {
        if let Ok(mut probed) = self.probed.lock() {
            probed.push(url.to_string());
        }
        self.outcome.clone()
    }
}
