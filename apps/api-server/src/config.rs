//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use domain::ErrorPriority;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3001)
    pub port: u16,
    /// CORS allow origin
    pub cors_allow_origin: HeaderValue,
    /// Log format
    pub log_format: LogFormat,
    /// JSON rules file; standard registry and no banned terms when unset
    pub rules_path: Option<PathBuf>,
    /// Proxy used for image reachability probes; probing is off when unset
    pub probe_proxy_url: Option<Url>,
    /// Per-request timeout for reachability probes
    pub probe_timeout: Duration,
    /// Which stage error is reported when several fail
    pub error_priority: ErrorPriority,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Port
        let port = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(3001);

        // CORS allow origin
        let cors_origin_str = var("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".into());
        let cors_allow_origin = if cors_origin_str == "*" {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(&cors_origin_str).map_err(|e| ConfigError {
                field: "CORS_ALLOW_ORIGIN",
                message: format!("Invalid header value '{}': {}", cors_origin_str, e),
            })?
        };

        // Log format
        let log_format =
            LogFormat::from_str(&var("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        // Rules file
        let rules_path = var("RULES_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        // Probe proxy
        let probe_proxy_url = match var("PROBE_PROXY_URL").filter(|s| !s.trim().is_empty()) {
            Some(raw) => {
                let url = Url::parse(raw.trim()).map_err(|e| ConfigError {
                    field: "PROBE_PROXY_URL",
                    message: format!("Invalid proxy url '{}': {}", raw, e),
                })?;
                if url.host_str().map_or(true, str::is_empty) {
                    return Err(ConfigError {
                        field: "PROBE_PROXY_URL",
                        message: format!("Proxy url '{}' has no host", raw),
                    });
                }
                Some(url)
            }
            None => None,
        };

        // Probe timeout
        let probe_timeout = match var("PROBE_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError {
                    field: "PROBE_TIMEOUT_SECS",
                    message: format!("Expected a whole number of seconds, got '{}'", raw),
                })?;
                if secs == 0 {
                    return Err(ConfigError {
                        field: "PROBE_TIMEOUT_SECS",
                        message: "Must be greater than zero".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => http_probe::DEFAULT_TIMEOUT,
        };

        // Error priority
        let error_priority = match var("ERROR_PRIORITY") {
            Some(raw) => ErrorPriority::parse(&raw).ok_or_else(|| ConfigError {
                field: "ERROR_PRIORITY",
                message: format!("Expected 'last' or 'first', got '{}'", raw),
            })?,
            None => ErrorPriority::default(),
        };

        Ok(Self {
            port,
            cors_allow_origin,
            log_format,
            rules_path,
            probe_proxy_url,
            probe_timeout,
            error_priority,
        })
    }

    /// Proxy address handed to every check; empty disables probing.
    pub fn proxy_address(&self) -> String {
        self.probe_proxy_url
            .as_ref()
            .map(|u| u.as_str().to_string())
            .unwrap_or_default()
    }

    /// Log warnings about insecure configuration.
    pub fn warn_if_insecure(&self) {
        if self.probe_proxy_url.is_none() {
            tracing::warn!(
                "PROBE_PROXY_URL not set: image reachability checks are DISABLED. \
                 Unreachable image urls will be accepted."
            );
        }
        if self.cors_allow_origin == HeaderValue::from_static("*") {
            tracing::warn!(
                "CORS_ALLOW_ORIGIN=*: any origin may call the checker. \
                 Set CORS_ALLOW_ORIGIN for browser deployments."
            );
        }
    }
}
