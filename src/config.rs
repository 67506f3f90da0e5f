//! Gateway Configuration
//!
//! Endpoints and runtime switches, read from the environment.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:4000/graphql";
pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:4000/upload";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_SIGN_IN_PATH: &str = "/signin";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Configuration for the dispatch core and the relay server
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// GraphQL endpoint every trusted dispatch posts to
    pub backend_url: String,
    /// Base of the cover/manuscript upload endpoints
    pub upload_base_url: String,
    /// Same-origin relay used by untrusted dispatches
    pub relay_url: String,
    /// Where unauthenticated callers are sent
    pub sign_in_path: String,
    /// Listen address of the relay server
    pub bind_addr: String,
    pub connect_timeout: Option<Duration>,
    /// Export spans over OTLP in addition to the fmt layer
    pub otlp: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_URL.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            connect_timeout: None,
            otlp: false,
        }
    }
}

impl GatewayConfig {
    /// Load from the process environment, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup; `from_env` with the environment swapped out.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let url = |name: &'static str, default: String| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { name }),
                Some(value) => Ok(value.trim().to_string()),
                None => Ok(default),
            }
        };

        let connect_timeout = match lookup("QAREE_CONNECT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "QAREE_CONNECT_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let otlp = match lookup("QAREE_OTLP") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid { name: "QAREE_OTLP", value: raw.clone() });
                }
            },
            None => false,
        };

        let sign_in_path = url("QAREE_SIGN_IN_PATH", defaults.sign_in_path)?;
        if !sign_in_path.starts_with('/') {
            return Err(ConfigError::Invalid { name: "QAREE_SIGN_IN_PATH", value: sign_in_path });
        }

        Ok(Self {
            backend_url: url("QAREE_BACKEND_URL", defaults.backend_url)?,
            upload_base_url: url("QAREE_UPLOAD_URL", defaults.upload_base_url)?,
            relay_url: url("QAREE_RELAY_URL", defaults.relay_url)?,
            sign_in_path,
            bind_addr: url("QAREE_BIND_ADDR", defaults.bind_addr)?,
            connect_timeout,
            otlp,
        })
    }
}
