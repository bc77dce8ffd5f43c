use core::fmt::{Debug, Display};
use core::time::Duration;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "hostel-desk.toml";
pub const ENV_PREFIX: &str = "HOSTEL_DESK_";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    pub database_url: String,
    /// Upper bound for one request, drops and unassigns included.
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    /// Used when `RUST_LOG` is not set.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Config {
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

const fn default_listen_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000)
}

const fn default_action_timeout_secs() -> u64 {
    30
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
    #[error("config error: action_timeout_secs must be positive")]
    ZeroTimeout,
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Reads `hostel-desk.toml` from the working directory, then lets
/// `HOSTEL_DESK_*` environment variables override it.
pub fn get_config() -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    if config.action_timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout);
    }
    Ok(config)
}
