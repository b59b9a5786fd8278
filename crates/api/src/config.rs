//! Process configuration read from the environment at start-up.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub reconcile_interval: Duration,
    pub auto_order_notify: bool,
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
    pub mail_from: String,
    pub shop_signature: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let interval_secs: u64 = parse_or(&get, "RECONCILE_INTERVAL_SECS", "300")?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RECONCILE_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            warn!("DATABASE_URL not set; data is kept in memory and lost on restart");
        }

        let mail_relay_url = get("MAIL_RELAY_URL");
        if mail_relay_url.is_none() {
            warn!("MAIL_RELAY_URL not set; supplier emails are written to the log only");
        }

        Ok(Self {
            bind_addr: parse_or(&get, "BIND_ADDR", "0.0.0.0:5001")?,
            database_url,
            reconcile_interval: Duration::from_secs(interval_secs),
            auto_order_notify: parse_or(&get, "AUTO_ORDER_NOTIFY", "true")?,
            mail_relay_url,
            mail_relay_token: get("MAIL_RELAY_TOKEN"),
            mail_from: get("MAIL_FROM").unwrap_or_else(|| "orders@kirana.local".to_string()),
            shop_signature: get("SHOP_SIGNATURE").unwrap_or_else(|| "Kirana Store".to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })
}
