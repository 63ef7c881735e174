// src/config.rs
use std::str::FromStr;
use std::time::Duration;

use crate::{
    errors::{SparrowError, SparrowResult},
    services::expiry_sweeper::DEFAULT_EXPIRY_MINUTES,
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub firebase_url: Option<String>,
    pub firebase_auth_token: Option<String>,
    pub fcm_server_key: Option<String>,
    pub sweep_interval: Duration, // Zero disables the in-process ticker
    pub ride_expiry_minutes: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            firebase_url: None,
            firebase_auth_token: None,
            fcm_server_key: None,
            sweep_interval: Duration::from_secs(60),
            ride_expiry_minutes: DEFAULT_EXPIRY_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> SparrowResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SparrowResult<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let sweep_interval_secs: u64 = parse(&var, "SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs())?;
        let ride_expiry_minutes: f64 = parse(&var, "RIDE_EXPIRY_MINUTES", defaults.ride_expiry_minutes)?;
        if !ride_expiry_minutes.is_finite() || ride_expiry_minutes < 0.0 {
            return Err(SparrowError::InvalidConfiguration(format!(
                "RIDE_EXPIRY_MINUTES must be a non-negative number, got {}",
                ride_expiry_minutes
            )));
        }

        Ok(Self {
            bind_addr: var("SPARROW_BIND_ADDR").unwrap_or(defaults.bind_addr),
            firebase_url: var("FIREBASE_DATABASE_URL"),
            firebase_auth_token: var("FIREBASE_AUTH_TOKEN"),
            fcm_server_key: var("FCM_SERVER_KEY"),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            ride_expiry_minutes,
        })
    }
}

fn parse<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> SparrowResult<T> {
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            SparrowError::InvalidConfiguration(format!("{} has an invalid value: {}", name, raw))
        }),
        None => Ok(default),
    }
}
