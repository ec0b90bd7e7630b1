//! Environment-driven server configuration.

use std::{env, fmt::Display, str::FromStr};

use tracing::info;

pub struct Config {
    pub port: u16,
    pub db_path: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("FOODSHARE_PORT", "8080"),
            db_path: try_load("FOODSHARE_DB_PATH", "foodshare.db"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .unwrap_or_else(|e| panic!("Invalid {key} value: {e}"))
}
