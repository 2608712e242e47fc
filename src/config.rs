//! Runtime settings.
//!
//! Loaded from an optional `eps-admin.toml` in the working directory, then
//! overridden by `EPS_`-prefixed environment variables (`EPS_DATABASE_PATH`,
//! `EPS_POLL_INTERVAL_SECS`, ...). Every field has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::store::{StoreOptions, DEFAULT_KEY_PREFIX, MIN_POLL_INTERVAL};

pub const CONFIG_FILE: &str = "eps-admin.toml";

/// How sale line items are tied back to inventory records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleMatching {
    /// Use the line's inventory id when it carries one, its name otherwise.
    #[default]
    IdOrName,
    /// Exact name match only, ignoring any inventory id.
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        AdminCredentials {
            username: "Admin@gmail.com".to_string(),
            password: "Admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub key_prefix: String,
    pub poll_interval_secs: u64,
    pub seed_on_open: bool,
    pub sale_matching: SaleMatching,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let credentials = AdminCredentials::default();
        AppConfig {
            database_path: PathBuf::from("eps_admin.db"),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            poll_interval_secs: 5,
            seed_on_open: true,
            sale_matching: SaleMatching::default(),
            admin_username: credentials.username,
            admin_password: credentials.password,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Loads `path` if it exists, then applies environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("EPS"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs).max(MIN_POLL_INTERVAL)
    }

    pub fn credentials(&self) -> AdminCredentials {
        AdminCredentials {
            username: self.admin_username.clone(),
            password: self.admin_password.clone(),
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key_prefix: self.key_prefix.clone(),
            poll_interval: self.poll_interval(),
            seed: self.seed_on_open,
        }
    }
}
