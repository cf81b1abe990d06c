use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub copier: CopierConfig,
    pub expiry: ExpiryConfig,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = Self {
            server: ServerConfig::load()?,
            store: StoreConfig::load()?,
            copier: CopierConfig::load()?,
            expiry: ExpiryConfig::load()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.copier.validate()?;
        if self.expiry.sweep_interval_secs == 0 {
            return Err(Error::Config("EXPIRY_SWEEP_INTERVAL_SECS must be greater than 0".into()));
        }
        Ok(())
    }
}

// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub status_port: u16,
    pub status_enabled: bool,
    pub log_level: String,
}

impl ServerConfig {
    fn load() -> Result<Self> {
        Ok(Self {
            host:           get_env("SERVER_HOST", "127.0.0.1")?,
            status_port:    get_env("STATUS_PORT", "8080")?,
            status_enabled: get_env("STATUS_ENABLED", "true")?,
            log_level:      get_env("RIDES_LOG", "info")?,
        })
    }
}

// STORE
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    fn load() -> Result<Self> {
        Ok(Self {
            path:            get_env("STORE_PATH", "./data/rides.db")?,
            busy_timeout_ms: get_env("STORE_BUSY_TIMEOUT_MS", "5000")?,
        })
    }
}

// COPIER
#[derive(Debug, Clone)]
pub struct CopierConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub lookback_secs: u64,
    pub retention_secs: u64,
    pub batch_size: usize,
    pub run_timeout_secs: u64,
    pub source_collection: String,
    pub recent_collection: String,
    pub created_at_field: String,
    pub expires_at_field: String,
}

impl CopierConfig {
    fn load() -> Result<Self> {
        Ok(Self {
            enabled:           get_env("COPIER_ENABLED", "true")?,
            interval_secs:     get_env("COPIER_INTERVAL_SECS", "60")?,
            lookback_secs:     get_env("COPIER_LOOKBACK_SECS", "600")?,   // 10 minutes
            retention_secs:    get_env("COPIER_RETENTION_SECS", "600")?,  // 10 minutes
            batch_size:        get_env("COPIER_BATCH_SIZE", "500")?,      // store batch ceiling
            run_timeout_secs:  get_env("COPIER_RUN_TIMEOUT_SECS", "60")?,
            source_collection: get_env("SOURCE_COLLECTION", "ride_requests")?,
            recent_collection: get_env("RECENT_COLLECTION", "recent_ride_requests")?,
            created_at_field:  get_env("CREATED_AT_FIELD", "createdAt")?,
            expires_at_field:  get_env("EXPIRES_AT_FIELD", "expiresAt")?,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn lookback_ms(&self) -> u64 {
        self.lookback_secs.saturating_mul(1000)
    }

    pub fn retention_ms(&self) -> u64 {
        self.retention_secs.saturating_mul(1000)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("COPIER_INTERVAL_SECS", self.interval_secs),
            ("COPIER_LOOKBACK_SECS", self.lookback_secs),
            ("COPIER_RETENTION_SECS", self.retention_secs),
            ("COPIER_RUN_TIMEOUT_SECS", self.run_timeout_secs),
            ("COPIER_BATCH_SIZE", self.batch_size as u64),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", key)));
            }
        }

        let names = [
            ("SOURCE_COLLECTION", &self.source_collection),
            ("RECENT_COLLECTION", &self.recent_collection),
            ("CREATED_AT_FIELD", &self.created_at_field),
            ("EXPIRES_AT_FIELD", &self.expires_at_field),
        ];
        for (key, value) in names {
            if !is_identifier(value) {
                return Err(Error::Config(format!(
                    "{} must be a non-empty [A-Za-z0-9_] name, got '{}'",
                    key, value
                )));
            }
        }

        if self.source_collection == self.recent_collection {
            return Err(Error::Config(
                "SOURCE_COLLECTION and RECENT_COLLECTION must differ".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CopierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            lookback_secs: 600,
            retention_secs: 600,
            batch_size: 500,
            run_timeout_secs: 60,
            source_collection: "ride_requests".to_string(),
            recent_collection: "recent_ride_requests".to_string(),
            created_at_field: "createdAt".to_string(),
            expires_at_field: "expiresAt".to_string(),
        }
    }
}

// EXPIRY
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    pub sweep_enabled: bool,
    pub sweep_interval_secs: u64,
}

impl ExpiryConfig {
    fn load() -> Result<Self> {
        Ok(Self {
            sweep_enabled:       get_env("EXPIRY_SWEEP_ENABLED", "true")?,
            sweep_interval_secs: get_env("EXPIRY_SWEEP_INTERVAL_SECS", "60")?,
        })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

// --- PRIVATE HELPERS ---

fn get_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be valid, got '{}'", key, raw)))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
