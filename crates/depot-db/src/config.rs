//! Engine and database configuration loaded from the environment.
//!
//! Every variable is optional; unset variables fall back to the defaults of
//! [`DbConfig::new`] and [`EngineConfig::default`].
//!
//! | Variable                   | Meaning                                  |
//! |----------------------------|------------------------------------------|
//! | `DEPOT_DB_PATH`            | SQLite file (`:memory:` for in-memory)   |
//! | `DEPOT_DB_MAX_CONNECTIONS` | Pool size                                |
//! | `DEPOT_DB_BUSY_TIMEOUT_MS` | SQLite busy timeout                      |
//! | `DEPOT_LOCK_WAIT_MS`       | Bounded wait for a product's stock lock  |
//! | `DEPOT_MAX_REPLENISHMENT`  | Cap on a single compensating order       |

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::pool::DbConfig;

/// Default database file when `DEPOT_DB_PATH` is unset.
pub const DEFAULT_DB_PATH: &str = "depot.db";

/// Tunables of the order cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a unit of work waits for a product's stock lock before failing `Busy`.
    /// Default: 5 seconds
    pub lock_wait: Duration,

    /// Upper bound on the quantity of one compensating supplier order.
    /// `None` orders the full shortfall.
    pub max_replenishment_quantity: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            lock_wait: Duration::from_secs(5),
            max_replenishment_quantity: None,
        }
    }
}

impl EngineConfig {
    /// Sets the stock lock wait.
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Caps compensating orders at `max` units.
    pub fn max_replenishment_quantity(mut self, max: i64) -> Self {
        self.max_replenishment_quantity = Some(max);
        self
    }

    /// Loads engine settings from `DEPOT_LOCK_WAIT_MS` / `DEPOT_MAX_REPLENISHMENT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(ms) = parse_var::<u64>("DEPOT_LOCK_WAIT_MS")? {
            config.lock_wait = Duration::from_millis(ms);
        }

        if let Some(max) = parse_var::<i64>("DEPOT_MAX_REPLENISHMENT")? {
            if max <= 0 {
                return Err(ConfigError::InvalidValue("DEPOT_MAX_REPLENISHMENT".to_string()));
            }
            config.max_replenishment_quantity = Some(max);
        }

        Ok(config)
    }
}

impl DbConfig {
    /// Builds a database configuration from `DEPOT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("DEPOT_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let mut config = if path == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
        };

        if let Some(max) = parse_var::<u32>("DEPOT_DB_MAX_CONNECTIONS")? {
            if max == 0 {
                return Err(ConfigError::InvalidValue("DEPOT_DB_MAX_CONNECTIONS".to_string()));
            }
            config = config.max_connections(max);
        }

        if let Some(ms) = parse_var::<u64>("DEPOT_DB_BUSY_TIMEOUT_MS")? {
            config = config.busy_timeout(Duration::from_millis(ms));
        }

        Ok(config.engine(EngineConfig::from_env()?))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue(name.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
