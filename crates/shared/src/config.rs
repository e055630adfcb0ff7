//! Ledger configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Working currency of the ledger; aggregation totals are expressed in it.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// How long a store operation may wait for its lock before giving up.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// `EnvFilter` directive used when initializing tracing.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_currency() -> Currency {
    Currency::Eur
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_log_filter() -> String {
    "tally=info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            lock_timeout_ms: default_lock_timeout_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from `.env`, config files and the environment.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `TALLY__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TALLY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Lock timeout as a `Duration`.
    #[must_use]
    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }
}
