use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    core::{runner::CatchUpPolicy, time::Clock},
    currency::CurrencyCode,
    errors::{Result, VaultError},
    projection::{ProjectionConfig, DEFAULT_HORIZON_YEARS, MAX_HORIZON_YEARS},
    utils::{app_data_dir, config_file_in, ensure_dir, write_atomic},
};

const DEFAULT_RATE_CACHE_HOURS: u32 = 24;
/// Backfill never looks further back than this many days.
pub const MAX_BACKFILL_DAYS: u32 = 366;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Currency every aggregate is converted into.
    pub primary_currency: CurrencyCode,
    /// Used when neither an override nor a stream currency resolves.
    pub fallback_currency: CurrencyCode,
    pub projection_horizon_years: u32,
    pub rate_cache_hours: u32,
    pub catch_up: CatchUpPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_currency: CurrencyCode::default(),
            fallback_currency: CurrencyCode::default(),
            projection_horizon_years: DEFAULT_HORIZON_YEARS,
            rate_cache_hours: DEFAULT_RATE_CACHE_HOURS,
            catch_up: CatchUpPolicy::default(),
            display_name: None,
        }
    }
}

impl Config {
    pub fn projection(&self, clock: &dyn Clock) -> ProjectionConfig {
        ProjectionConfig::new(clock)
            .with_horizon_years(self.projection_horizon_years)
            .with_fallback_currency(self.fallback_currency.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.primary_currency.is_empty() {
            return Err(VaultError::Config("primary currency must be set".into()));
        }
        if self.fallback_currency.is_empty() {
            return Err(VaultError::Config("fallback currency must be set".into()));
        }
        if self.projection_horizon_years == 0 {
            return Err(VaultError::Config(
                "projection horizon must be at least one year".into(),
            ));
        }
        if self.projection_horizon_years > MAX_HORIZON_YEARS {
            return Err(VaultError::Config(format!(
                "projection horizon must be at most {} years, got {}",
                MAX_HORIZON_YEARS, self.projection_horizon_years
            )));
        }
        if let CatchUpPolicy::Backfill { max_days } = self.catch_up {
            if max_days > MAX_BACKFILL_DAYS {
                return Err(VaultError::Config(format!(
                    "backfill window must be at most {} days, got {}",
                    MAX_BACKFILL_DAYS, max_days
                )));
            }
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| VaultError::Config(format!("{}: {}", self.path.display(), err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
