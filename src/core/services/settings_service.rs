use crate::config::{Config, ConfigManager};
use crate::currency::CurrencyCode;
use crate::errors::Result;

/// User-level preferences stored in the config file.
pub struct SettingsService;

impl SettingsService {
    pub fn primary_currency(manager: &ConfigManager) -> Result<CurrencyCode> {
        Ok(manager.load()?.primary_currency)
    }

    pub fn set_primary_currency(manager: &ConfigManager, currency: CurrencyCode) -> Result<Config> {
        Self::update(manager, |config| config.primary_currency = currency)
    }

    pub fn set_display_name(manager: &ConfigManager, name: Option<String>) -> Result<Config> {
        let name = name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self::update(manager, |config| config.display_name = name)
    }

    pub fn update<F>(manager: &ConfigManager, mutator: F) -> Result<Config>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = manager.load()?;
        mutator(&mut config);
        manager.save(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn primary_currency_persists() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        SettingsService::set_primary_currency(&manager, CurrencyCode::new("EGP")).unwrap();
        assert_eq!(SettingsService::primary_currency(&manager).unwrap().as_str(), "EGP");
    }

    #[test]
    fn blank_display_name_clears_it() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = SettingsService::set_display_name(&manager, Some("  Ana ".into())).unwrap();
        assert_eq!(config.display_name.as_deref(), Some("Ana"));
        let config = SettingsService::set_display_name(&manager, Some("   ".into())).unwrap();
        assert_eq!(config.display_name, None);
    }
}
