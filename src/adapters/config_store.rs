use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, DomainError};
use crate::ports::ConfigStore;

const APP_DIR: &str = "Voxlate";
const CONFIG_FILE: &str = "config.toml";

/// TOML-based configuration store with OS-specific paths.
pub struct TomlConfigStore {
    data_dir: PathBuf,
    logs_dir: PathBuf,
}

impl TomlConfigStore {
    /// Store rooted in the OS application directories.
    pub fn new() -> Result<Self, DomainError> {
        let data_dir = dirs::config_dir()
            .map(|p| p.join(APP_DIR))
            .ok_or_else(|| {
                DomainError::Config("Could not find application data directory".to_string())
            })?;
        let logs_dir = dirs::data_local_dir()
            .map(|p| p.join(APP_DIR).join("logs"))
            .unwrap_or_else(|| data_dir.join("logs"));

        Self::create(data_dir, logs_dir)
    }

    /// Store rooted in an explicit directory (`--data-dir`, tests).
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, DomainError> {
        let logs_dir = data_dir.join("logs");
        Self::create(data_dir, logs_dir)
    }

    fn create(data_dir: PathBuf, logs_dir: PathBuf) -> Result<Self, DomainError> {
        fs::create_dir_all(&data_dir)?;
        debug!(data_dir = ?data_dir, logs_dir = ?logs_dir, "ConfigStore initialized");
        Ok(Self { data_dir, logs_dir })
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "Loading configuration");
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            info!(path = ?config_path, "Configuration loaded");
            Ok(config)
        } else {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), DomainError> {
        let config_path = self.config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&config_path, content)?;

        debug!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        self.logs_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(dir.path().to_path_buf()).unwrap();

        let config = store.load().unwrap();
        assert!(store.config_path().exists());
        assert_eq!(config.translation.package_extension, "vxpkg");
        assert!(store.packages_dir().ends_with("packages"));
        assert!(store.logs_dir().starts_with(dir.path()));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(dir.path().to_path_buf()).unwrap();

        let mut config = AppConfig::new();
        config.translation.marian_base_path = PathBuf::from("/srv/marian");
        config.translation.model_cache_capacity = 3;
        config.synthesis.enabled = false;
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.translation.marian_base_path, PathBuf::from("/srv/marian"));
        assert_eq!(loaded.translation.model_cache_capacity, 3);
        assert!(!loaded.synthesis.enabled);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(dir.path().to_path_buf()).unwrap();
        fs::write(store.config_path(), "[translation\nbroken").unwrap();

        assert!(matches!(store.load(), Err(DomainError::Config(_))));
    }
}
