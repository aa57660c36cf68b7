use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Persists the translator configuration and knows where its state lives.
pub trait ConfigStore: Send + Sync {
    /// Load configuration, writing out defaults on first run.
    fn load(&self) -> Result<AppConfig, DomainError>;

    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    fn config_path(&self) -> PathBuf;

    /// Root of all per-user state.
    fn data_dir(&self) -> PathBuf;

    fn logs_dir(&self) -> PathBuf;

    /// Default extraction directory for translation packages.
    fn packages_dir(&self) -> PathBuf {
        self.data_dir().join("packages")
    }
}
