use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{
    CandleMarianLoader, CommandSynthesizer, MarianBackend, PackageBackend, PackageRegistry,
    SilentSynthesizer, TomlConfigStore,
};
use crate::app::TranslationRouter;
use crate::domain::{
    AppConfig, DomainError, InstallReport, InstalledLanguage, InstalledPackage, LanguageCode,
    TranslationOutcome, TranslationRequest,
};
use crate::infrastructure::{init_logging, CacheStats, ModelCache};
use crate::ports::{
    ConfigStore, ModelLoader, SpeechRecognizer, SpeechSynthesizer, TranslationBackend,
};

/// Application controller that wires configuration, logging and backends
/// together and exposes the operations the CLI needs.
pub struct AppController {
    config: AppConfig,
    config_store: Arc<TomlConfigStore>,
    router: TranslationRouter,
    marian: Arc<MarianBackend>,
    packages: Arc<PackageBackend>,
    recognizer: Arc<dyn SpeechRecognizer>,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize the controller.
    ///
    /// `data_dir` overrides the OS configuration directory.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self, DomainError> {
        // Step 1: config store
        let config_store = Arc::new(match data_dir {
            Some(dir) => TomlConfigStore::with_data_dir(dir)?,
            None => TomlConfigStore::new()?,
        });

        // Step 2: configuration
        let config = config_store.load()?;

        // Step 3: logging
        let log_guard = init_logging(&config_store.logs_dir(), &config.logging)?;
        info!(version = env!("CARGO_PKG_VERSION"), "Voxlate starting up");

        // Step 4: backends
        let loader = Arc::new(CandleMarianLoader::new(config.translation.max_new_tokens));
        Self::assemble(config_store, config, loader, log_guard)
    }

    /// Build the backend chain from a loaded configuration.
    pub(crate) fn assemble(
        config_store: Arc<TomlConfigStore>,
        config: AppConfig,
        loader: Arc<dyn ModelLoader>,
        log_guard: Option<WorkerGuard>,
    ) -> Result<Self, DomainError> {
        let data_dir = config_store.data_dir();
        let translation = &config.translation;
        let capacity = translation.model_cache_capacity;

        let marian = Arc::new(MarianBackend::new(
            resolve_path(&data_dir, &translation.marian_base_path),
            Arc::clone(&loader),
            ModelCache::bounded(capacity),
        ));

        let install_dir = match &translation.package_install_dir {
            Some(dir) => resolve_path(&data_dir, dir),
            None => config_store.packages_dir(),
        };
        // Package files are dropped next to where the tool runs.
        let source_dir = resolve_path(&std::env::current_dir()?, &translation.package_source_dir);
        let registry = Arc::new(PackageRegistry::new(
            source_dir,
            install_dir,
            &translation.package_extension,
        ));
        let report = registry.initialize()?;
        for (path, reason) in &report.skipped {
            info!(path = ?path, reason = %reason, "Package skipped");
        }
        let packages = Arc::new(PackageBackend::new(
            registry,
            loader,
            ModelCache::bounded(capacity),
        ));

        let synthesizer: Arc<dyn SpeechSynthesizer> = if config.synthesis.enabled {
            Arc::new(CommandSynthesizer::new(&config.synthesis))
        } else {
            Arc::new(SilentSynthesizer)
        };

        let router = TranslationRouter::new(vec![
            Arc::clone(&marian) as Arc<dyn TranslationBackend>,
            Arc::clone(&packages) as Arc<dyn TranslationBackend>,
        ])
        .with_synthesizer(synthesizer);

        let recognizer = build_recognizer(&config, &data_dir);

        info!(
            backends = ?router.backend_names(),
            marian_base_path = ?marian.base_path(),
            packages = packages.registry().packages().len(),
            synthesis = config.synthesis.enabled,
            "AppController initialized"
        );

        Ok(Self {
            config,
            config_store,
            router,
            marian,
            packages,
            recognizer,
            _log_guard: log_guard,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Translate `text` between two languages given by display name or code.
    ///
    /// Invalid input is an error; a request that no backend can serve is a
    /// failed outcome.
    pub fn translate(
        &self,
        from: &str,
        to: &str,
        text: &str,
    ) -> Result<TranslationOutcome, DomainError> {
        let request = TranslationRequest::validated(
            LanguageCode::lookup(from)?,
            LanguageCode::lookup(to)?,
            text,
        )?;
        Ok(self.router.route_request(&request))
    }

    /// Capture speech in `from` and return the recognized text.
    pub fn listen(&self, from: &str, seconds: Option<u64>) -> Result<String, DomainError> {
        let language = LanguageCode::lookup(from)?;
        if language.speech_model().is_none() {
            return Err(DomainError::InvalidRequest(
                "Please select a source language supported for speech recognition.".to_string(),
            ));
        }

        let seconds = seconds.unwrap_or(self.config.speech.capture_seconds);
        if seconds == 0 {
            return Err(DomainError::InvalidRequest(
                "Capture duration must be at least one second.".to_string(),
            ));
        }

        let text = self
            .recognizer
            .capture_offline(&language, Duration::from_secs(seconds))?;
        info!(language = %language, chars = text.chars().count(), "Speech captured");
        Ok(text)
    }

    /// Languages known to the installed packages.
    pub fn installed_languages(&self) -> Vec<InstalledLanguage> {
        self.packages.registry().installed_languages()
    }

    pub fn packages(&self) -> Vec<InstalledPackage> {
        self.packages.registry().packages()
    }

    /// Install package files that appeared since startup.
    pub fn rescan(&self) -> InstallReport {
        self.packages.registry().rescan()
    }

    /// Load statistics per backend, in routing order.
    pub fn cache_stats(&self) -> Vec<(&'static str, CacheStats)> {
        vec![
            (self.marian.name(), self.marian.cache_stats()),
            (self.packages.name(), self.packages.cache_stats()),
        ]
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.router.backend_names()
    }

    pub fn package_source_dir(&self) -> PathBuf {
        self.packages.registry().source_dir().to_path_buf()
    }

    pub fn package_install_dir(&self) -> PathBuf {
        self.packages.registry().install_dir().to_path_buf()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config_store.data_dir()
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_store.config_path()
    }
}

/// `path` taken relative to `base` unless it is absolute.
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(feature = "speech")]
fn build_recognizer(config: &AppConfig, data_dir: &Path) -> Arc<dyn SpeechRecognizer> {
    let mut speech = config.speech.clone();
    speech.model_dir = resolve_path(data_dir, &speech.model_dir);
    Arc::new(crate::adapters::WhisperRecognizer::new(&speech))
}

#[cfg(not(feature = "speech"))]
fn build_recognizer(_config: &AppConfig, _data_dir: &Path) -> Arc<dyn SpeechRecognizer> {
    Arc::new(crate::adapters::UnavailableRecognizer)
}
