use std::sync::Arc;

use tracing::debug;

use crate::adapters::PackageRegistry;
use crate::domain::{DomainError, InstalledPackage, LanguageCode, TranslationRequest};
use crate::infrastructure::{CacheStats, ModelCache, ModelKey};
use crate::ports::{LoadedModel, ModelLoader, TranslationBackend};

/// Secondary backend: translates through installed packages.
///
/// Language discovery happens once, in the registry. The model for each
/// package is loaded lazily on the first translation that needs it.
pub struct PackageBackend {
    registry: Arc<PackageRegistry>,
    loader: Arc<dyn ModelLoader>,
    cache: ModelCache<LoadedModel>,
}

impl PackageBackend {
    pub fn new(
        registry: Arc<PackageRegistry>,
        loader: Arc<dyn ModelLoader>,
        cache: ModelCache<LoadedModel>,
    ) -> Self {
        Self {
            registry,
            loader,
            cache,
        }
    }

    /// Translate `text` from `source` into `target`.
    ///
    /// Fails with `LanguageNotInstalled` when either language is unknown to
    /// the registry and `NoTranslationPath` when both are known but no
    /// package (or pair of packages) connects them.
    pub fn translate_text(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, DomainError> {
        let hops = self.registry.translation_path(source, target)?;

        let mut current = text.to_string();
        for package in &hops {
            let model = self.load_package(package)?;
            current = model.generate(&current)?;
        }

        debug!(source = %source, target = %target, hops = hops.len(), "Package translation done");
        Ok(current)
    }

    fn load_package(&self, package: &InstalledPackage) -> Result<LoadedModel, DomainError> {
        let key = ModelKey::for_package(&package.id);
        self.cache.get_or_load(&key, || {
            if !package.path.is_dir() {
                return Err(DomainError::ModelNotFound(package.path.display().to_string()));
            }
            self.loader
                .load(&package.path)
                .map_err(|e| DomainError::ModelLoad {
                    key: key.to_string(),
                    detail: e.to_string(),
                })
        })
    }

    pub fn registry(&self) -> &Arc<PackageRegistry> {
        &self.registry
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl TranslationBackend for PackageBackend {
    fn name(&self) -> &'static str {
        "package"
    }

    fn translate(&self, request: &TranslationRequest) -> Result<String, DomainError> {
        self.translate_text(&request.text, &request.source, &request.target)
    }
}
