use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{DomainError, LanguageCode, TranslationRequest};
use crate::infrastructure::{CacheStats, ModelCache, ModelKey};
use crate::ports::{LoadedModel, ModelLoader, TranslationBackend};

/// Primary backend: one neural model directory per language pair.
///
/// Models live in `<base_path>/<src>-<tgt>/` and are loaded on first use,
/// then kept in the backend's cache.
pub struct MarianBackend {
    base_path: PathBuf,
    loader: Arc<dyn ModelLoader>,
    cache: ModelCache<LoadedModel>,
}

impl MarianBackend {
    pub fn new(base_path: PathBuf, loader: Arc<dyn ModelLoader>, cache: ModelCache<LoadedModel>) -> Self {
        info!(base_path = ?base_path, "MarianBackend created");
        Self {
            base_path,
            loader,
            cache,
        }
    }

    /// Directory expected to hold the model for a pair.
    pub fn model_dir(&self, source: &LanguageCode, target: &LanguageCode) -> PathBuf {
        self.base_path.join(format!("{}-{}", source, target))
    }

    /// Get the model for a pair, loading it on first request.
    pub fn resolve(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<LoadedModel, DomainError> {
        let dir = self.model_dir(source, target);
        let key = ModelKey::for_directory(&dir);
        self.cache.get_or_load(&key, || self.load_from(&dir, &key))
    }

    fn load_from(&self, dir: &Path, key: &ModelKey) -> Result<LoadedModel, DomainError> {
        if !dir.is_dir() {
            debug!(dir = ?dir, "Model directory does not exist");
            return Err(DomainError::ModelNotFound(dir.display().to_string()));
        }

        let model = self.loader.load(dir).map_err(|e| DomainError::ModelLoad {
            key: key.to_string(),
            detail: e.to_string(),
        })?;

        info!(dir = ?dir, "Loaded Marian model");
        Ok(model)
    }

    /// Run the model over `text`. Every call re-runs inference.
    pub fn translate_text(&self, text: &str, model: &LoadedModel) -> Result<String, DomainError> {
        model.generate(text)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl TranslationBackend for MarianBackend {
    fn name(&self) -> &'static str {
        "marian"
    }

    fn translate(&self, request: &TranslationRequest) -> Result<String, DomainError> {
        let model = self.resolve(&request.source, &request.target)?;
        self.translate_text(&request.text, &model).inspect_err(|e| {
            warn!(
                source = %request.source,
                target = %request.target,
                error = %e,
                "Marian inference failed"
            );
        })
    }
}
