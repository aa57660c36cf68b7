use std::path::Path;
use std::sync::Arc;

use crate::domain::DomainError;

/// A loaded sequence-to-sequence model bundled with its tokenizers.
///
/// Handles are shared by every translation using the same cache key, so
/// implementations must be safe to call from several threads.
pub trait TranslationModel: Send + Sync {
    /// Tokenize, generate and detokenize a single sequence.
    fn generate(&self, text: &str) -> Result<String, DomainError>;
}

/// Shared handle to a loaded model.
pub type LoadedModel = Arc<dyn TranslationModel>;

/// Port for deserializing model artifacts from a directory.
pub trait ModelLoader: Send + Sync {
    /// Load the model stored in `dir`.
    ///
    /// The caller has already checked that `dir` exists.
    fn load(&self, dir: &Path) -> Result<LoadedModel, DomainError>;
}
