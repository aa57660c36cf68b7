use crate::domain::{DomainError, TranslationRequest};

/// Port for an offline translation engine.
///
/// Backends are tried in order by the router. Any error means "this backend
/// cannot serve the request" and the next one is asked.
pub trait TranslationBackend: Send + Sync {
    /// Short name used in logs and outcomes.
    fn name(&self) -> &'static str;

    /// Translate the request text, loading whatever the backend needs.
    fn translate(&self, request: &TranslationRequest) -> Result<String, DomainError>;
}
