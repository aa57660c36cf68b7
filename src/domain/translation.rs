use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, FailureKind, LanguageCode};

/// Message shown when every offline backend came up empty.
pub const NO_BACKEND_MESSAGE: &str =
    "Offline translation model not found. Please check your models.";

/// A single translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub source: LanguageCode,
    pub target: LanguageCode,
    pub text: String,
}

impl TranslationRequest {
    /// Build a request without checking it.
    ///
    /// The router trusts its caller; use [`TranslationRequest::validated`]
    /// at the shell boundary.
    pub fn new(source: LanguageCode, target: LanguageCode, text: impl Into<String>) -> Self {
        Self {
            source,
            target,
            text: text.into(),
        }
    }

    /// Build a request, enforcing the shell-side invariants.
    pub fn validated(
        source: LanguageCode,
        target: LanguageCode,
        text: &str,
    ) -> Result<Self, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidRequest(
                "Please enter or speak some text to translate.".to_string(),
            ));
        }
        if source == target {
            return Err(DomainError::InvalidRequest(
                "Source and target languages must be different.".to_string(),
            ));
        }
        if !source.is_supported() || !target.is_supported() {
            return Err(DomainError::InvalidRequest(
                "Please select valid source and target languages.".to_string(),
            ));
        }
        Ok(Self::new(source, target, text))
    }
}

/// Why one backend did not produce a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendAttempt {
    pub backend: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl BackendAttempt {
    pub fn from_error(backend: &str, err: &DomainError) -> Self {
        Self {
            backend: backend.to_string(),
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

/// Result of routing a request through the backend chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationOutcome {
    Translated {
        text: String,
        backend: String,
    },
    Failed {
        kind: FailureKind,
        message: String,
        attempts: Vec<BackendAttempt>,
    },
}

impl TranslationOutcome {
    pub fn no_backend(attempts: Vec<BackendAttempt>) -> Self {
        TranslationOutcome::Failed {
            kind: FailureKind::NoBackendAvailable,
            message: NO_BACKEND_MESSAGE.to_string(),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Translated { .. })
    }

    /// Translated text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Translated { text, .. } => Some(text),
            TranslationOutcome::Failed { .. } => None,
        }
    }

    /// Name of the backend that produced the translation.
    pub fn backend(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Translated { backend, .. } => Some(backend),
            TranslationOutcome::Failed { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TranslationOutcome::Translated { .. } => None,
            TranslationOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Line suitable for showing to the user.
    pub fn user_message(&self) -> &str {
        match self {
            TranslationOutcome::Translated { text, .. } => text,
            TranslationOutcome::Failed { message, .. } => message,
        }
    }
}
