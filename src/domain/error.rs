use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse failure classification surfaced to callers.
///
/// Backend-level errors collapse onto `ModelNotFound` / `ModelLoadError`,
/// both of which the router treats as "try the next backend".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Expected model directory or package is absent.
    ModelNotFound,
    /// Artifact present but failed to deserialize or run.
    ModelLoadError,
    /// Every backend was tried and none produced a translation.
    NoBackendAvailable,
    /// Microphone or recognizer failure during speech input.
    CaptureError,
    /// The shell handed over a request that violates its invariants.
    InvalidRequest,
    /// Configuration, I/O or other plumbing failure.
    Internal,
}

/// Domain-level errors for Voxlate.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model {key}: {detail}")]
    ModelLoad { key: String, detail: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Language '{0}' is not installed")]
    LanguageNotInstalled(String),

    #[error("No installed package translates {from} to {to}")]
    NoTranslationPath { from: String, to: String },

    #[error("Package error: {0}")]
    Package(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),
}

impl DomainError {
    /// Classify this error for fallback and reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            DomainError::ModelNotFound(_)
            | DomainError::LanguageNotInstalled(_)
            | DomainError::NoTranslationPath { .. } => FailureKind::ModelNotFound,
            DomainError::ModelLoad { .. }
            | DomainError::Inference(_)
            | DomainError::Package(_) => FailureKind::ModelLoadError,
            DomainError::Capture(_) => FailureKind::CaptureError,
            DomainError::InvalidRequest(_) => FailureKind::InvalidRequest,
            DomainError::Config(_)
            | DomainError::Serialization(_)
            | DomainError::Io(_)
            | DomainError::Synthesis(_) => FailureKind::Internal,
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<zip::result::ZipError> for DomainError {
    fn from(err: zip::result::ZipError) -> Self {
        DomainError::Package(err.to_string())
    }
}
