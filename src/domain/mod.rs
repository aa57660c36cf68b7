#[cfg(feature = "speech")]
pub mod audio;
pub mod config;
pub mod error;
pub mod language;
pub mod package;
pub mod translation;

#[cfg(feature = "speech")]
pub use audio::AudioBuffer;
pub use config::AppConfig;
pub use error::{DomainError, FailureKind};
pub use language::LanguageCode;
pub use package::{InstallReport, InstalledLanguage, InstalledPackage, PackageMetadata};
pub use translation::{BackendAttempt, TranslationOutcome, TranslationRequest};
