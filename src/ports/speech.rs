use std::time::Duration;

use crate::domain::{DomainError, LanguageCode};

/// Port for offline speech input.
pub trait SpeechRecognizer: Send + Sync {
    /// Record from the microphone for `duration` and return the recognized
    /// text (empty if nothing was understood).
    ///
    /// Blocks for the whole capture window. Not re-entrant: a call made while
    /// another capture is running fails with a capture error.
    fn capture_offline(
        &self,
        language: &LanguageCode,
        duration: Duration,
    ) -> Result<String, DomainError>;
}

/// Port for reading translated text aloud.
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`, blocking until playback finishes.
    fn speak(&self, text: &str) -> Result<(), DomainError>;
}
