use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::config::SynthesisConfig;
use crate::domain::{DomainError, LanguageCode};
use crate::ports::{SpeechRecognizer, SpeechSynthesizer};

/// Speaks text through a local text-to-speech program (espeak-ng by default).
///
/// The text is passed as the final argument; the call blocks until the
/// program exits.
pub struct CommandSynthesizer {
    command: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        info!(command = %config.command, "CommandSynthesizer created");
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&self, text: &str) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            debug!("Empty text, nothing to speak");
            return Ok(());
        }

        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| DomainError::Synthesis(format!("Failed to run {}: {}", self.command, e)))?;

        if !status.success() {
            return Err(DomainError::Synthesis(format!(
                "{} exited with {}",
                self.command, status
            )));
        }

        debug!(chars = text.chars().count(), "Spoke translated text");
        Ok(())
    }
}

/// Synthesizer used when speech output is disabled.
pub struct SilentSynthesizer;

impl SpeechSynthesizer for SilentSynthesizer {
    fn speak(&self, _text: &str) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Recognizer used when the binary was built without speech capture.
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn capture_offline(
        &self,
        _language: &LanguageCode,
        _duration: Duration,
    ) -> Result<String, DomainError> {
        Err(DomainError::Capture(
            "Offline speech capture is not available in this build (enable the `speech` feature)"
                .to_string(),
        ))
    }
}
