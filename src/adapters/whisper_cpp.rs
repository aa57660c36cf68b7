use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::adapters::CpalRecorder;
use crate::domain::config::SpeechConfig;
use crate::domain::{AudioBuffer, DomainError, LanguageCode};
use crate::infrastructure::{ModelCache, ModelKey};
use crate::ports::SpeechRecognizer;

/// Offline speech recognizer: cpal capture + whisper.cpp transcription.
///
/// Speech models are picked through the language override table and loaded
/// once per model name.
pub struct WhisperRecognizer {
    model_dir: PathBuf,
    threads: u32,
    recorder: CpalRecorder,
    contexts: ModelCache<Arc<WhisperContext>>,
    capturing: AtomicBool,
}

/// Clears the capture flag when a capture ends, however it ends.
struct CaptureGuard<'a>(&'a AtomicBool);

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl WhisperRecognizer {
    pub fn new(config: &SpeechConfig) -> Self {
        let threads = if config.threads == 0 {
            std::thread::available_parallelism()
                .map(|p| std::cmp::max(1, p.get() as u32 - 1))
                .unwrap_or(1)
        } else {
            config.threads
        };

        info!(model_dir = ?config.model_dir, threads, "WhisperRecognizer created");

        Self {
            model_dir: config.model_dir.clone(),
            threads,
            recorder: CpalRecorder::new(None),
            contexts: ModelCache::unbounded(),
            capturing: AtomicBool::new(false),
        }
    }

    fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(format!("ggml-{}.bin", model_name))
    }

    fn load_context(&self, language: &LanguageCode) -> Result<Arc<WhisperContext>, DomainError> {
        let model_name = language.speech_model().ok_or_else(|| {
            DomainError::Capture(format!("No offline speech model for language '{}'.", language))
        })?;
        let path = self.model_path(model_name);

        self.contexts.get_or_load(&ModelKey::for_speech_model(model_name), || {
            if !path.exists() {
                return Err(DomainError::ModelNotFound(path.display().to_string()));
            }
            let ctx = WhisperContext::new_with_params(
                &path.to_string_lossy(),
                WhisperContextParameters::default(),
            )
            .map_err(|e| DomainError::ModelLoad {
                key: model_name.to_string(),
                detail: e.to_string(),
            })?;
            info!(path = ?path, "Loaded speech model");
            Ok(Arc::new(ctx))
        })
    }

    fn transcribe(
        &self,
        ctx: &WhisperContext,
        audio: &AudioBuffer,
        language: &LanguageCode,
    ) -> Result<String, DomainError> {
        if audio.is_empty() {
            return Ok(String::new());
        }

        let samples = audio.to_f32();
        let start = Instant::now();

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.threads as i32);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(Some(language.as_str()));

        let mut state = ctx
            .create_state()
            .map_err(|e| DomainError::Capture(format!("Failed to create whisper state: {}", e)))?;
        state
            .full(params, &samples)
            .map_err(|e| DomainError::Capture(format!("Recognition failed: {}", e)))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| DomainError::Capture(format!("Failed to get segment count: {}", e)))?;

        let text = (0..segments)
            .filter_map(|i| state.full_get_segment_text(i).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        debug!(
            segments,
            duration_ms = start.elapsed().as_millis() as u64,
            "Transcription complete"
        );
        Ok(text)
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn capture_offline(
        &self,
        language: &LanguageCode,
        duration: Duration,
    ) -> Result<String, DomainError> {
        if self
            .capturing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DomainError::Capture("A capture is already in progress".to_string()));
        }
        let _guard = CaptureGuard(&self.capturing);

        // Resolve the model first so a missing model fails before listening.
        let ctx = self.load_context(language)?;
        let audio = self.recorder.record(duration)?;
        self.transcribe(&ctx, &audio, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer(dir: &std::path::Path) -> WhisperRecognizer {
        WhisperRecognizer::new(&SpeechConfig {
            model_dir: dir.to_path_buf(),
            capture_seconds: 1,
            threads: 2,
        })
    }

    #[test]
    fn test_language_without_override_is_capture_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = recognizer(dir.path())
            .capture_offline(&LanguageCode::new("pl"), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, DomainError::Capture(_)));
    }

    #[test]
    fn test_missing_model_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recognizer(dir.path());
        let err = rec
            .capture_offline(&LanguageCode::new("en"), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, DomainError::ModelNotFound(_)));
        // The capture flag is released after a failure.
        assert!(!rec.capturing.load(Ordering::SeqCst));
    }

    #[test]
    fn test_model_path() {
        let rec = recognizer(std::path::Path::new("/models"));
        assert_eq!(rec.model_path("small.en"), PathBuf::from("/models/ggml-small.en.bin"));
    }
}
