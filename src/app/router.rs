use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    BackendAttempt, DomainError, LanguageCode, TranslationOutcome, TranslationRequest,
};
use crate::ports::{SpeechSynthesizer, TranslationBackend};

/// Fixed-priority fallback over an ordered list of backends.
///
/// Every call starts again at the first backend; the first one to return a
/// non-empty translation wins. The router never fails: exhaustion is reported
/// as a `NoBackendAvailable` outcome.
pub struct TranslationRouter {
    backends: Vec<Arc<dyn TranslationBackend>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl TranslationRouter {
    pub fn new(backends: Vec<Arc<dyn TranslationBackend>>) -> Self {
        Self {
            backends,
            synthesizer: None,
        }
    }

    /// Speak every successful translation through `synthesizer`.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Names of the backends in the order they are tried.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Translate `text`. The caller guarantees `source != target` and that
    /// both codes come from the language table.
    pub fn route(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
        text: &str,
    ) -> TranslationOutcome {
        self.route_request(&TranslationRequest::new(source.clone(), target.clone(), text))
    }

    pub fn route_request(&self, request: &TranslationRequest) -> TranslationOutcome {
        let mut attempts = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            let name = backend.name();
            match backend.translate(request) {
                Ok(text) if !text.trim().is_empty() => {
                    info!(
                        backend = name,
                        source = %request.source,
                        target = %request.target,
                        fallbacks = attempts.len(),
                        "Translation succeeded"
                    );
                    self.speak(&text);
                    return TranslationOutcome::Translated {
                        text,
                        backend: name.to_string(),
                    };
                }
                Ok(_) => {
                    let err =
                        DomainError::Inference("backend returned an empty translation".to_string());
                    debug!(backend = name, "Empty translation, trying next backend");
                    attempts.push(BackendAttempt::from_error(name, &err));
                }
                Err(err) => {
                    debug!(backend = name, error = %err, "Backend unavailable, trying next");
                    attempts.push(BackendAttempt::from_error(name, &err));
                }
            }
        }

        warn!(
            source = %request.source,
            target = %request.target,
            attempts = attempts.len(),
            "No offline backend could translate"
        );
        TranslationOutcome::no_backend(attempts)
    }

    /// Best-effort speech output; failures never reach the caller.
    fn speak(&self, text: &str) {
        if let Some(synthesizer) = &self.synthesizer {
            if let Err(e) = synthesizer.speak(text) {
                warn!(error = %e, "Speech synthesis failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MarianBackend, PackageBackend, PackageRegistry};
    use crate::domain::FailureKind;
    use crate::infrastructure::ModelCache;
    use crate::testing::{write_model_dir, write_package, FakeLoader, RecordingSynthesizer};
    use std::path::Path;

    const EXT: &str = "vxpkg";

    fn code(c: &str) -> LanguageCode {
        LanguageCode::new(c)
    }

    struct Fixture {
        _root: tempfile::TempDir,
        marian_loader: Arc<FakeLoader>,
        package_loader: Arc<FakeLoader>,
        marian: Arc<MarianBackend>,
        synth: Arc<RecordingSynthesizer>,
        router: TranslationRouter,
    }

    /// Marian models under `<root>/marian`, package files under `<root>/pkgs`.
    fn fixture(setup: impl FnOnce(&Path, &Path)) -> Fixture {
        fixture_with(RecordingSynthesizer::new(), setup)
    }

    fn fixture_with(synth: Arc<RecordingSynthesizer>, setup: impl FnOnce(&Path, &Path)) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let marian_dir = root.path().join("marian");
        let package_dir = root.path().join("pkgs");
        std::fs::create_dir_all(&marian_dir).unwrap();
        std::fs::create_dir_all(&package_dir).unwrap();
        setup(&marian_dir, &package_dir);

        let marian_loader = FakeLoader::new();
        let package_loader = FakeLoader::new();

        let marian = Arc::new(MarianBackend::new(
            marian_dir,
            marian_loader.clone(),
            ModelCache::unbounded(),
        ));
        let registry = Arc::new(PackageRegistry::new(
            package_dir,
            root.path().join("installed"),
            EXT,
        ));
        registry.initialize().unwrap();
        let packages = Arc::new(PackageBackend::new(
            registry,
            package_loader.clone(),
            ModelCache::unbounded(),
        ));

        let router = TranslationRouter::new(vec![
            Arc::clone(&marian) as Arc<dyn TranslationBackend>,
            packages as Arc<dyn TranslationBackend>,
        ])
        .with_synthesizer(Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>);

        Fixture {
            _root: root,
            marian_loader,
            package_loader,
            marian,
            synth,
            router,
        }
    }

    #[test]
    fn test_primary_model_translates_and_speaks() {
        let f = fixture(|marian, _| {
            write_model_dir(marian, "en-hi", &[("Hello", "नमस्ते")]);
        });

        let outcome = f.router.route(&code("en"), &code("hi"), "Hello");
        assert_eq!(outcome.text(), Some("नमस्ते"));
        assert_eq!(outcome.backend(), Some("marian"));
        assert_eq!(f.synth.spoken(), vec!["नमस्ते".to_string()]);
        assert_eq!(f.package_loader.loads(), 0);
    }

    #[test]
    fn test_missing_primary_falls_back_to_packages() {
        let f = fixture(|_, pkgs| {
            write_package(pkgs, "fr", "ko", EXT, true, &[("Bonjour", "안녕하세요")]);
        });

        let outcome = f.router.route(&code("fr"), &code("ko"), "Bonjour");
        assert!(outcome.is_success());
        assert_eq!(outcome.text(), Some("안녕하세요"));
        assert_eq!(outcome.backend(), Some("package"));

        // The primary was asked exactly once and failed before loading.
        let stats = f.marian.cache_stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(f.marian_loader.loads(), 0);
    }

    #[test]
    fn test_corrupt_primary_falls_back_to_packages() {
        let f = fixture(|marian, pkgs| {
            let dir = write_model_dir(marian, "de-en", &[]);
            std::fs::write(dir.join(crate::testing::CORRUPT_MARKER), b"").unwrap();
            write_package(pkgs, "de", "en", EXT, false, &[("Hallo", "Hello")]);
        });

        let outcome = f.router.route(&code("de"), &code("en"), "Hallo");
        assert_eq!(outcome.text(), Some("Hello"));
        assert_eq!(f.marian_loader.loads(), 1);
    }

    #[test]
    fn test_exhausted_chain_reports_no_backend() {
        let f = fixture(|marian, pkgs| {
            write_model_dir(marian, "en-hi", &[]);
            write_package(pkgs, "fr", "ko", EXT, false, &[]);
        });

        let outcome = f.router.route(&code("eo"), &code("tl"), "Saluton");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::NoBackendAvailable));
        match &outcome {
            TranslationOutcome::Failed { attempts, .. } => {
                let backends: Vec<_> = attempts.iter().map(|a| a.backend.as_str()).collect();
                assert_eq!(backends, vec!["marian", "package"]);
                assert!(attempts.iter().all(|a| a.kind == FailureKind::ModelNotFound));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(f.synth.spoken().is_empty());

        // Nothing half-loaded was left behind.
        let retry = f.router.route(&code("eo"), &code("tl"), "Saluton");
        assert!(!retry.is_success());
        assert_eq!(f.marian_loader.loads(), 0);
        assert_eq!(f.package_loader.loads(), 0);
    }

    #[test]
    fn test_repeated_requests_load_primary_once() {
        let f = fixture(|marian, _| {
            write_model_dir(marian, "en-hi", &[("Hello", "नमस्ते")]);
        });

        f.router.route(&code("en"), &code("hi"), "Hello");
        f.router.route(&code("en"), &code("hi"), "Hello");
        assert_eq!(f.marian_loader.loads(), 1);
        assert_eq!(f.marian.cache_stats().hits, 1);
    }

    #[test]
    fn test_synthesis_failure_does_not_change_outcome() {
        let f = fixture_with(RecordingSynthesizer::failing(), |marian, _| {
            write_model_dir(marian, "en-hi", &[("Hello", "नमस्ते")]);
        });

        let outcome = f.router.route(&code("en"), &code("hi"), "Hello");
        assert_eq!(outcome.text(), Some("नमस्ते"));
        assert_eq!(f.synth.spoken().len(), 1);
    }

    #[test]
    fn test_empty_translation_falls_through() {
        let f = fixture(|marian, pkgs| {
            write_model_dir(marian, "en-de", &[("Hi", " ")]);
            write_package(pkgs, "en", "de", EXT, false, &[("Hi", "Hallo")]);
        });

        let outcome = f.router.route(&code("en"), &code("de"), "Hi");
        assert_eq!(outcome.text(), Some("Hallo"));
        assert_eq!(outcome.backend(), Some("package"));
    }

    #[test]
    fn test_backend_order() {
        let f = fixture(|_, _| {});
        assert_eq!(f.router.backend_names(), vec!["marian", "package"]);
    }

    #[test]
    fn test_router_without_backends_is_exhausted() {
        let router = TranslationRouter::new(Vec::new());
        let outcome = router.route(&code("en"), &code("hi"), "Hello");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::NoBackendAvailable));
    }
}
