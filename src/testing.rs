//! Fakes shared by unit tests.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::adapters::TomlConfigStore;
use crate::app::AppController;
use crate::domain::{AppConfig, DomainError};
use crate::ports::{ConfigStore, LoadedModel, ModelLoader, SpeechSynthesizer, TranslationModel};

/// File whose presence makes [`FakeLoader`] fail as if the artifact were corrupt.
pub const CORRUPT_MARKER: &str = "corrupt";
/// Tab-separated `source\ttarget` phrase table read by [`FakeLoader`].
pub const PHRASES_FILE: &str = "phrases.tsv";
pub const PACKAGE_EXT: &str = crate::domain::config::DEFAULT_PACKAGE_EXTENSION;

/// Loader that counts invocations and serves phrase-table models.
#[derive(Default)]
pub struct FakeLoader {
    loads: AtomicUsize,
}

impl FakeLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for FakeLoader {
    fn load(&self, dir: &Path) -> Result<LoadedModel, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if dir.join(CORRUPT_MARKER).exists() {
            return Err(DomainError::Serialization("truncated safetensors header".to_string()));
        }

        let phrases = match fs::read_to_string(dir.join(PHRASES_FILE)) {
            Ok(content) => content
                .lines()
                .filter_map(|line| line.split_once('\t'))
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
            Err(_) => HashMap::new(),
        };

        let label = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Arc::new(PhraseModel { label, phrases }))
    }
}

/// Model translating by exact phrase lookup, tagging anything unknown.
pub struct PhraseModel {
    label: String,
    phrases: HashMap<String, String>,
}

impl TranslationModel for PhraseModel {
    fn generate(&self, text: &str) -> Result<String, DomainError> {
        Ok(self
            .phrases
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", self.label, text)))
    }
}

/// Create `<base>/<name>/` with a phrase table.
pub fn write_model_dir(base: &Path, name: &str, phrases: &[(&str, &str)]) -> PathBuf {
    let dir = base.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(PHRASES_FILE), phrase_table(phrases)).unwrap();
    dir
}

fn phrase_table(phrases: &[(&str, &str)]) -> String {
    phrases
        .iter()
        .map(|(s, t)| format!("{}\t{}\n", s, t))
        .collect()
}

/// Write a zipped package `<dir>/<from>_<to>.<extension>`.
///
/// With `nested`, files sit under a single top-level directory the way
/// distributed packages are usually built.
pub fn write_package(
    dir: &Path,
    from: &str,
    to: &str,
    extension: &str,
    nested: bool,
    phrases: &[(&str, &str)],
) -> PathBuf {
    let path = dir.join(format!("{}_{}.{}", from, to, extension));
    let prefix = if nested {
        format!("translate-{}_{}/", from, to)
    } else {
        String::new()
    };

    let metadata = format!(
        r#"{{"package_version": "1.0", "from_code": "{}", "to_code": "{}"}}"#,
        from, to
    );
    let metadata_name = format!("{}metadata.json", prefix);
    let phrases_name = format!("{}{}", prefix, PHRASES_FILE);
    let phrases = phrase_table(phrases);
    write_archive(
        &path,
        &[(metadata_name.as_str(), metadata.as_str()), (phrases_name.as_str(), phrases.as_str())],
    );

    path
}

/// Write a zip archive holding `files` as `(entry name, content)` pairs.
pub fn write_archive(path: &Path, files: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = FileOptions::default();
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Synthesizer that records what it was asked to say.
#[derive(Default)]
pub struct RecordingSynthesizer {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Synthesizer whose every call fails after recording the text.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(&self, text: &str) -> Result<(), DomainError> {
        self.spoken.lock().push(text.to_string());
        if self.fail {
            return Err(DomainError::Synthesis("audio device busy".to_string()));
        }
        Ok(())
    }
}

/// Default configuration without synthesis or file logging.
pub fn quiet_config() -> AppConfig {
    let mut config = AppConfig::new();
    config.synthesis.enabled = false;
    config.logging.file_logging = false;
    config
}

/// Controller rooted in `data_dir` that also scans `data_dir` for package
/// files, with `loader` behind both backends.
pub fn controller(data_dir: &Path, loader: Arc<FakeLoader>) -> AppController {
    let mut config = quiet_config();
    config.translation.package_source_dir = data_dir.to_path_buf();
    controller_with(data_dir, loader, config)
}

pub fn controller_with(data_dir: &Path, loader: Arc<FakeLoader>, config: AppConfig) -> AppController {
    let store = Arc::new(TomlConfigStore::with_data_dir(data_dir.to_path_buf()).unwrap());
    store.save(&config).unwrap();
    AppController::assemble(store, config, loader, None).unwrap()
}
