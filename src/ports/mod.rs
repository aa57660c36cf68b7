pub mod backend;
pub mod config;
pub mod model;
pub mod speech;

pub use backend::TranslationBackend;
pub use config::ConfigStore;
pub use model::{LoadedModel, ModelLoader, TranslationModel};
pub use speech::{SpeechRecognizer, SpeechSynthesizer};
