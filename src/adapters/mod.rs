#[cfg(feature = "speech")]
pub mod audio_cpal;
pub mod config_store;
pub mod marian_backend;
pub mod marian_candle;
pub mod package_backend;
pub mod package_registry;
pub mod speech;
#[cfg(feature = "speech")]
pub mod whisper_cpp;

#[cfg(feature = "speech")]
pub use audio_cpal::CpalRecorder;
pub use config_store::TomlConfigStore;
pub use marian_backend::MarianBackend;
pub use marian_candle::CandleMarianLoader;
pub use package_backend::PackageBackend;
pub use package_registry::PackageRegistry;
pub use speech::{CommandSynthesizer, SilentSynthesizer, UnavailableRecognizer};
#[cfg(feature = "speech")]
pub use whisper_cpp::WhisperRecognizer;
