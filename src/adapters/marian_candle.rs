use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::marian;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::domain::DomainError;
use crate::ports::{LoadedModel, ModelLoader, TranslationModel};

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const SOURCE_TOKENIZER_FILE: &str = "tokenizer.json";
const TARGET_TOKENIZER_FILE: &str = "tokenizer-target.json";

fn candle_err(context: &str) -> impl Fn(candle_core::Error) -> DomainError + '_ {
    move |e| DomainError::Inference(format!("{}: {}", context, e))
}

/// Loads Marian encoder-decoder models with candle.
///
/// Expected directory contents: `config.json`, `model.safetensors`,
/// `tokenizer.json` and optionally `tokenizer-target.json` when the target
/// vocabulary differs from the source one.
pub struct CandleMarianLoader {
    device: Device,
    max_new_tokens: usize,
}

impl CandleMarianLoader {
    pub fn new(max_new_tokens: usize) -> Self {
        Self {
            device: Device::Cpu,
            max_new_tokens: max_new_tokens.max(1),
        }
    }

    fn read_config(dir: &Path) -> Result<marian::Config, DomainError> {
        let content = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn read_tokenizer(path: &Path) -> Result<Tokenizer, DomainError> {
        Tokenizer::from_file(path).map_err(|e| {
            DomainError::Serialization(format!("Failed to read tokenizer {}: {}", path.display(), e))
        })
    }

    fn target_tokenizer_path(dir: &Path) -> PathBuf {
        let target = dir.join(TARGET_TOKENIZER_FILE);
        if target.exists() {
            target
        } else {
            dir.join(SOURCE_TOKENIZER_FILE)
        }
    }
}

impl ModelLoader for CandleMarianLoader {
    fn load(&self, dir: &Path) -> Result<LoadedModel, DomainError> {
        let config = Self::read_config(dir)?;
        let source_tokenizer = Self::read_tokenizer(&dir.join(SOURCE_TOKENIZER_FILE))?;
        let target_tokenizer = Self::read_tokenizer(&Self::target_tokenizer_path(dir))?;

        let tensors = candle_core::safetensors::load(dir.join(WEIGHTS_FILE), &self.device)
            .map_err(candle_err("Failed to read weights"))?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &self.device);
        let model = marian::MTModel::new(&config, vb)
            .map_err(candle_err("Failed to build model"))?;

        info!(
            dir = ?dir,
            vocab_size = config.vocab_size,
            encoder_layers = config.encoder_layers,
            "Marian weights loaded"
        );

        Ok(Arc::new(CandleMarianModel {
            model: Mutex::new(model),
            config,
            source_tokenizer,
            target_tokenizer,
            device: self.device.clone(),
            max_new_tokens: self.max_new_tokens,
        }))
    }
}

/// A loaded Marian model. Generation is serialized because the decoder
/// keeps a mutable key/value cache.
pub struct CandleMarianModel {
    model: Mutex<marian::MTModel>,
    config: marian::Config,
    source_tokenizer: Tokenizer,
    target_tokenizer: Tokenizer,
    device: Device,
    max_new_tokens: usize,
}

impl CandleMarianModel {
    fn encode(&self, text: &str) -> Result<Vec<u32>, DomainError> {
        let encoding = self
            .source_tokenizer
            .encode(text, true)
            .map_err(|e| DomainError::Inference(format!("Tokenization failed: {}", e)))?;
        let mut ids = encoding.get_ids().to_vec();
        if ids.last() != Some(&self.config.eos_token_id) {
            ids.push(self.config.eos_token_id);
        }
        Ok(ids)
    }

    fn is_end(&self, token: u32) -> bool {
        token == self.config.eos_token_id || token == self.config.forced_eos_token_id
    }
}

impl TranslationModel for CandleMarianModel {
    fn generate(&self, text: &str) -> Result<String, DomainError> {
        let input_ids = self.encode(text)?;
        let mut model = self.model.lock();
        model.reset_kv_cache();

        let encoder_xs = {
            let tokens = Tensor::new(input_ids.as_slice(), &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(candle_err("Failed to build input"))?;
            model
                .encoder()
                .forward(&tokens, 0)
                .map_err(candle_err("Encoder failed"))?
        };

        // Greedy decoding: no temperature, no top-p.
        let mut logits_processor = LogitsProcessor::new(0, None, None);
        let mut token_ids = vec![self.config.decoder_start_token_id];

        for step in 0..self.max_new_tokens {
            let context_size = if step >= 1 { 1 } else { token_ids.len() };
            let start_pos = token_ids.len().saturating_sub(context_size);
            let next = Tensor::new(&token_ids[start_pos..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .and_then(|input| model.decode(&input, &encoder_xs, start_pos))
                .and_then(|logits| logits.squeeze(0))
                .and_then(|logits| logits.get(logits.dim(0)? - 1))
                .and_then(|logits| logits_processor.sample(&logits))
                .map_err(candle_err("Decoder failed"))?;

            token_ids.push(next);
            if self.is_end(next) {
                break;
            }
        }

        debug!(
            input_tokens = input_ids.len(),
            output_tokens = token_ids.len(),
            "Marian generation finished"
        );

        // Skip the decoder start token; special tokens are dropped by decode.
        self.target_tokenizer
            .decode(&token_ids[1..], true)
            .map(|s| s.trim().to_string())
            .map_err(|e| DomainError::Inference(format!("Detokenization failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_config_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let loader = CandleMarianLoader::new(64);
        assert!(loader.load(dir.path()).is_err());
    }

    #[test]
    fn test_garbage_config_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let err = CandleMarianLoader::new(64).load(dir.path()).err().unwrap();
        assert!(matches!(err, DomainError::Serialization(_)));
    }

    #[test]
    fn test_target_tokenizer_falls_back_to_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CandleMarianLoader::target_tokenizer_path(dir.path())
            .ends_with(SOURCE_TOKENIZER_FILE));

        fs::write(dir.path().join(TARGET_TOKENIZER_FILE), "{}").unwrap();
        assert!(CandleMarianLoader::target_tokenizer_path(dir.path())
            .ends_with(TARGET_TOKENIZER_FILE));
    }
}
