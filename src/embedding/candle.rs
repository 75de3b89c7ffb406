//! Candle-based text encoder.
//!
//! Runs BERT sentence encoders locally through the HuggingFace Candle
//! framework. Requires the `encoder-candle` feature.
//!
//! # Examples
//!
//! ```no_run
//! use vitae::embedding::{CandleTextEncoder, TextEncoder};
//!
//! # fn example() -> vitae::error::Result<()> {
//! let encoder = CandleTextEncoder::new("sentence-transformers/all-MiniLM-L6-v2");
//!
//! // Weights are downloaded and loaded on the first encode.
//! let vector = encoder.encode("Senior Rust engineer")?;
//! println!("dimension: {}", vector.dimension());
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::sync::ApiBuilder;
use tokenizers::Tokenizer;
use tracing::info;

use crate::embedding::{EmbeddingVector, TextEncoder};
use crate::error::{Result, VitaeError};

/// Model weights, tokenizer, and device, loaded once at first use.
struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl LoadedModel {
    fn load(model_name: &str) -> Result<Self> {
        let device = Device::cuda_if_available(0)
            .map_err(|e| VitaeError::encoding(format!("device setup failed: {e}")))?;

        let cache_dir = std::env::var("HF_HOME")
            .or_else(|_| std::env::var("HOME").map(|home| format!("{home}/.cache/huggingface")))
            .unwrap_or_else(|_| "/tmp/huggingface".to_string());

        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.into())
            .build()
            .map_err(|e| VitaeError::encoding(format!("HF API initialization failed: {e}")))?;
        let repo = api.model(model_name.to_string());

        let config_filename = repo
            .get("config.json")
            .map_err(|e| VitaeError::encoding(format!("config download failed: {e}")))?;
        let config_str = std::fs::read_to_string(config_filename)?;
        let config: Config = serde_json::from_str(&config_str)?;

        let weights_filename = repo
            .get("model.safetensors")
            .map_err(|e| VitaeError::encoding(format!("weights download failed: {e}")))?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_filename], DType::F32, &device)
                .map_err(|e| VitaeError::encoding(format!("weight mapping failed: {e}")))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| VitaeError::encoding(format!("model load failed: {e}")))?;

        let tokenizer_filename = repo
            .get("tokenizer.json")
            .map_err(|e| VitaeError::encoding(format!("tokenizer download failed: {e}")))?;
        let tokenizer = Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| VitaeError::encoding(format!("tokenizer load failed: {e}")))?;

        let dimension = config.hidden_size;
        info!(model = model_name, dimension, "loaded candle text encoder");

        Ok(LoadedModel {
            model,
            tokenizer,
            device,
            dimension,
        })
    }
}

/// Text encoder backed by a BERT model running on Candle.
///
/// Construction is cheap; the model is downloaded (or read from the
/// HuggingFace cache) and loaded on the first [`TextEncoder::encode`] call.
/// Output vectors are mean-pooled over tokens and L2-normalized.
pub struct CandleTextEncoder {
    model_name: String,
    dimension_hint: usize,
    inner: OnceLock<LoadedModel>,
}

impl CandleTextEncoder {
    /// Create an encoder for a HuggingFace model id.
    pub fn new(model_name: &str) -> Self {
        Self::with_dimension(model_name, 384)
    }

    /// Create an encoder, declaring the expected embedding dimension.
    ///
    /// The hint is only used by [`TextEncoder::dimension`] before the first
    /// encode; after loading, the model config is authoritative.
    pub fn with_dimension(model_name: &str, dimension_hint: usize) -> Self {
        CandleTextEncoder {
            model_name: model_name.to_string(),
            dimension_hint,
            inner: OnceLock::new(),
        }
    }

    fn loaded(&self) -> Result<&LoadedModel> {
        if let Some(loaded) = self.inner.get() {
            return Ok(loaded);
        }
        let loaded = LoadedModel::load(&self.model_name)?;
        Ok(self.inner.get_or_init(|| loaded))
    }

    /// Mean pooling over token embeddings, masked by attention.
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)
            .and_then(|m| m.expand(embeddings.shape()))
            .and_then(|m| m.to_dtype(embeddings.dtype()))
            .map_err(|e| VitaeError::encoding(e.to_string()))?;

        let sum_embeddings = embeddings
            .mul(&mask_expanded)
            .and_then(|m| m.sum(1))
            .map_err(|e| VitaeError::encoding(e.to_string()))?;
        let sum_mask = mask_expanded
            .sum(1)
            .map_err(|e| VitaeError::encoding(e.to_string()))?;

        sum_embeddings
            .div(&sum_mask)
            .map_err(|e| VitaeError::encoding(e.to_string()))
    }
}

impl TextEncoder for CandleTextEncoder {
    fn encode(&self, text: &str) -> Result<EmbeddingVector> {
        let loaded = self.loaded()?;

        let encoding = loaded
            .tokenizer
            .encode(text, true)
            .map_err(|e| VitaeError::encoding(format!("tokenization failed: {e}")))?;

        let token_ids = Tensor::new(encoding.get_ids(), &loaded.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| VitaeError::encoding(e.to_string()))?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &loaded.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| VitaeError::encoding(e.to_string()))?;

        let embeddings = loaded
            .model
            .forward(&token_ids, &attention_mask, None)
            .map_err(|e| VitaeError::encoding(format!("model forward failed: {e}")))?;

        let pooled = Self::mean_pool(&embeddings, &attention_mask)?;

        let norm = pooled
            .sqr()
            .and_then(|t| t.sum_all())
            .and_then(|t| t.sqrt())
            .and_then(|t| t.to_scalar::<f32>())
            .map_err(|e| VitaeError::encoding(e.to_string()))?;

        let normalized = pooled
            .affine((1.0 / norm) as f64, 0.0)
            .map_err(|e| VitaeError::encoding(e.to_string()))?;

        let values: Vec<f32> = normalized
            .squeeze(0)
            .and_then(|t| t.to_vec1())
            .map_err(|e| VitaeError::encoding(e.to_string()))?;

        Ok(EmbeddingVector::new(
            values.into_iter().map(f64::from).collect(),
        ))
    }

    fn dimension(&self) -> usize {
        self.inner
            .get()
            .map(|loaded| loaded.dimension)
            .unwrap_or(self.dimension_hint)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
