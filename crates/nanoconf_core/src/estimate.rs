//! Size estimates
//!
//! Parameter count, tokens per iteration and a rough memory footprint for a
//! GPT built from the record's architecture options.

use serde::Serialize;

use crate::record::TrainConfig;

/// GPT-2 vocabulary padded up to a multiple of 64.
pub const GPT2_PADDED_VOCAB: u64 = 50304;
/// Distinct characters in the tiny shakespeare corpus.
pub const SHAKESPEARE_CHAR_VOCAB: u64 = 65;

pub fn vocab_size_for(dataset: &str) -> u64 {
    match dataset {
        "shakespeare_char" => SHAKESPEARE_CHAR_VOCAB,
        _ => GPT2_PADDED_VOCAB,
    }
}

/// Parameters of the model, excluding position embeddings. The token
/// embedding is shared with the output head and counted once.
///
/// Saturates at `u64::MAX`; validation puts no upper bound on the sizes.
pub fn param_count(config: &TrainConfig, vocab_size: u64) -> u64 {
    let c = config.n_embd;
    let bias = u64::from(config.bias);
    // attn qkv + proj, mlp fc + proj, two layer norms
    let per_layer = 12u64
        .saturating_mul(c)
        .saturating_mul(c)
        .saturating_add(2u64.saturating_mul(c))
        .saturating_add((bias * 11).saturating_mul(c));
    let final_norm = c.saturating_add(bias * c);
    vocab_size
        .saturating_mul(c)
        .saturating_add(config.n_layer.saturating_mul(per_layer))
        .saturating_add(final_norm)
}

/// Saturates at `u64::MAX`.
pub fn tokens_per_iter(config: &TrainConfig) -> u64 {
    config
        .gradient_accumulation_steps
        .saturating_mul(config.batch_size)
        .saturating_mul(config.block_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemoryTier {
    /// < 1 GB
    Small,
    /// < 8 GB
    Moderate,
    /// < 24 GB
    Large,
    Huge,
}

impl MemoryTier {
    pub fn from_mb(total_mb: f64) -> Self {
        if total_mb < 1024.0 {
            MemoryTier::Small
        } else if total_mb < 8192.0 {
            MemoryTier::Moderate
        } else if total_mb < 24576.0 {
            MemoryTier::Large
        } else {
            MemoryTier::Huge
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemoryTier::Small => "Small (< 1GB)",
            MemoryTier::Moderate => "Moderate (< 8GB)",
            MemoryTier::Large => "Large (< 24GB)",
            MemoryTier::Huge => "Huge (> 24GB)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryEstimate {
    pub model_mb: f64,
    pub activation_mb: f64,
    pub overhead_mb: f64,
    pub total_mb: f64,
    pub tier: MemoryTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeEstimate {
    pub vocab_size: u64,
    pub params: u64,
    pub tokens_per_iter: u64,
    pub memory: MemoryEstimate,
}

impl SizeEstimate {
    /// Uses the dataset's known vocabulary unless one is given.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(config: &TrainConfig, vocab_size: Option<u64>) -> Self {
        let vocab_size = vocab_size.unwrap_or_else(|| vocab_size_for(&config.dataset));
        let params = param_count(config, vocab_size);

        // Weights (4) + Gradients (4) + AdamW moments (8) = 16 bytes per param
        let model_bytes = params as f64 * 16.0;

        // Activations, f32, ~12 tensors of B*T*C kept per layer
        let activation_bytes = config.batch_size as f64
            * config.block_size as f64
            * config.n_embd as f64
            * config.n_layer as f64
            * 12.0
            * 4.0;

        let overhead_mb = 256.0;
        let model_mb = model_bytes / (1024.0 * 1024.0);
        let activation_mb = activation_bytes / (1024.0 * 1024.0);
        let total_mb = model_mb + activation_mb + overhead_mb;

        Self {
            vocab_size,
            params,
            tokens_per_iter: tokens_per_iter(config),
            memory: MemoryEstimate {
                model_mb,
                activation_mb,
                overhead_mb,
                total_mb,
                tier: MemoryTier::from_mb(total_mb),
            },
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn params_millions(&self) -> f64 {
        self.params as f64 / 1_000_000.0
    }
}
