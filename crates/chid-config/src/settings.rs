//! Immutable settings record for a ChID fine-tuning launch
//!
//! The record is built once, from a [`ModelPreset`] and optionally an override
//! file, and is never mutated afterwards. Default values reproduce the original
//! CPM-large ChID run exactly.

use crate::preset::ModelPreset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Preprocessed ChID data (question/answer classification format)
pub const DATA_DIR: &str = "/data/chid/preprocessed_qa_cls/";
/// BPE tokenizer directory (30k vocabulary)
pub const TOKENIZER_PATH: &str = "bpe_3w_new/";
/// Output directory for results
pub const RESULTS_DIR: &str = "results/";
/// Cache directory for tokenized data
pub const CACHE_DIR: &str = "cache";
/// Training script, relative to the launcher directory
pub const ENTRY_POINT: &str = "../finetune_chid.py";

/// Errors raised by settings validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("hidden size {hidden_size} is not divisible by attention heads {num_attention_heads}")]
    HiddenNotDivisibleByHeads {
        hidden_size: usize,
        num_attention_heads: usize,
    },
    #[error(
        "attention heads {num_attention_heads} are not divisible by model-parallel size {model_parallel_size}"
    )]
    HeadsNotDivisibleByModelParallel {
        num_attention_heads: usize,
        model_parallel_size: usize,
    },
    #[error(
        "worker processes {nproc_per_node} are not divisible by model-parallel size {model_parallel_size}"
    )]
    WorkersNotDivisibleByModelParallel {
        nproc_per_node: usize,
        model_parallel_size: usize,
    },
    #[error("sequence length {seq_length} exceeds max position embeddings {max_position_embeddings}")]
    SequenceTooLong {
        seq_length: usize,
        max_position_embeddings: usize,
    },
    #[error("learning rate must be finite and positive, got {0}")]
    InvalidLearningRate(f64),
    #[error("warmup fraction must be within [0, 1], got {0}")]
    InvalidWarmup(f64),
    #[error("unknown model preset: {0} (expected small, medium or large)")]
    UnknownPreset(String),
}

/// Complete configuration of one fine-tuning launch
///
/// Serializes to nested JSON with `paths`, `model`, `training` and `launch`
/// sections. Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinetuneSettings {
    /// Filesystem paths passed through to the training script
    pub paths: PathSettings,
    /// Model architecture
    pub model: ModelShape,
    /// Training hyperparameters
    pub training: TrainingHyperparams,
    /// Distributed launcher parameters
    pub launch: LaunchSettings,
}

/// Filesystem paths, passed through as flag values and never opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathSettings {
    /// Preprocessed training and evaluation data
    pub data_dir: PathBuf,
    /// Pretrained checkpoint to initialize from
    pub checkpoint_path: PathBuf,
    /// Tokenizer vocabulary directory
    pub tokenizer_path: PathBuf,
    /// Where the training script writes results
    pub results_dir: PathBuf,
    /// Tokenized data cache
    pub cache_dir: PathBuf,
}

/// CPM model architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelShape {
    /// Devices a single model replica is split across
    pub model_parallel_size: usize,
    /// Number of transformer layers
    pub num_layers: usize,
    /// Hidden (embedding) size
    pub hidden_size: usize,
    /// Number of attention heads
    pub num_attention_heads: usize,
    /// Training sequence length
    pub seq_length: usize,
    /// Size of the position embedding table
    pub max_position_embeddings: usize,
    /// Vocabulary size (must match the tokenizer)
    pub vocab_size: usize,
    /// Tokenizer implementation name understood by the training script
    pub tokenizer_type: String,
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingHyperparams {
    /// Run the training loop
    pub do_train: bool,
    /// Run evaluation
    pub do_eval: bool,
    /// Peak learning rate
    pub learning_rate: f64,
    /// Fraction of steps spent in learning rate warmup
    pub warmup: f64,
    /// Batch size per data-parallel rank
    pub batch_size: usize,
    /// Number of passes over the training data
    pub epochs: usize,
    /// Random seed
    pub seed: u64,
    /// Steps between log lines
    pub log_interval: usize,
    /// Steps between evaluations
    pub eval_interval: usize,
    /// Mixed precision training
    pub fp16: bool,
    /// Recompute activations in the backward pass
    pub checkpoint_activations: bool,
}

/// Parameters of the distributed launcher invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchSettings {
    /// Python interpreter
    pub python: String,
    /// Module run with `-m` that spawns the worker processes
    pub launcher_module: String,
    /// Worker processes per node
    pub nproc_per_node: usize,
    /// Training script, relative to the launcher directory
    pub entry_point: PathBuf,
    /// Enable DeepSpeed
    pub deepspeed: bool,
    /// DeepSpeed settings file, relative to the launcher directory
    pub deepspeed_config: PathBuf,
    /// Run name
    pub model_name: String,
}

impl FinetuneSettings {
    /// Settings for a CPM model size
    ///
    /// All presets share paths (except the checkpoint) and hyperparameters.
    pub fn preset(preset: ModelPreset) -> Self {
        Self {
            paths: PathSettings {
                data_dir: PathBuf::from(DATA_DIR),
                checkpoint_path: preset.checkpoint_path(),
                tokenizer_path: PathBuf::from(TOKENIZER_PATH),
                results_dir: PathBuf::from(RESULTS_DIR),
                cache_dir: PathBuf::from(CACHE_DIR),
            },
            model: ModelShape {
                model_parallel_size: preset.model_parallel_size(),
                num_layers: preset.num_layers(),
                hidden_size: preset.hidden_size(),
                num_attention_heads: preset.num_attention_heads(),
                seq_length: 1024,
                max_position_embeddings: 1024,
                vocab_size: 30000,
                tokenizer_type: "GPT2BPETokenizer".to_string(),
            },
            training: TrainingHyperparams {
                do_train: true,
                do_eval: true,
                learning_rate: 0.00001,
                warmup: 0.1,
                batch_size: 8,
                epochs: 10,
                seed: 23333,
                log_interval: 10,
                eval_interval: 50,
                fp16: true,
                checkpoint_activations: true,
            },
            launch: LaunchSettings {
                python: "python3".to_string(),
                launcher_module: "torch.distributed.launch".to_string(),
                nproc_per_node: 4,
                entry_point: PathBuf::from(ENTRY_POINT),
                deepspeed: true,
                deepspeed_config: preset.deepspeed_config(),
                model_name: preset.run_name(),
            },
        }
    }

    /// Check the settings against the constraints of the model-parallel GPT-2
    ///
    /// Returns the first violated rule. Every preset passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let model = &self.model;
        let training = &self.training;
        let launch = &self.launch;

        let positive = [
            ("model_parallel_size", model.model_parallel_size),
            ("num_layers", model.num_layers),
            ("hidden_size", model.hidden_size),
            ("num_attention_heads", model.num_attention_heads),
            ("seq_length", model.seq_length),
            ("vocab_size", model.vocab_size),
            ("batch_size", training.batch_size),
            ("epochs", training.epochs),
            ("nproc_per_node", launch.nproc_per_node),
        ];
        if let Some((name, _)) = positive.into_iter().find(|&(_, value)| value == 0) {
            return Err(ConfigError::Zero(name));
        }

        if model.hidden_size % model.num_attention_heads != 0 {
            return Err(ConfigError::HiddenNotDivisibleByHeads {
                hidden_size: model.hidden_size,
                num_attention_heads: model.num_attention_heads,
            });
        }
        if model.num_attention_heads % model.model_parallel_size != 0 {
            return Err(ConfigError::HeadsNotDivisibleByModelParallel {
                num_attention_heads: model.num_attention_heads,
                model_parallel_size: model.model_parallel_size,
            });
        }
        if launch.nproc_per_node % model.model_parallel_size != 0 {
            return Err(ConfigError::WorkersNotDivisibleByModelParallel {
                nproc_per_node: launch.nproc_per_node,
                model_parallel_size: model.model_parallel_size,
            });
        }
        if model.seq_length > model.max_position_embeddings {
            return Err(ConfigError::SequenceTooLong {
                seq_length: model.seq_length,
                max_position_embeddings: model.max_position_embeddings,
            });
        }

        if !training.learning_rate.is_finite() || training.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate(training.learning_rate));
        }
        if !(0.0..=1.0).contains(&training.warmup) {
            return Err(ConfigError::InvalidWarmup(training.warmup));
        }

        Ok(())
    }
}

impl Default for FinetuneSettings {
    fn default() -> Self {
        Self::preset(ModelPreset::default())
    }
}
