//! Settings for ChID fine-tuning launches
//!
//! This crate holds the immutable configuration record the launcher turns into a
//! command line:
//! - Paths to data, checkpoint, tokenizer, cache and results directories
//! - CPM model shape (layers, hidden size, heads, model-parallel split)
//! - Training hyperparameters (learning rate, warmup, batch size, epochs, seed)
//! - Launch parameters (interpreter, distributed launcher, worker count, DeepSpeed)
//!
//! # Example
//!
//! ```
//! use chid_config::{FinetuneSettings, ModelPreset};
//!
//! let settings = FinetuneSettings::preset(ModelPreset::Large);
//! assert_eq!(settings.training.batch_size, 8);
//! assert_eq!(settings.training.seed, 23333);
//! settings.validate()?;
//! # Ok::<(), chid_config::ConfigError>(())
//! ```

pub mod file;
pub mod preset;
pub mod settings;

/// Model-size presets of the CPM family
pub use preset::ModelPreset;

/// Settings record and its validation errors
pub use settings::{
    ConfigError, FinetuneSettings, LaunchSettings, ModelShape, PathSettings, TrainingHyperparams,
};
