//! CPM model-size presets

use crate::settings::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root directory holding the pretrained CPM checkpoints
pub const CHECKPOINT_ROOT: &str = "/mnt/nfs/checkpoints";

/// Model size of the CPM checkpoint being fine-tuned
///
/// Presets differ only in model shape, model-parallel split, checkpoint
/// directory, DeepSpeed settings file and run name. Training hyperparameters
/// are shared across all sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelPreset {
    /// 12 layers, hidden size 768, 12 heads
    Small,
    /// 24 layers, hidden size 1024, 16 heads
    Medium,
    /// 32 layers, hidden size 2560, 32 heads, split over 2 devices
    #[default]
    Large,
}

impl ModelPreset {
    /// Every preset, smallest first
    pub const ALL: [ModelPreset; 3] = [ModelPreset::Small, ModelPreset::Medium, ModelPreset::Large];

    /// Lowercase name used on the command line and in file names
    pub fn name(self) -> &'static str {
        match self {
            ModelPreset::Small => "small",
            ModelPreset::Medium => "medium",
            ModelPreset::Large => "large",
        }
    }

    /// Number of transformer layers
    pub fn num_layers(self) -> usize {
        match self {
            ModelPreset::Small => 12,
            ModelPreset::Medium => 24,
            ModelPreset::Large => 32,
        }
    }

    /// Hidden (embedding) size
    pub fn hidden_size(self) -> usize {
        match self {
            ModelPreset::Small => 768,
            ModelPreset::Medium => 1024,
            ModelPreset::Large => 2560,
        }
    }

    /// Number of attention heads
    pub fn num_attention_heads(self) -> usize {
        match self {
            ModelPreset::Small => 12,
            ModelPreset::Medium => 16,
            ModelPreset::Large => 32,
        }
    }

    /// Number of devices a single model replica is split across
    pub fn model_parallel_size(self) -> usize {
        match self {
            ModelPreset::Small | ModelPreset::Medium => 1,
            ModelPreset::Large => 2,
        }
    }

    /// Directory of the pretrained checkpoint, e.g. `.../CPM-large`
    pub fn checkpoint_path(self) -> PathBuf {
        PathBuf::from(CHECKPOINT_ROOT).join(format!("CPM-{}", self.name()))
    }

    /// DeepSpeed settings file, relative to the launcher directory
    pub fn deepspeed_config(self) -> PathBuf {
        PathBuf::from(format!("../ds_config/ds_finetune_{}.json", self.name()))
    }

    /// Run name passed as `--model_name`
    pub fn run_name(self) -> String {
        format!("finetune-chid-{}", self.name())
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelPreset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_str() {
        assert_eq!("small".parse::<ModelPreset>().unwrap(), ModelPreset::Small);
        assert_eq!("Medium".parse::<ModelPreset>().unwrap(), ModelPreset::Medium);
        assert_eq!(" LARGE ".parse::<ModelPreset>().unwrap(), ModelPreset::Large);
        assert_eq!(
            "xl".parse::<ModelPreset>(),
            Err(ConfigError::UnknownPreset("xl".to_string()))
        );
    }

    #[test]
    fn test_preset_display_matches_name() {
        for preset in ModelPreset::ALL {
            assert_eq!(preset.to_string(), preset.name());
            assert_eq!(preset.to_string().parse::<ModelPreset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_large_preset_file_names() {
        let preset = ModelPreset::Large;
        assert_eq!(
            preset.deepspeed_config(),
            PathBuf::from("../ds_config/ds_finetune_large.json")
        );
        assert_eq!(preset.run_name(), "finetune-chid-large");
        assert!(preset.checkpoint_path().ends_with("CPM-large"));
    }
}
