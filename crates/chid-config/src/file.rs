//! JSON override files
//!
//! An override file has the same nested shape as [`FinetuneSettings`] but may
//! name any subset of keys:
//!
//! ```json
//! { "training": { "batch_size": 16, "seed": 42 } }
//! ```
//!
//! Named keys replace the values of the base settings, everything else is
//! kept.

use crate::settings::FinetuneSettings;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

impl FinetuneSettings {
    /// Load an override file and apply it on top of `base`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or names
    /// a key the settings record does not have.
    ///
    /// # Example
    /// ```no_run
    /// use chid_config::FinetuneSettings;
    /// use std::path::Path;
    ///
    /// let base = FinetuneSettings::default();
    /// let settings = FinetuneSettings::from_file(Path::new("overrides.json"), &base)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file(path: &Path, base: &FinetuneSettings) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let overrides: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        base.with_overrides(overrides)
            .with_context(|| format!("Invalid settings in config file: {:?}", path))
    }

    /// Apply a JSON override document, returning a new record
    pub fn with_overrides(&self, overrides: Value) -> Result<Self> {
        let mut merged = serde_json::to_value(self).context("Failed to serialize settings")?;
        merge_json(&mut merged, overrides);
        serde_json::from_value(merged).context("Failed to apply overrides")
    }

    /// Effective settings as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize settings")
    }
}

/// Objects merge key by key; any other value replaces the target.
fn merge_json(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_nested_objects() {
        let mut target = json!({"a": {"x": 1, "y": 2}, "b": 3});
        merge_json(&mut target, json!({"a": {"y": 20}}));
        assert_eq!(target, json!({"a": {"x": 1, "y": 20}, "b": 3}));
    }

    #[test]
    fn test_merge_replaces_non_objects() {
        let mut target = json!({"a": {"x": 1}});
        merge_json(&mut target, json!({"a": [1, 2]}));
        assert_eq!(target, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_empty_overrides_keep_settings() {
        let base = FinetuneSettings::default();
        let merged = base.with_overrides(json!({})).unwrap();
        assert_eq!(merged, base);
    }
}
