//! User-adjustable gateway settings.
//!
//! Settings live in process memory as a single document and are updated by
//! deep merge: a PATCH-style body replaces only the leaves it names, objects
//! merge recursively, and arrays/scalars replace wholesale. Validation runs
//! against the merged result so a partial update cannot leave an invalid
//! whole behind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Keys a settings import payload must carry to be accepted.
pub const IMPORT_REQUIRED_KEYS: [&str; 6] = [
    "language",
    "theme",
    "notifications",
    "performance",
    "ai",
    "display",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    pub enabled: bool,
    pub sound: bool,
    pub email: bool,
    pub push: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSettings {
    pub auto_refresh: bool,
    /// Seconds between dashboard refreshes.
    pub refresh_interval: i64,
    /// Cache budget in MB.
    pub cache_size: i64,
    pub max_concurrent_requests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i64,
    /// Seconds before an AI request is abandoned.
    pub timeout: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub chart_type: String,
    pub show_grid: bool,
    pub show_legend: bool,
    pub animation_speed: String,
}

/// The full settings document. Top-level general fields stay flat to match
/// the dashboard's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default)]
    pub notifications: NotificationPrefs,
    #[serde(default)]
    pub performance: PerformanceSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            email: false,
            push: true,
        }
    }
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_interval: 30,
            cache_size: 100,
            max_concurrent_requests: 5,
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout: 30,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            chart_type: "line".to_string(),
            show_grid: true,
            show_legend: true,
            animation_speed: "medium".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: default_language(),
            theme: default_theme(),
            auto_save: true,
            notifications: NotificationPrefs::default(),
            performance: PerformanceSettings::default(),
            ai: AiSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

/// Recursively merge `patch` into `base`. Objects merge key-by-key; every
/// other value (scalars, arrays, null) replaces the base value outright.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(key) {
                    Some(base_value) if base_value.is_object() && patch_value.is_object() => {
                        deep_merge(base_value, patch_value);
                    }
                    _ => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

impl Settings {
    /// Merge a partial update into this document and validate the result.
    ///
    /// On any validation failure the original document is untouched and the
    /// collected messages come back in the error.
    pub fn apply_patch(&mut self, patch: &Value) -> Result<()> {
        let mut merged = serde_json::to_value(&*self)?;
        deep_merge(&mut merged, patch);
        let candidate: Settings = serde_json::from_value(merged)
            .map_err(|e| Error::InvalidInput(format!("Invalid settings value: {}", e)))?;
        if let Err(problems) = candidate.validate() {
            return Err(Error::InvalidInput(format!(
                "Invalid settings: {}",
                problems.join("; ")
            )));
        }
        *self = candidate;
        Ok(())
    }

    /// Range/enum checks for every constrained field. Collects all problems
    /// rather than stopping at the first.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut problems = Vec::new();

        const LANGUAGES: [&str; 4] = ["en", "tr", "es", "fr"];
        if !LANGUAGES.contains(&self.language.as_str()) {
            problems.push(format!("language must be one of {:?}", LANGUAGES));
        }
        const THEMES: [&str; 3] = ["light", "dark", "auto"];
        if !THEMES.contains(&self.theme.as_str()) {
            problems.push(format!("theme must be one of {:?}", THEMES));
        }

        if !(10..=300).contains(&self.performance.refresh_interval) {
            problems.push("performance.refreshInterval must be between 10 and 300".to_string());
        }
        if !(50..=500).contains(&self.performance.cache_size) {
            problems.push("performance.cacheSize must be between 50 and 500".to_string());
        }
        if !(1..=20).contains(&self.performance.max_concurrent_requests) {
            problems
                .push("performance.maxConcurrentRequests must be between 1 and 20".to_string());
        }

        const MODELS: [&str; 4] = ["gemini-pro", "gemini-pro-vision", "gpt-4", "claude-3"];
        if !MODELS.contains(&self.ai.model.as_str()) {
            problems.push(format!("ai.model must be one of {:?}", MODELS));
        }
        if !(0.0..=1.0).contains(&self.ai.temperature) {
            problems.push("ai.temperature must be between 0 and 1".to_string());
        }
        if !(100..=4096).contains(&self.ai.max_tokens) {
            problems.push("ai.maxTokens must be between 100 and 4096".to_string());
        }
        if !(10..=120).contains(&self.ai.timeout) {
            problems.push("ai.timeout must be between 10 and 120".to_string());
        }

        const CHART_TYPES: [&str; 4] = ["line", "bar", "pie", "area"];
        if !CHART_TYPES.contains(&self.display.chart_type.as_str()) {
            problems.push(format!("display.chartType must be one of {:?}", CHART_TYPES));
        }
        const SPEEDS: [&str; 3] = ["slow", "medium", "fast"];
        if !SPEEDS.contains(&self.display.animation_speed.as_str()) {
            problems.push(format!(
                "display.animationSpeed must be one of {:?}",
                SPEEDS
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Parse an imported settings document. Replaces the current document
    /// wholesale; all required top-level keys must be present and the result
    /// must validate.
    pub fn from_import(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("Settings must be a valid object".to_string()))?;
        let missing: Vec<&str> = IMPORT_REQUIRED_KEYS
            .iter()
            .filter(|key| !obj.contains_key(**key))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Settings must contain all required sections (missing: {})",
                missing.join(", ")
            )));
        }
        let settings: Settings = serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidInput(format!("Invalid settings structure: {}", e)))?;
        if let Err(problems) = settings.validate() {
            return Err(Error::InvalidInput(format!(
                "Invalid settings import: {}",
                problems.join("; ")
            )));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let v = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(v["language"], "en");
        assert_eq!(v["autoSave"], true);
        assert_eq!(v["performance"]["refreshInterval"], 30);
        assert_eq!(v["performance"]["maxConcurrentRequests"], 5);
        assert_eq!(v["ai"]["maxTokens"], 2048);
        assert_eq!(v["display"]["chartType"], "line");
    }

    #[test]
    fn test_deep_merge_preserves_sibling_leaves() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": true});
        deep_merge(&mut base, &json!({"a": {"y": 9}}));
        assert_eq!(base, json!({"a": {"x": 1, "y": 9}, "b": true}));
    }

    #[test]
    fn test_deep_merge_arrays_replace_wholesale() {
        let mut base = json!({"list": [1, 2, 3]});
        deep_merge(&mut base, &json!({"list": [9]}));
        assert_eq!(base, json!({"list": [9]}));
    }

    #[test]
    fn test_apply_patch_merges_and_validates() {
        let mut settings = Settings::default();
        settings
            .apply_patch(&json!({"performance": {"refreshInterval": 60}}))
            .unwrap();
        assert_eq!(settings.performance.refresh_interval, 60);
        // untouched siblings survive
        assert_eq!(settings.performance.cache_size, 100);
        assert_eq!(settings.theme, "light");
    }

    #[test]
    fn test_apply_patch_rejects_out_of_range_and_keeps_original() {
        let mut settings = Settings::default();
        let err = settings
            .apply_patch(&json!({"ai": {"temperature": 1.5}}))
            .unwrap_err();
        assert!(err.to_string().contains("ai.temperature"));
        assert_eq!(settings.ai.temperature, 0.7);
    }

    #[test]
    fn test_apply_patch_rejects_unknown_enum_value() {
        let mut settings = Settings::default();
        let err = settings
            .apply_patch(&json!({"theme": "solarized"}))
            .unwrap_err();
        assert!(err.to_string().contains("theme"));
    }

    #[test]
    fn test_validate_collects_multiple_problems() {
        let mut settings = Settings::default();
        settings.language = "de".to_string();
        settings.ai.max_tokens = 10;
        let problems = settings.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_import_requires_all_sections() {
        let err = Settings::from_import(&json!({"language": "en", "theme": "dark"})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("required sections"));
        assert!(msg.contains("notifications"));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut original = Settings::default();
        original.theme = "dark".to_string();
        let exported = serde_json::to_value(&original).unwrap();
        let imported = Settings::from_import(&exported).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn test_import_rejects_invalid_values() {
        let mut exported = serde_json::to_value(Settings::default()).unwrap();
        exported["ai"]["model"] = json!("mystery-model");
        let err = Settings::from_import(&exported).unwrap_err();
        assert!(err.to_string().contains("ai.model"));
    }
}
