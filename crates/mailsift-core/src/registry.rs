use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Per-signal score weights for one brand rule.
///
/// Each weight is applied at most once per mail (a brand cannot double-count
/// two matching patterns). Keys missing from the registry fall back to their
/// defaults individually, so a rule may override just `pattern` and keep the
/// default `sender` and `subject` weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_pattern_weight")]
    pub pattern: f64,
    #[serde(default = "default_sender_weight")]
    pub sender: f64,
    #[serde(default = "default_subject_weight")]
    pub subject: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            pattern: default_pattern_weight(),
            sender: default_sender_weight(),
            subject: default_subject_weight(),
        }
    }
}

fn default_pattern_weight() -> f64 {
    0.5
}

fn default_sender_weight() -> f64 {
    0.3
}

fn default_subject_weight() -> f64 {
    0.2
}

fn default_priority() -> i64 {
    1
}

/// Detection rules for a single brand.
///
/// `category` is required: a registry entry without one is a configuration
/// error, not a soft default. Pattern strings are regex source matched
/// case-insensitively against mail text; `sender_domains` and
/// `subject_contains` are case-insensitive substring checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandRule {
    pub category: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub sender_domains: Vec<String>,
    #[serde(default)]
    pub subject_contains: Vec<String>,
    #[serde(default)]
    pub score_weights: ScoreWeights,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

/// The full brand registry: a mapping from brand name to its detection rules.
///
/// Loaded once before a batch and treated as immutable afterwards. The sorted
/// map gives every consumer the same deterministic iteration order regardless
/// of how the file was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandRegistry {
    pub brands: BTreeMap<String, BrandRule>,
}

/// Load and validate the brand registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation. A rule with a missing `category` surfaces as a parse error.
pub fn load_registry(path: &Path) -> Result<BrandRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegistryIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let registry: BrandRegistry = serde_yaml::from_str(&content)?;

    validate_registry(&registry)?;

    Ok(registry)
}

fn validate_registry(registry: &BrandRegistry) -> Result<(), ConfigError> {
    for (name, rule) in &registry.brands {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if rule.category.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{name}' has an empty category"
            )));
        }

        let weights = rule.score_weights;
        if weights.pattern < 0.0 || weights.sender < 0.0 || weights.subject < 0.0 {
            return Err(ConfigError::Validation(format!(
                "brand '{name}' has a negative score weight"
            )));
        }
    }

    Ok(())
}
