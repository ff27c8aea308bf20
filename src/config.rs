use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use yaml_rust2::YamlLoader;

use crate::utility::{optional_bool, optional_f64, optional_str, string_list};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Learner settings from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub show_meaning: bool,
    pub level: String,
    /// Infinitives the learner is practising right now.
    pub active_verbs: Vec<String>,
    /// Probability of drawing from `active_verbs`, in `[0, 1]`.
    pub active_weight: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_meaning: true,
            level: "A2".to_string(),
            active_verbs: Vec::new(),
            active_weight: 0.7,
        }
    }
}

impl Config {
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_yaml(&content)?;
                info!(path = %path.display(), level = %config.level, "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let docs =
            YamlLoader::load_from_str(content).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        let defaults = Self::default();
        let Some(doc) = docs.first() else {
            return Ok(defaults);
        };

        let invalid = |field: &'static str| move |reason: String| ConfigError::Invalid { field, reason };

        let active_weight = optional_f64(&doc["active_weight"], "active_weight")
            .map_err(invalid("active_weight"))?
            .unwrap_or(defaults.active_weight);
        if !(0.0..=1.0).contains(&active_weight) {
            return Err(ConfigError::Invalid {
                field: "active_weight",
                reason: format!("{active_weight} is outside [0, 1]"),
            });
        }

        Ok(Self {
            show_meaning: optional_bool(&doc["show_meaning"], "show_meaning")
                .map_err(invalid("show_meaning"))?
                .unwrap_or(defaults.show_meaning),
            level: optional_str(&doc["level"], "level")
                .map_err(invalid("level"))?
                .unwrap_or(defaults.level),
            active_verbs: string_list(&doc["active_verbs"], "active_verbs")
                .map_err(invalid("active_verbs"))?,
            active_weight,
        })
    }
}
