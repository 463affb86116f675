use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    graph::reduction::{DEFAULT_REDUCTION_PASSES, ReductionConfig},
    pair_store::normalizer::{
        DEFAULT_APOSTROPHE_PATTERN, DEFAULT_APOSTROPHE_REPLACEMENT, DEFAULT_FORBIDDEN_SYMBOLS,
        PairNormalizer, SubstitutionRule,
    },
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid substitution pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubstitutionConfig {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizationConfig {
    pub substitutions: Vec<SubstitutionConfig>,
    pub forbidden_symbols: String,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        NormalizationConfig {
            substitutions: vec![SubstitutionConfig {
                pattern: DEFAULT_APOSTROPHE_PATTERN.to_string(),
                replacement: DEFAULT_APOSTROPHE_REPLACEMENT.to_string(),
            }],
            forbidden_symbols: DEFAULT_FORBIDDEN_SYMBOLS.to_string(),
        }
    }
}

impl NormalizationConfig {
    pub fn build_normalizer(&self) -> Result<PairNormalizer, ConfigError> {
        let rules = self
            .substitutions
            .iter()
            .map(|rule| {
                SubstitutionRule::new(&rule.pattern, &rule.replacement).map_err(|e| {
                    ConfigError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source: e,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PairNormalizer::new(rules, &self.forbidden_symbols))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub source_dir: String,
    pub data_dir: String,
    pub dataset: String,
    pub output_dir: String,
    pub reduction_passes: usize,
    pub normalization: NormalizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            language: "fr".to_string(),
            source_dir: "sources".to_string(),
            data_dir: "data".to_string(),
            dataset: "fr".to_string(),
            output_dir: "data".to_string(),
            reduction_passes: DEFAULT_REDUCTION_PASSES,
            normalization: NormalizationConfig::default(),
        }
    }
}

impl Config {
    pub fn reduction(&self) -> ReductionConfig {
        ReductionConfig {
            passes: self.reduction_passes,
        }
    }
}

/// Falls back to `Config::default()` when the file is missing or invalid.
pub fn load_config(path: &Path) -> Config {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("loaded configuration from {:?}", path);
                    return config;
                }
                Err(e) => {
                    warn!("error parsing {:?}: {}; using default configuration", path, e);
                }
            },
            Err(e) => {
                warn!("error reading {:?}: {}; using default configuration", path, e);
            }
        }
    } else {
        info!("{:?} not found, using default configuration", path);
    }

    Config::default()
}
