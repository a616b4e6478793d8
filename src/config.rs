//! Run configuration for the merge-join.
//!
//! A [`JoinConfig`] can be loaded from a JSON file; every field is optional and
//! falls back to its default. Command-line flags are applied on top.
//!
//! ```json
//! {
//!   "window_size": 50000,
//!   "match_mode": "any-overlap",
//!   "chromosome_order": ["chr1", "chr2", "chrX"]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::chrom::ChromosomeOrder;
use crate::core::types::MatchMode;
use crate::store::chunked::DEFAULT_WINDOW_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a merge-join run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinConfig {
    /// Positions covered by one reference lookahead window
    pub window_size: u64,

    /// Allele comparison strategy
    pub match_mode: MatchMode,

    /// Custom chromosome order, lowest rank first; the human order when unset
    pub chromosome_order: Option<Vec<String>>,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            match_mode: MatchMode::default(),
            chromosome_order: None,
        }
    }
}

impl JoinConfig {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, `ConfigError::Json`
    /// if it is not valid JSON for this struct, and `ConfigError::Invalid` if a
    /// value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    ///
    /// # Errors
    ///
    /// See [`JoinConfig::load_from_file`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a zero window size or an empty
    /// chromosome order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid(
                "window_size must be at least 1".to_string(),
            ));
        }
        if let Some(names) = &self.chromosome_order {
            if names.iter().all(|n| n.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "chromosome_order must name at least one chromosome".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The chromosome order this configuration selects
    #[must_use]
    pub fn order(&self) -> ChromosomeOrder {
        match &self.chromosome_order {
            Some(names) => ChromosomeOrder::from_names(names),
            None => ChromosomeOrder::human(),
        }
    }
}
