use crate::error::{Result, SearchError};
use crate::ranking::{FieldBoosts, ScoringConfig};
use crate::tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on how many indexed terms one prefix clause may expand to
pub const DEFAULT_MAX_PREFIX_EXPANSIONS: usize = 64;

/// Engine-wide settings fixed at build time. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tokenizer: TokenizerConfig,
    pub boosts: FieldBoosts,
    pub scoring: ScoringConfig,
    pub max_prefix_expansions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            boosts: FieldBoosts::default(),
            scoring: ScoringConfig::default(),
            max_prefix_expansions: DEFAULT_MAX_PREFIX_EXPANSIONS,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| SearchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.boosts.validate()?;
        self.scoring.validate()?;
        if self.max_prefix_expansions == 0 {
            return Err(SearchError::Config("max_prefix_expansions must be at least 1".to_string()));
        }
        Ok(())
    }
}
