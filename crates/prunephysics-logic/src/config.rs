//! Operator configuration.
//!
//! Everything has a default, so an empty JSON object is a valid config:
//!
//! ```
//! use prunephysics_logic::config::PruneConfig;
//!
//! let config: PruneConfig = serde_json::from_str("{}").unwrap();
//! assert!(config.enabled);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{is_full_level, FULL_SIGNIFICANCE, REDUCED_SIGNIFICANCE};
use crate::eligibility::EligibilityPolicy;
use crate::error::ConfigError;

/// Levels written by promotions and demotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignificanceLevels {
    pub full: i32,
    pub reduced: i32,
}

impl Default for SignificanceLevels {
    fn default() -> Self {
        Self {
            full: FULL_SIGNIFICANCE,
            reduced: REDUCED_SIGNIFICANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Initial state of the global gate.
    pub enabled: bool,
    pub policy: EligibilityPolicy,
    pub levels: SignificanceLevels,
    /// Log every name that misses the whitelist (debug level).
    pub log_whitelist_misses: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: EligibilityPolicy::default(),
            levels: SignificanceLevels::default(),
            log_whitelist_misses: true,
        }
    }
}

impl PruneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_full_level(self.levels.full) {
            return Err(ConfigError::FullLevelNotPhysical(self.levels.full));
        }
        if is_full_level(self.levels.reduced) {
            return Err(ConfigError::ReducedLevelPhysical(self.levels.reduced));
        }
        let mut seen = Vec::with_capacity(self.policy.order.len());
        for check in &self.policy.order {
            if seen.contains(check) {
                return Err(ConfigError::DuplicatePrecondition(*check));
            }
            seen.push(*check);
        }
        Ok(())
    }
}
