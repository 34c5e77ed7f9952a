//! Per-part physics state.
//!
//! Only `original_significance` and `wanted` survive a save/load cycle. The
//! [`ChangeTracker`] is rebuilt every time the part is initialized.

use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_SIGNIFICANCE;
use crate::host::PhysicsMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhysicsState {
    /// Significance seen on first initialization. Write-once.
    #[serde(default)]
    pub original_significance: Option<i32>,
    /// Operator intent to demote.
    #[serde(default)]
    pub wanted: bool,
    #[serde(skip)]
    pub tracker: ChangeTracker,
}

/// Values remembered from the previous tick for edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeTracker {
    pub initialized: bool,
    pub prev_wanted: bool,
    pub prev_mode: PhysicsMode,
    /// Context revision the part last reconciled against.
    pub seen_revision: u64,
    /// A level was written and the host has not caught up yet.
    pub pending: bool,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self {
            initialized: false,
            prev_wanted: false,
            prev_mode: PhysicsMode::Full,
            seen_revision: 0,
            pending: false,
        }
    }
}

impl PhysicsState {
    pub fn new(wanted: bool) -> Self {
        Self {
            wanted,
            ..Self::default()
        }
    }

    /// Build from the host's persisted fields, mapping the sentinel.
    pub fn from_persisted(original_significance: i32, wanted: bool) -> Self {
        Self {
            original_significance: (original_significance != UNKNOWN_SIGNIFICANCE)
                .then_some(original_significance),
            wanted,
            tracker: ChangeTracker::default(),
        }
    }

    /// `(original_significance, wanted)` as the host persists them.
    pub fn to_persisted(&self) -> (i32, bool) {
        (
            self.original_significance.unwrap_or(UNKNOWN_SIGNIFICANCE),
            self.wanted,
        )
    }

    /// Record the original significance unless already known.
    ///
    /// Returns `true` when this call set it.
    pub fn observe_original(&mut self, significance: i32) -> bool {
        if self.original_significance.is_some() {
            return false;
        }
        self.original_significance = Some(significance);
        true
    }

    /// Forget the original significance so the next initialization records
    /// it again. Operator use only.
    pub fn reset_original(&mut self) {
        self.original_significance = None;
    }

    /// Authored as non-physical, so never a demotion candidate.
    pub fn authored_non_physical(&self) -> bool {
        self.original_significance.is_some_and(|s| s > 0)
    }
}
