//! Physics components: Significance, RigidBody, AttachJoint.
//!
//! `Significance` is the flag the pruning logic writes. `RigidBody` is what
//! the physics step actually simulates; it follows the flag one step later.

use prunephysics_logic::constants::{is_full_level, FULL_SIGNIFICANCE};
use prunephysics_logic::host::AttachMode;
use serde::{Deserialize, Serialize};

/// Physics significance flag (<= 0 full, > 0 merged into parent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Significance(pub i32);

impl Significance {
    pub fn is_full(&self) -> bool {
        is_full_level(self.0)
    }
}

impl Default for Significance {
    fn default() -> Self {
        Self(FULL_SIGNIFICANCE)
    }
}

/// Independent rigid body. Present only while the part is fully simulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// Dry mass in tonnes
    pub mass: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self { mass: 0.1 }
    }
}

/// Joint connecting a part's rigid body to its parent's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachJoint {
    pub mode: AttachMode,
}

/// Mass a reduced part hands to its parent while it has no body
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedMass(pub f32);
