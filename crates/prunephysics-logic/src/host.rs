//! Interfaces to the host game engine.
//!
//! The logic never owns parts. Everything it knows about a part, and every
//! change it makes, goes through [`VesselHost`]. Invalid handles are answered
//! with neutral defaults by the host and treated as "nothing to do" here.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::state::PhysicsState;

/// Where the host currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scene {
    /// Design time: parts exist but nothing is simulated.
    Editor,
    /// Live simulation.
    Flight,
}

impl Scene {
    pub fn is_live(self) -> bool {
        matches!(self, Scene::Flight)
    }
}

/// Observed physics treatment of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicsMode {
    /// Own rigid body, jointed to its parent.
    Full,
    /// Merged into the parent's body.
    Reduced,
}

/// How an attachment joint connects a part to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachMode {
    /// Node-to-node stack attachment.
    Stacked,
    /// Surface attachment.
    Surface,
}

/// Attach nodes linking a part and its parent, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachNodes {
    /// Node on the part that points at the parent.
    pub on_part: Option<String>,
    /// Node on the parent that points at the part.
    pub on_parent: Option<String>,
}

impl AttachNodes {
    pub fn stacked(on_part: impl Into<String>, on_parent: impl Into<String>) -> Self {
        Self {
            on_part: Some(on_part.into()),
            on_parent: Some(on_parent.into()),
        }
    }

    /// Stack mode needs a matching node on both sides.
    pub fn joint_mode(&self) -> AttachMode {
        if self.on_part.is_some() && self.on_parent.is_some() {
            AttachMode::Stacked
        } else {
            AttachMode::Surface
        }
    }
}

/// Read and write access to the host's part graph.
pub trait VesselHost {
    type PartId: Copy + Eq + Hash + Debug;

    /// Handle refers to a live part with loaded configuration.
    fn is_valid(&self, part: Self::PartId) -> bool;

    /// Short human-readable description for log lines.
    fn describe(&self, part: Self::PartId) -> String;

    /// Qualified type names of attached behaviors, in discovery order.
    fn behavior_names(&self, part: Self::PartId) -> Vec<String>;

    /// Names of attached resources, in discovery order.
    fn resource_names(&self, part: Self::PartId) -> Vec<String>;

    /// Live significance level.
    fn significance(&self, part: Self::PartId) -> i32;

    /// Whether the engine currently simulates an independent body.
    fn has_rigid_body(&self, part: Self::PartId) -> bool;

    fn parent(&self, part: Self::PartId) -> Option<Self::PartId>;

    /// Parts created by the host's symmetry mechanism together with `part`,
    /// excluding `part` itself.
    fn symmetry_siblings(&self, part: Self::PartId) -> Vec<Self::PartId>;

    /// Player-controlled free-floating entity (never demoted).
    fn is_free_floating(&self, part: Self::PartId) -> bool;

    /// Structural flag that forces full simulation.
    fn requires_full_simulation(&self, part: Self::PartId) -> bool;

    fn attach_nodes(&self, part: Self::PartId) -> AttachNodes;

    fn has_attachment_joint(&self, part: Self::PartId) -> bool;

    /// Persisted state, `None` before the part has been configured.
    fn physics_state(&self, part: Self::PartId) -> Option<PhysicsState>;

    fn store_physics_state(&mut self, part: Self::PartId, state: PhysicsState);

    fn set_significance(&mut self, part: Self::PartId, level: i32);

    fn create_attachment_joint(&mut self, part: Self::PartId, mode: AttachMode);

    fn destroy_attachment_joint(&mut self, part: Self::PartId);
}

/// Extra host surface used by the operator command utility.
pub trait BehaviorControl: VesselHost {
    /// Every part of the current assembly.
    fn parts(&self) -> Vec<Self::PartId>;

    /// Enabled flag of the `index`-th behavior in [`VesselHost::behavior_names`] order.
    fn behavior_enabled(&self, part: Self::PartId, index: usize) -> Option<bool>;

    fn set_behavior_enabled(&mut self, part: Self::PartId, index: usize, enabled: bool);
}

/// Apply `f` to the stored state of `part` and write it back.
///
/// Returns `None` (and writes nothing) when the part has no state.
pub fn update_state<H, R>(
    host: &mut H,
    part: H::PartId,
    f: impl FnOnce(&mut PhysicsState) -> R,
) -> Option<R>
where
    H: VesselHost + ?Sized,
{
    let mut state = host.physics_state(part)?;
    let result = f(&mut state);
    host.store_physics_state(part, state);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_mode_needs_both_nodes() {
        assert_eq!(AttachNodes::stacked("bottom", "top").joint_mode(), AttachMode::Stacked);
        assert_eq!(AttachNodes::default().joint_mode(), AttachMode::Surface);
        let one_sided = AttachNodes {
            on_part: Some("bottom".into()),
            on_parent: None,
        };
        assert_eq!(one_sided.joint_mode(), AttachMode::Surface);
    }

    #[test]
    fn only_flight_is_live() {
        assert!(Scene::Flight.is_live());
        assert!(!Scene::Editor.is_live());
    }
}
