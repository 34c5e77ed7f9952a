//! Component definitions for the vessel ECS.
//!
//! Components are pure data structs attached to part entities.
//! Behavior lives in [`crate::vessel`] and the pruning logic crate.

mod part;
mod physics;

pub use part::*;
pub use physics::*;

pub use prunephysics_logic::state::PhysicsState;
