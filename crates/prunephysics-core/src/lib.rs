//! PrunePhysics Core - ECS vessel host for physics pruning
//!
//! Parts of a vessel live as entities in a `hecs::World`. The pruning logic
//! decides which of them keep their own rigid body; this crate supplies the
//! host side: part inspection, significance and joint mutation, a physics
//! step that merges reduced parts into their parents, rule file discovery
//! and save/load.
//!
//! # Architecture
//!
//! - **Entities**: parts
//! - **Components**: PartInfo, Structure, Behaviors, Resources, Significance,
//!   RigidBody, AttachJoint, PhysicsState
//! - **Host**: [`vessel::Vessel`] implements the logic crate's `VesselHost`
//!
//! # Example
//!
//! ```rust,no_run
//! use prunephysics_core::prelude::*;
//! use prunephysics_core::generation::VesselConfig;
//! use prunephysics_core::sources::DirectorySource;
//! use prunephysics_logic::config::PruneConfig;
//!
//! let mut engine = PruneEngine::new(&PruneConfig::default(), DirectorySource::new("GameData"));
//! engine.generate(&VesselConfig::default(), &mut rand::thread_rng());
//! engine.set_scene(Scene::Flight);
//!
//! loop {
//!     engine.fixed_update();
//!     engine.update();
//! }
//! ```

pub mod components;
pub mod engine;
pub mod generation;
pub mod persistence;
pub mod settings;
pub mod sources;
pub mod vessel;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{PruneEngine, TickReport};
    pub use crate::vessel::Vessel;
    pub use prunephysics_logic::host::{BehaviorControl, Scene, VesselHost};
    pub use prunephysics_logic::significance::Transition;
}
