//! Pure physics-pruning logic for PrunePhysics.
//!
//! This crate decides which vessel parts may drop their own rigid body and
//! drives each part between full and reduced physics. It is independent of
//! any engine: the host is reached only through the [`host::VesselHost`]
//! trait, so everything here is unit-testable against an in-memory vessel.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`command`] | Operator `enable`/`disable <regex>` over behavior names |
//! | [`config`] | Operator configuration (gate default, policy, levels) |
//! | [`constants`] | Significance levels, rule file grammar, labels |
//! | [`context`] | Owner of the whitelist, gate and policy |
//! | [`diagnostics`] | Part dumps, toggle label, vessel summary |
//! | [`eligibility`] | Ordered preconditions for demotion |
//! | [`error`] | Rule, command and config errors |
//! | [`gate`] | Process-wide enable switch |
//! | [`host`] | Host traits and scene/physics/attach enums |
//! | [`significance`] | FULL/REDUCED state machine with sibling propagation |
//! | [`state`] | Per-part persisted state and edge tracker |
//! | [`whitelist`] | Rule parsing, anchoring and the lazy registry |

pub mod command;
pub mod config;
pub mod constants;
pub mod context;
pub mod diagnostics;
pub mod eligibility;
pub mod error;
pub mod gate;
pub mod host;
pub mod significance;
pub mod state;
pub mod whitelist;

#[cfg(test)]
mod test_support;

pub use context::PruneContext;
pub use host::{BehaviorControl, Scene, VesselHost};
pub use significance::Transition;
