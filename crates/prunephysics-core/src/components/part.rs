//! Part identity and structure components: PartInfo, Structure, Behaviors, etc.

use prunephysics_logic::host::AttachNodes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable part handle. Survives save/load, unlike `hecs::Entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u32);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a part entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartInfo {
    pub id: PartId,
    pub name: String,
}

impl PartInfo {
    pub fn new(id: PartId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Position in the vessel tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Structure {
    /// `None` for the root part
    pub parent: Option<PartId>,
    /// Symmetry counterparts, excluding the part itself
    pub symmetry: Vec<PartId>,
    pub attach_nodes: AttachNodes,
}

impl Structure {
    pub fn child_of(parent: PartId) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }

    pub fn with_nodes(mut self, nodes: AttachNodes) -> Self {
        self.attach_nodes = nodes;
        self
    }
}

/// One attached behavior, identified by its qualified type name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub type_name: String,
    pub enabled: bool,
}

impl Behavior {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            enabled: true,
        }
    }
}

/// Behaviors in attachment order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Behaviors(pub Vec<Behavior>);

impl Behaviors {
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|b| b.type_name.clone()).collect()
    }
}

/// A resource container on a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub amount: f64,
    pub max_amount: f64,
}

impl Resource {
    /// Container filled to capacity
    pub fn full(name: impl Into<String>, max_amount: f64) -> Self {
        Self {
            name: name.into(),
            amount: max_amount,
            max_amount,
        }
    }
}

/// Resource containers in discovery order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resources(pub Vec<Resource>);

impl Resources {
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.name.clone()).collect()
    }
}

/// Marker: an independent free-floating entity (crew on EVA, debris)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FreeFloating;

/// Marker: the host needs this part fully simulated at all times
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AlwaysSimulate;
