//! Save/Load functionality for persisting a vessel
//!
//! Uses bincode for compact binary serialization. Each part is flattened to
//! a [`SerializablePart`] and respawned on load. Of the pruning state only
//! the original significance and the wanted flag are written; edge tracking
//! starts over after a load.

use hecs::EntityBuilder;
use prunephysics_logic::host::{AttachMode, Scene, VesselHost};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::*;
use crate::vessel::Vessel;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a vessel
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub vessel_name: String,
    pub scene: Scene,
    /// Physics steps run so far
    pub frame: u64,
    pub parts: Vec<SerializablePart>,
}

/// All components of one part
#[derive(Serialize, Deserialize)]
pub struct SerializablePart {
    pub info: PartInfo,
    pub structure: Structure,
    pub behaviors: Behaviors,
    pub resources: Resources,
    pub significance: i32,
    /// Body mass, or merged mass while reduced
    pub mass: f32,
    pub joint: Option<AttachMode>,
    pub free_floating: bool,
    pub always_simulate: bool,
    /// `(original_significance, wanted)` with the unknown sentinel
    pub persisted: (i32, bool),
}

/// Flatten every part of a vessel
fn serialize_parts(vessel: &Vessel) -> Vec<SerializablePart> {
    let mut parts = Vec::with_capacity(vessel.len());
    for id in vessel.part_ids() {
        let Some(info) = vessel.read::<PartInfo, _>(id, Clone::clone) else {
            continue;
        };
        let mass = vessel
            .read::<RigidBody, _>(id, |b| b.mass)
            .or_else(|| vessel.read::<MergedMass, _>(id, |m| m.0))
            .unwrap_or_default();
        parts.push(SerializablePart {
            info,
            structure: vessel.read::<Structure, _>(id, Clone::clone).unwrap_or_default(),
            behaviors: vessel.read::<Behaviors, _>(id, Clone::clone).unwrap_or_default(),
            resources: vessel.read::<Resources, _>(id, Clone::clone).unwrap_or_default(),
            significance: vessel.significance(id),
            mass,
            joint: vessel.read::<AttachJoint, _>(id, |j| j.mode),
            free_floating: vessel.is_free_floating(id),
            always_simulate: vessel.requires_full_simulation(id),
            persisted: vessel
                .physics_state(id)
                .unwrap_or_default()
                .to_persisted(),
        });
    }
    parts
}

/// Rebuild a vessel from flattened parts
fn restore_vessel(name: String, parts: Vec<SerializablePart>) -> Vessel {
    let mut vessel = Vessel::new(name);
    for part in parts {
        let id = part.info.id;
        let significance = Significance(part.significance);
        let (original, wanted) = part.persisted;

        let mut builder = EntityBuilder::new();
        builder
            .add(part.info)
            .add(part.structure)
            .add(part.behaviors)
            .add(part.resources)
            .add(PhysicsState::from_persisted(original, wanted));
        if significance.is_full() {
            builder.add(RigidBody { mass: part.mass });
        } else {
            builder.add(MergedMass(part.mass));
        }
        if let Some(mode) = part.joint {
            builder.add(AttachJoint { mode });
        }
        if part.free_floating {
            builder.add(FreeFloating);
        }
        if part.always_simulate {
            builder.add(AlwaysSimulate);
        }
        vessel.spawn_part(id, significance, builder);
    }
    vessel
}

/// Save a vessel to a writer
pub fn save_vessel<W: Write>(
    writer: W,
    vessel: &Vessel,
    scene: Scene,
    frame: u64,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        vessel_name: vessel.name.clone(),
        scene,
        frame,
        parts: serialize_parts(vessel),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a vessel from a reader
pub fn load_vessel<R: Read>(reader: R) -> Result<LoadedVessel, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(LoadedVessel {
        vessel: restore_vessel(save_data.vessel_name, save_data.parts),
        scene: save_data.scene,
        frame: save_data.frame,
    })
}

/// Result of loading a vessel
pub struct LoadedVessel {
    pub vessel: Vessel,
    pub scene: Scene,
    pub frame: u64,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use prunephysics_logic::constants::UNKNOWN_SIGNIFICANCE;
    use prunephysics_logic::host::AttachNodes;

    fn sample_vessel() -> (Vessel, PartId, PartId) {
        let mut vessel = Vessel::new("Saved");
        let pod = vessel.add_root("pod");
        vessel.add_behavior(pod, "Stock.ModuleCommand");
        let light = vessel.add_child("light", pod).unwrap();
        vessel.add_behavior(light, "Stock.ModuleLight");
        vessel.add_resource(light, Resource::full("ElectricCharge", 5.0));
        vessel.set_attach_nodes(light, AttachNodes::stacked("top", "bottom"));
        vessel.set_mass(light, 0.3);
        (vessel, pod, light)
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (mut vessel, pod, light) = sample_vessel();
        vessel.store_physics_state(light, PhysicsState::from_persisted(0, true));
        vessel.set_significance(light, 1);
        vessel.destroy_attachment_joint(light);
        vessel.sync_bodies();

        let mut save_buffer = Vec::new();
        save_vessel(&mut save_buffer, &vessel, Scene::Flight, 12).expect("Save failed");

        let loaded = load_vessel(&save_buffer[..]).expect("Load failed");
        let restored = loaded.vessel;
        assert_eq!(loaded.scene, Scene::Flight);
        assert_eq!(loaded.frame, 12);
        assert_eq!(restored.name, "Saved");
        assert_eq!(restored.part_ids(), vec![pod, light]);

        assert_eq!(restored.significance(light), 1);
        assert!(!restored.has_rigid_body(light));
        assert!(!restored.has_attachment_joint(light));
        assert_eq!(restored.read::<MergedMass, _>(light, |m| m.0), Some(0.3));
        assert_eq!(restored.resource_names(light), vec!["ElectricCharge"]);
        assert_eq!(restored.parent(light), Some(pod));

        let state = restored.physics_state(light).unwrap();
        assert_eq!(state.original_significance, Some(0));
        assert!(state.wanted);
        assert!(!state.tracker.initialized);
    }

    #[test]
    fn test_unknown_original_survives_as_unknown() {
        let (vessel, pod, _) = sample_vessel();
        let parts = serialize_parts(&vessel);
        assert_eq!(parts[0].persisted, (UNKNOWN_SIGNIFICANCE, false));

        let restored = restore_vessel("copy".into(), parts);
        assert_eq!(
            restored.physics_state(pod).unwrap().original_significance,
            None
        );
    }

    #[test]
    fn test_new_parts_continue_after_loaded_ids() {
        let (vessel, _, light) = sample_vessel();
        let mut restored = restore_vessel("copy".into(), serialize_parts(&vessel));
        let extra = restored.add_child("extra", light).unwrap();
        assert!(extra > light);
    }

    #[test]
    fn test_version_mismatch() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            vessel_name: String::new(),
            scene: Scene::Editor,
            frame: 0,
            parts: Vec::new(),
        };
        let bytes = bincode::serialize(&data).unwrap();
        assert!(matches!(
            load_vessel(&bytes[..]),
            Err(SaveError::VersionMismatch { found, .. }) if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let (vessel, _, _) = sample_vessel();
        let mut buffer = Vec::new();
        save_vessel(&mut buffer, &vessel, Scene::Editor, 0).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(load_vessel(&buffer[..]), Err(SaveError::Bincode(_))));
    }
}
