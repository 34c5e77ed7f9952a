//! Vessel - the part tree stored in a `hecs::World`, exposed to the pruning
//! logic through [`VesselHost`] and [`BehaviorControl`].

use std::collections::HashMap;

use hecs::{Component, Entity, EntityBuilder, World};
use prunephysics_logic::constants::FULL_SIGNIFICANCE;
use prunephysics_logic::host::{AttachMode, AttachNodes, BehaviorControl, VesselHost};

use crate::components::*;

/// A vessel: one world of part entities plus a stable id index.
pub struct Vessel {
    pub name: String,
    world: World,
    index: HashMap<PartId, Entity>,
    next_id: u32,
}

impl Vessel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: World::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn entity(&self, id: PartId) -> Option<Entity> {
        self.index.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All part ids in ascending order
    pub fn part_ids(&self) -> Vec<PartId> {
        let mut ids: Vec<PartId> = self.index.keys().copied().collect();
        ids.sort();
        ids
    }

    /// First part without a parent
    pub fn root(&self) -> Option<PartId> {
        self.part_ids()
            .into_iter()
            .find(|&id| self.read::<Structure, _>(id, |s| s.parent.is_none()) == Some(true))
    }

    pub fn part_name(&self, id: PartId) -> Option<String> {
        self.read::<PartInfo, _>(id, |info| info.name.clone())
    }

    /// Read one component of a part
    pub fn read<T: Component, R>(&self, id: PartId, f: impl FnOnce(&T) -> R) -> Option<R> {
        let entity = self.entity(id)?;
        let component = self.world.get::<&T>(entity).ok()?;
        Some(f(&component))
    }

    /// Mutate one component of a part
    pub fn modify<T: Component, R>(&mut self, id: PartId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let entity = self.entity(id)?;
        let mut component = self.world.get::<&mut T>(entity).ok()?;
        Some(f(&mut component))
    }

    fn has<T: Component>(&self, id: PartId) -> bool {
        self.entity(id)
            .and_then(|e| self.world.entity(e).ok())
            .is_some_and(|e| e.has::<T>())
    }

    fn set_marker<T: Component + Default>(&mut self, id: PartId, on: bool) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        if on {
            let _ = self.world.insert_one(entity, T::default());
        } else {
            let _ = self.world.remove_one::<T>(entity);
        }
        true
    }

    /// Add the root part
    pub fn add_root(&mut self, name: impl Into<String>) -> PartId {
        let id = self.allocate_id();
        let mut builder = EntityBuilder::new();
        builder
            .add(PartInfo::new(id, name))
            .add(Structure::default());
        self.spawn_part(id, Significance::default(), builder);
        id
    }

    /// Attach a new part to `parent`. `None` if the parent is unknown.
    pub fn add_child(&mut self, name: impl Into<String>, parent: PartId) -> Option<PartId> {
        let name = name.into();
        if !self.index.contains_key(&parent) {
            log::warn!("cannot attach {}: parent {} does not exist", name, parent);
            return None;
        }
        let id = self.allocate_id();
        let mut builder = EntityBuilder::new();
        builder
            .add(PartInfo::new(id, name))
            .add(Structure::child_of(parent))
            .add(AttachJoint {
                mode: AttachMode::Surface,
            });
        self.spawn_part(id, Significance::default(), builder);
        Some(id)
    }

    fn allocate_id(&mut self) -> PartId {
        let id = PartId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn a part entity, filling in components every part carries.
    pub(crate) fn spawn_part(
        &mut self,
        id: PartId,
        significance: Significance,
        mut builder: EntityBuilder,
    ) {
        builder.add(significance);
        let has_mass = builder.has::<RigidBody>() || builder.has::<MergedMass>();
        if significance.is_full() && !has_mass {
            builder.add(RigidBody::default());
        }
        if !builder.has::<Behaviors>() {
            builder.add(Behaviors::default());
        }
        if !builder.has::<Resources>() {
            builder.add(Resources::default());
        }
        if !builder.has::<PhysicsState>() {
            builder.add(PhysicsState::default());
        }
        let entity = self.world.spawn(builder.build());
        self.index.insert(id, entity);
        self.next_id = self.next_id.max(id.0 + 1);
    }

    pub fn add_behavior(&mut self, id: PartId, type_name: impl Into<String>) -> bool {
        self.modify::<Behaviors, _>(id, |b| b.0.push(Behavior::new(type_name)))
            .is_some()
    }

    pub fn add_resource(&mut self, id: PartId, resource: Resource) -> bool {
        self.modify::<Resources, _>(id, |r| r.0.push(resource)).is_some()
    }

    /// Set the attach nodes; a stacked pair also switches the joint mode.
    pub fn set_attach_nodes(&mut self, id: PartId, nodes: AttachNodes) -> bool {
        let mode = nodes.joint_mode();
        let updated = self
            .modify::<Structure, _>(id, |s| s.attach_nodes = nodes)
            .is_some();
        if updated {
            self.modify::<AttachJoint, _>(id, |j| j.mode = mode);
        }
        updated
    }

    pub fn set_mass(&mut self, id: PartId, mass: f32) -> bool {
        self.modify::<RigidBody, _>(id, |b| b.mass = mass).is_some()
            || self.modify::<MergedMass, _>(id, |m| m.0 = mass).is_some()
    }

    pub fn set_free_floating(&mut self, id: PartId, on: bool) -> bool {
        self.set_marker::<FreeFloating>(id, on)
    }

    pub fn set_always_simulate(&mut self, id: PartId, on: bool) -> bool {
        self.set_marker::<AlwaysSimulate>(id, on)
    }

    /// Make every part in `group` a symmetry counterpart of the others.
    /// Fails without changes if any id is unknown.
    pub fn link_symmetry(&mut self, group: &[PartId]) -> bool {
        if group.iter().any(|id| !self.index.contains_key(id)) {
            return false;
        }
        for &id in group {
            let others: Vec<PartId> = group.iter().copied().filter(|&o| o != id).collect();
            self.modify::<Structure, _>(id, |s| s.symmetry = others);
        }
        true
    }

    /// Detach and delete a part. Its children become roots without joints.
    pub fn remove_part(&mut self, id: PartId) -> bool {
        let Some(entity) = self.index.remove(&id) else {
            return false;
        };
        let _ = self.world.despawn(entity);

        let mut orphans = Vec::new();
        for (entity, structure) in self.world.query_mut::<&mut Structure>() {
            structure.symmetry.retain(|&s| s != id);
            if structure.parent == Some(id) {
                structure.parent = None;
                orphans.push(entity);
            }
        }
        for entity in orphans {
            let _ = self.world.remove_one::<AttachJoint>(entity);
        }
        true
    }

    /// Host physics step: give full parts a rigid body and merge reduced
    /// parts into their parent. Returns how many bodies changed.
    pub fn sync_bodies(&mut self) -> usize {
        let mut attach = Vec::new();
        let mut detach = Vec::new();
        for (entity, (significance, body)) in self
            .world
            .query::<(&Significance, Option<&RigidBody>)>()
            .iter()
        {
            match (significance.is_full(), body) {
                (true, None) => attach.push(entity),
                (false, Some(body)) => detach.push((entity, body.mass)),
                _ => {}
            }
        }

        for &entity in &attach {
            let mass = self
                .world
                .remove_one::<MergedMass>(entity)
                .map(|m| m.0)
                .unwrap_or(RigidBody::default().mass);
            let _ = self.world.insert_one(entity, RigidBody { mass });
        }
        for &(entity, mass) in &detach {
            let _ = self.world.remove_one::<RigidBody>(entity);
            let _ = self.world.insert_one(entity, MergedMass(mass));
        }
        attach.len() + detach.len()
    }

    /// Number of independent rigid bodies
    pub fn body_count(&self) -> usize {
        self.world.query::<&RigidBody>().iter().count()
    }
}

impl VesselHost for Vessel {
    type PartId = PartId;

    fn is_valid(&self, part: PartId) -> bool {
        self.index.contains_key(&part)
    }

    fn describe(&self, part: PartId) -> String {
        match self.part_name(part) {
            Some(name) => format!("P:{}:{}:{}", name, self.significance(part), part),
            None => "P:null".to_string(),
        }
    }

    fn behavior_names(&self, part: PartId) -> Vec<String> {
        self.read::<Behaviors, _>(part, Behaviors::names)
            .unwrap_or_default()
    }

    fn resource_names(&self, part: PartId) -> Vec<String> {
        self.read::<Resources, _>(part, Resources::names)
            .unwrap_or_default()
    }

    fn significance(&self, part: PartId) -> i32 {
        self.read::<Significance, _>(part, |s| s.0)
            .unwrap_or(FULL_SIGNIFICANCE)
    }

    fn has_rigid_body(&self, part: PartId) -> bool {
        self.has::<RigidBody>(part)
    }

    fn parent(&self, part: PartId) -> Option<PartId> {
        self.read::<Structure, _>(part, |s| s.parent).flatten()
    }

    fn symmetry_siblings(&self, part: PartId) -> Vec<PartId> {
        self.read::<Structure, _>(part, |s| s.symmetry.clone())
            .unwrap_or_default()
    }

    fn is_free_floating(&self, part: PartId) -> bool {
        self.has::<FreeFloating>(part)
    }

    fn requires_full_simulation(&self, part: PartId) -> bool {
        self.has::<AlwaysSimulate>(part)
    }

    fn attach_nodes(&self, part: PartId) -> AttachNodes {
        self.read::<Structure, _>(part, |s| s.attach_nodes.clone())
            .unwrap_or_default()
    }

    fn has_attachment_joint(&self, part: PartId) -> bool {
        self.has::<AttachJoint>(part)
    }

    fn physics_state(&self, part: PartId) -> Option<PhysicsState> {
        self.read::<PhysicsState, _>(part, |s| *s)
    }

    fn store_physics_state(&mut self, part: PartId, state: PhysicsState) {
        if let Some(entity) = self.entity(part) {
            let _ = self.world.insert_one(entity, state);
        }
    }

    fn set_significance(&mut self, part: PartId, level: i32) {
        if let Some(entity) = self.entity(part) {
            let _ = self.world.insert_one(entity, Significance(level));
        }
    }

    fn create_attachment_joint(&mut self, part: PartId, mode: AttachMode) {
        if let Some(entity) = self.entity(part) {
            let _ = self.world.insert_one(entity, AttachJoint { mode });
        }
    }

    fn destroy_attachment_joint(&mut self, part: PartId) {
        if let Some(entity) = self.entity(part) {
            let _ = self.world.remove_one::<AttachJoint>(entity);
        }
    }
}

impl BehaviorControl for Vessel {
    fn parts(&self) -> Vec<PartId> {
        self.part_ids()
    }

    fn behavior_enabled(&self, part: PartId, index: usize) -> Option<bool> {
        self.read::<Behaviors, _>(part, |b| b.0.get(index).map(|b| b.enabled))
            .flatten()
    }

    fn set_behavior_enabled(&mut self, part: PartId, index: usize, enabled: bool) {
        self.modify::<Behaviors, _>(part, |b| {
            if let Some(behavior) = b.0.get_mut(index) {
                behavior.enabled = enabled;
            }
        });
    }
}
