//! In-memory host used by the unit tests.

use std::collections::BTreeMap;

use crate::host::{AttachMode, AttachNodes, BehaviorControl, VesselHost};
use crate::state::PhysicsState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    SetSignificance(u32, i32),
    CreateJoint(u32, AttachMode),
    DestroyJoint(u32),
}

#[derive(Debug, Clone)]
pub struct MockPart {
    pub name: String,
    pub parent: Option<u32>,
    pub siblings: Vec<u32>,
    pub behaviors: Vec<(String, bool)>,
    pub resources: Vec<String>,
    pub significance: i32,
    pub rigid_body: bool,
    pub joint: Option<AttachMode>,
    pub attach_nodes: AttachNodes,
    pub free_floating: bool,
    pub always_simulate: bool,
    pub state: Option<PhysicsState>,
}

#[derive(Debug, Default)]
pub struct MockVessel {
    pub parts: BTreeMap<u32, MockPart>,
    pub mutations: Vec<Mutation>,
    next_id: u32,
}

impl MockVessel {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, name: &str, parent: Option<u32>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.parts.insert(
            id,
            MockPart {
                name: name.to_owned(),
                parent,
                siblings: Vec::new(),
                behaviors: Vec::new(),
                resources: Vec::new(),
                significance: 0,
                rigid_body: true,
                joint: parent.map(|_| AttachMode::Surface),
                attach_nodes: AttachNodes::default(),
                free_floating: false,
                always_simulate: false,
                state: Some(PhysicsState::default()),
            },
        );
        id
    }

    pub fn add_root(&mut self, name: &str) -> u32 {
        self.add(name, None)
    }

    pub fn add_child(&mut self, name: &str, parent: u32) -> u32 {
        self.add(name, Some(parent))
    }

    pub fn part(&self, id: u32) -> &MockPart {
        &self.parts[&id]
    }

    pub fn part_mut(&mut self, id: u32) -> &mut MockPart {
        self.parts.get_mut(&id).expect("unknown mock part")
    }

    pub fn add_behavior(&mut self, id: u32, name: &str) {
        self.part_mut(id).behaviors.push((name.to_owned(), true));
    }

    pub fn add_resource(&mut self, id: u32, name: &str) {
        self.part_mut(id).resources.push(name.to_owned());
    }

    /// Make every part in `group` a symmetry sibling of the others.
    pub fn link_symmetry(&mut self, group: &[u32]) {
        for &id in group {
            let others = group.iter().copied().filter(|&o| o != id).collect();
            self.part_mut(id).siblings = others;
        }
    }

    pub fn state(&self, id: u32) -> PhysicsState {
        self.part(id).state.expect("mock part without state")
    }

    pub fn set_wanted(&mut self, id: u32, wanted: bool) {
        if let Some(state) = self.part_mut(id).state.as_mut() {
            state.wanted = wanted;
        }
    }
}

impl VesselHost for MockVessel {
    type PartId = u32;

    fn is_valid(&self, part: u32) -> bool {
        self.parts.contains_key(&part)
    }

    fn describe(&self, part: u32) -> String {
        match self.parts.get(&part) {
            Some(p) => format!("P:{}:{}:{}", p.name, p.significance, part),
            None => "P:null".to_owned(),
        }
    }

    fn behavior_names(&self, part: u32) -> Vec<String> {
        self.parts
            .get(&part)
            .map(|p| p.behaviors.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    fn resource_names(&self, part: u32) -> Vec<String> {
        self.parts
            .get(&part)
            .map(|p| p.resources.clone())
            .unwrap_or_default()
    }

    fn significance(&self, part: u32) -> i32 {
        self.parts.get(&part).map(|p| p.significance).unwrap_or(0)
    }

    fn has_rigid_body(&self, part: u32) -> bool {
        self.parts.get(&part).is_some_and(|p| p.rigid_body)
    }

    fn parent(&self, part: u32) -> Option<u32> {
        self.parts.get(&part).and_then(|p| p.parent)
    }

    fn symmetry_siblings(&self, part: u32) -> Vec<u32> {
        self.parts
            .get(&part)
            .map(|p| p.siblings.clone())
            .unwrap_or_default()
    }

    fn is_free_floating(&self, part: u32) -> bool {
        self.parts.get(&part).is_some_and(|p| p.free_floating)
    }

    fn requires_full_simulation(&self, part: u32) -> bool {
        self.parts.get(&part).is_some_and(|p| p.always_simulate)
    }

    fn attach_nodes(&self, part: u32) -> AttachNodes {
        self.parts
            .get(&part)
            .map(|p| p.attach_nodes.clone())
            .unwrap_or_default()
    }

    fn has_attachment_joint(&self, part: u32) -> bool {
        self.parts.get(&part).is_some_and(|p| p.joint.is_some())
    }

    fn physics_state(&self, part: u32) -> Option<PhysicsState> {
        self.parts.get(&part).and_then(|p| p.state)
    }

    fn store_physics_state(&mut self, part: u32, state: PhysicsState) {
        if let Some(p) = self.parts.get_mut(&part) {
            p.state = Some(state);
        }
    }

    fn set_significance(&mut self, part: u32, level: i32) {
        self.mutations.push(Mutation::SetSignificance(part, level));
        if let Some(p) = self.parts.get_mut(&part) {
            p.significance = level;
            p.rigid_body = level <= 0;
        }
    }

    fn create_attachment_joint(&mut self, part: u32, mode: AttachMode) {
        self.mutations.push(Mutation::CreateJoint(part, mode));
        if let Some(p) = self.parts.get_mut(&part) {
            p.joint = Some(mode);
        }
    }

    fn destroy_attachment_joint(&mut self, part: u32) {
        self.mutations.push(Mutation::DestroyJoint(part));
        if let Some(p) = self.parts.get_mut(&part) {
            p.joint = None;
        }
    }
}

impl BehaviorControl for MockVessel {
    fn parts(&self) -> Vec<u32> {
        self.parts.keys().copied().collect()
    }

    fn behavior_enabled(&self, part: u32, index: usize) -> Option<bool> {
        self.parts
            .get(&part)
            .and_then(|p| p.behaviors.get(index))
            .map(|(_, enabled)| *enabled)
    }

    fn set_behavior_enabled(&mut self, part: u32, index: usize, enabled: bool) {
        if let Some((_, flag)) = self
            .parts
            .get_mut(&part)
            .and_then(|p| p.behaviors.get_mut(index))
        {
            *flag = enabled;
        }
    }
}
