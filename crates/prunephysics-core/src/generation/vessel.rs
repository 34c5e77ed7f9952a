//! Vessel generation - a node-stacked core with radial symmetry groups

use prunephysics_logic::host::AttachNodes;
use rand::Rng;

use super::catalog::{PartTemplate, COMMAND_POD, ENGINE, RADIAL_PARTS, STACK_PARTS};
use crate::components::{PartId, Resource};
use crate::vessel::Vessel;

/// Configuration for vessel generation
#[derive(Debug, Clone)]
pub struct VesselConfig {
    pub name: String,
    /// Stack sections between the pod and the engine
    pub stack_sections: u32,
    /// Number of radial symmetry groups
    pub radial_groups: u32,
    /// Copies per radial group (1 = no symmetry)
    pub symmetry: u32,
}

impl Default for VesselConfig {
    fn default() -> Self {
        Self {
            name: "Test Vessel".to_string(),
            stack_sections: 4,
            radial_groups: 6,
            symmetry: 2,
        }
    }
}

/// Ids of the generated parts
#[derive(Debug, Clone)]
pub struct VesselLayout {
    pub root: PartId,
    /// Stack from the root down, engine last
    pub stack: Vec<PartId>,
    pub radial_groups: Vec<Vec<PartId>>,
}

impl VesselLayout {
    pub fn part_count(&self) -> usize {
        self.stack.len() + self.radial_groups.iter().map(Vec::len).sum::<usize>()
    }
}

/// Create one part from a template. `None` if `parent` is unknown.
pub fn build_part(
    vessel: &mut Vessel,
    template: &PartTemplate,
    parent: Option<PartId>,
) -> Option<PartId> {
    let id = match parent {
        Some(parent) => vessel.add_child(template.name, parent)?,
        None => vessel.add_root(template.name),
    };
    furnish(vessel, id, template, parent.is_some());
    Some(id)
}

fn furnish(vessel: &mut Vessel, id: PartId, template: &PartTemplate, attached: bool) {
    for behavior in template.behaviors {
        vessel.add_behavior(id, *behavior);
    }
    for &(name, capacity) in template.resources {
        vessel.add_resource(id, Resource::full(name, capacity));
    }
    vessel.set_mass(id, template.mass);
    if template.always_simulate {
        vessel.set_always_simulate(id, true);
    }
    if template.stacked && attached {
        vessel.set_attach_nodes(id, AttachNodes::stacked("top", "bottom"));
    }
}

/// Generate a vessel. An empty `vessel` is expected.
pub fn generate_vessel(
    vessel: &mut Vessel,
    config: &VesselConfig,
    rng: &mut impl Rng,
) -> VesselLayout {
    vessel.name = config.name.clone();
    let root = vessel.add_root(COMMAND_POD.name);
    furnish(vessel, root, &COMMAND_POD, false);

    let mut stack = vec![root];
    for _ in 0..config.stack_sections {
        let template = &STACK_PARTS[rng.gen_range(0..STACK_PARTS.len())];
        let parent = stack[stack.len() - 1];
        if let Some(id) = build_part(vessel, template, Some(parent)) {
            stack.push(id);
        }
    }
    let bottom = stack[stack.len() - 1];
    if let Some(engine) = build_part(vessel, &ENGINE, Some(bottom)) {
        stack.push(engine);
    }

    let copies = config.symmetry.max(1);
    let mut radial_groups = Vec::with_capacity(config.radial_groups as usize);
    for _ in 0..config.radial_groups {
        let template = &RADIAL_PARTS[rng.gen_range(0..RADIAL_PARTS.len())];
        let parent = stack[rng.gen_range(0..stack.len())];
        let group: Vec<PartId> = (0..copies)
            .filter_map(|_| build_part(vessel, template, Some(parent)))
            .collect();
        if group.len() > 1 {
            vessel.link_symmetry(&group);
        }
        radial_groups.push(group);
    }

    log::info!(
        "generated {}: {} stack parts, {} radial groups",
        vessel.name,
        stack.len(),
        radial_groups.len()
    );

    VesselLayout {
        root,
        stack,
        radial_groups,
    }
}
