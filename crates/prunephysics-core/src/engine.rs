//! Prune engine - main entry point driving a vessel through the pruning
//! state machine

use std::collections::HashMap;

use prunephysics_logic::command;
use prunephysics_logic::config::PruneConfig;
use prunephysics_logic::diagnostics::{self, PartReport, VesselSummary};
use prunephysics_logic::eligibility::EligibilityVerdict;
use prunephysics_logic::error::CommandResult;
use prunephysics_logic::host::Scene;
use prunephysics_logic::significance::{self, InitOutcome, ToggleOutcome, Transition};
use prunephysics_logic::whitelist::WhitelistProvider;
use prunephysics_logic::PruneContext;
use rand::Rng;

use crate::components::PartId;
use crate::generation::{generate_vessel, VesselConfig, VesselLayout};
use crate::persistence::{load_vessel, save_vessel, SaveError};
use crate::vessel::Vessel;

/// What one physics step did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    /// Parts whose host state changed, in part order
    pub transitions: Vec<(PartId, Transition)>,
    /// Rigid bodies created or merged by the host step
    pub bodies_synced: usize,
}

/// Main pruning engine
pub struct PruneEngine {
    /// Vessel being simulated
    pub vessel: Vessel,
    context: PruneContext,
    scene: Scene,
    /// Physics steps since start
    frame: u64,
    /// Last toggle label per part, refreshed by `update`
    labels: HashMap<PartId, String>,
}

impl PruneEngine {
    /// Create an engine with an empty vessel, in the editor
    pub fn new(config: &PruneConfig, provider: impl WhitelistProvider + 'static) -> Self {
        Self::with_context(PruneContext::new(config, provider))
    }

    pub fn with_context(context: PruneContext) -> Self {
        Self {
            vessel: Vessel::new("Untitled"),
            context,
            scene: Scene::Editor,
            frame: 0,
            labels: HashMap::new(),
        }
    }

    /// Replace the vessel with a generated one and initialize it
    pub fn generate(&mut self, config: &VesselConfig, rng: &mut impl Rng) -> VesselLayout {
        self.vessel = Vessel::new(config.name.clone());
        self.labels.clear();
        let layout = generate_vessel(&mut self.vessel, config, rng);
        self.initialize_all();
        layout
    }

    pub fn context(&self) -> &PruneContext {
        &self.context
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Switch scene. Every part is initialized again, as on a scene load.
    pub fn set_scene(&mut self, scene: Scene) -> Vec<(PartId, InitOutcome)> {
        if scene != self.scene {
            log::info!("scene {:?} -> {:?}", self.scene, scene);
        }
        self.scene = scene;
        self.labels.clear();
        self.initialize_all()
    }

    /// Run the start hook on every part
    pub fn initialize_all(&mut self) -> Vec<(PartId, InitOutcome)> {
        let mut outcomes = Vec::with_capacity(self.vessel.len());
        for id in self.vessel.part_ids() {
            if let Some(outcome) = self.initialize(id) {
                outcomes.push((id, outcome));
            }
        }
        outcomes
    }

    pub fn initialize(&mut self, id: PartId) -> Option<InitOutcome> {
        significance::initialize(&self.context, &mut self.vessel, id, self.scene)
    }

    /// UI setter; picked up on the next `fixed_update`
    pub fn set_wanted(&mut self, id: PartId, wanted: bool) -> bool {
        significance::set_wanted(&mut self.vessel, id, wanted)
    }

    /// Immediate toggle with symmetry propagation. Flight only.
    pub fn toggle(&mut self, id: PartId, wanted: bool) -> Option<ToggleOutcome<PartId>> {
        significance::toggle(&self.context, &mut self.vessel, id, wanted, self.scene)
    }

    /// One physics step: run the state machine on every part, then let the
    /// host apply the new significance to rigid bodies.
    pub fn fixed_update(&mut self) -> TickReport {
        self.frame += 1;
        let mut report = TickReport {
            frame: self.frame,
            ..Default::default()
        };
        if !self.scene.is_live() {
            return report;
        }

        for id in self.vessel.part_ids() {
            let transition =
                significance::fixed_update(&self.context, &mut self.vessel, id, self.scene);
            if transition.is_change() {
                report.transitions.push((id, transition));
            }
        }
        report.bodies_synced = self.vessel.sync_bodies();
        report
    }

    /// Per-frame UI refresh. Returns how many toggle labels changed.
    pub fn update(&mut self) -> usize {
        if !self.scene.is_live() {
            return 0;
        }
        let mut changed = 0;
        for id in self.vessel.part_ids() {
            let label = diagnostics::toggle_label(&self.context, &self.vessel, id, self.scene);
            let previous = self.labels.get(&id);
            if previous != Some(&label) {
                if let Some(previous) = previous {
                    log::debug!("P:{}: label \"{}\" -> \"{}\"", id, previous, label);
                }
                self.labels.insert(id, label);
                changed += 1;
            }
        }
        changed
    }

    pub fn label(&self, id: PartId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn verdict(&self, id: PartId) -> EligibilityVerdict {
        self.context.can_demote(&self.vessel, id, self.scene)
    }

    pub fn report(&self, id: PartId) -> Option<PartReport> {
        PartReport::collect(&self.context, &self.vessel, id, self.scene)
    }

    pub fn summary(&self) -> VesselSummary {
        diagnostics::summarize(
            &self.context,
            &self.vessel,
            self.vessel.part_ids(),
            self.scene,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.context.is_enabled()
    }

    /// Flip the global gate. Parts reconcile on the next step.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        self.context.set_enabled(enabled)
    }

    pub fn toggle_enabled(&mut self) -> bool {
        self.context.toggle_enabled()
    }

    /// Drop and rebuild the whitelist. Returns the rule count.
    pub fn reset_whitelist(&mut self) -> usize {
        self.context.rebuild_whitelist()
    }

    pub fn set_whitelist_provider(&mut self, provider: impl WhitelistProvider + 'static) {
        self.context.whitelist_mut().set_provider(provider);
    }

    /// Forget a part's original significance and record it again
    pub fn reset_part(&mut self, id: PartId) -> Option<InitOutcome> {
        significance::reset_part(&self.context, &mut self.vessel, id, self.scene)
    }

    /// Operator `enable|disable <regex>` over behavior names
    pub fn run_command(&mut self, line: &str) -> CommandResult<usize> {
        command::run(&mut self.vessel, line)
    }

    /// Save the vessel to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        save_vessel(writer, &self.vessel, self.scene, self.frame)
    }

    /// Load a vessel from a reader and initialize it in the saved scene
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_vessel(reader)?;
        self.vessel = loaded.vessel;
        self.scene = loaded.scene;
        self.frame = loaded.frame;
        self.labels.clear();
        self.initialize_all();
        Ok(())
    }
}

impl Default for PruneEngine {
    fn default() -> Self {
        Self::with_context(PruneContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prunephysics_logic::host::VesselHost;
    use prunephysics_logic::whitelist::{StaticSources, WhitelistSource};

    fn engine(rules: &str) -> PruneEngine {
        PruneEngine::new(
            &PruneConfig::default(),
            StaticSources::new(vec![WhitelistSource::from_text("test.ppwl", rules)]),
        )
    }

    #[test]
    fn test_engine_creation() {
        let engine = PruneEngine::default();
        assert_eq!(engine.vessel.len(), 0);
        assert_eq!(engine.scene(), Scene::Editor);
        assert_eq!(engine.frame(), 0);
    }

    #[test]
    fn test_editor_steps_do_nothing() {
        let mut engine = engine("ModuleLight");
        let pod = engine.vessel.add_root("pod");
        let light = engine.vessel.add_child("light", pod).unwrap();
        engine.vessel.add_behavior(light, "Stock.ModuleLight");
        engine.initialize_all();
        engine.set_wanted(light, true);

        let report = engine.fixed_update();
        assert_eq!(report.frame, 1);
        assert!(report.transitions.is_empty());
        assert!(engine.vessel.has_rigid_body(light));
        assert!(engine.toggle(light, true).is_none());
    }

    #[test]
    fn test_body_follows_one_step_later() {
        let mut engine = engine("ModuleLight");
        let pod = engine.vessel.add_root("pod");
        let light = engine.vessel.add_child("light", pod).unwrap();
        engine.vessel.add_behavior(light, "Stock.ModuleLight");
        engine.set_scene(Scene::Flight);
        engine.update();
        assert_eq!(engine.label(light), Some("PrunePhysics"));

        engine.set_wanted(light, true);
        engine.update();
        assert_eq!(engine.label(light), Some("PrunePhysics (WAIT)"));

        let report = engine.fixed_update();
        assert_eq!(report.transitions, vec![(light, Transition::Demoted)]);
        assert_eq!(report.bodies_synced, 1);
        assert!(!engine.vessel.has_rigid_body(light));

        assert_eq!(engine.update(), 1);
        assert_eq!(engine.label(light), Some("PrunePhysics"));
        assert!(engine.fixed_update().transitions.is_empty());
    }

    #[test]
    fn test_load_restores_wanted_parts() {
        let mut engine = engine("ModuleLight");
        let pod = engine.vessel.add_root("pod");
        let light = engine.vessel.add_child("light", pod).unwrap();
        engine.vessel.add_behavior(light, "Stock.ModuleLight");
        engine.set_scene(Scene::Flight);
        engine.toggle(light, true);
        engine.fixed_update();

        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();

        let mut other = self::engine("ModuleLight");
        other.load(&buffer[..]).unwrap();
        assert_eq!(other.scene(), Scene::Flight);
        assert_eq!(other.frame(), 1);
        assert_eq!(other.vessel.significance(light), 1);
        assert!(other.vessel.physics_state(light).unwrap().wanted);
        assert!(other.fixed_update().transitions.is_empty());
    }

    #[test]
    fn test_command_reaches_vessel() {
        let mut engine = engine("");
        let pod = engine.vessel.add_root("pod");
        engine.vessel.add_behavior(pod, "Stock.ModuleLight");
        assert_eq!(engine.run_command("disable Light").unwrap(), 1);
        assert!(engine.run_command("explode Light").is_err());
    }
}
