//! Eligibility: may this part be demoted right now?
//!
//! Verdicts are recomputed on every call because other systems can attach or
//! remove behaviors at any time. Failing a check is the common case and never
//! an error; the verdict just carries the reason.
//!
//! # Checks
//!
//! | Order | Check | Reason on failure |
//! |-------|-------|-------------------|
//! | - | Valid handle with loaded state | `invalid part` |
//! | 1 | Global gate on | `disabled globally` |
//! | 2 | No always-simulate flag | `requires full physics` |
//! | 3 | Not authored non-physical | `authored non-physical (...)` |
//! | 4 | Not a free-floating entity | `free-floating entity` |
//! | 5 | Every behavior and resource whitelisted | `<name> not in whitelist` |
//! | 6 | Has a parent (root tolerated in editor) | `is root` |
//!
//! The validity check always runs first; the order of the rest comes from
//! [`EligibilityPolicy`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::RESOURCE_PREFIX;
use crate::gate::GlobalGate;
use crate::host::{Scene, VesselHost};
use crate::whitelist::WhitelistRegistry;

/// One configurable precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precondition {
    GlobalGate,
    AlwaysSimulate,
    AuthoredPhysical,
    NotFreeFloating,
    Whitelisted,
    HasParent,
}

impl Precondition {
    pub const ALL: [Precondition; 6] = [
        Precondition::GlobalGate,
        Precondition::AlwaysSimulate,
        Precondition::AuthoredPhysical,
        Precondition::NotFreeFloating,
        Precondition::Whitelisted,
        Precondition::HasParent,
    ];
}

/// How a part without a parent is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootRule {
    /// Root parts are refused in flight but tolerated (with a warning) in the
    /// editor.
    AllowInEditor,
    /// Root parts are always refused.
    AlwaysDisallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityPolicy {
    pub order: Vec<Precondition>,
    pub root_rule: RootRule,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            order: Precondition::ALL.to_vec(),
            root_rule: RootRule::AllowInEditor,
        }
    }
}

/// Why a part may not be demoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    InvalidPart,
    DisabledGlobally,
    AlwaysSimulate,
    AuthoredNonPhysical { significance: i32 },
    FreeFloating,
    /// First behavior or resource name that no rule allows.
    NotWhitelisted { name: String },
    IsRoot,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::InvalidPart => write!(f, "invalid part"),
            Ineligibility::DisabledGlobally => write!(f, "disabled globally"),
            Ineligibility::AlwaysSimulate => write!(f, "requires full physics"),
            Ineligibility::AuthoredNonPhysical { significance } => {
                write!(f, "authored non-physical (significance {})", significance)
            }
            Ineligibility::FreeFloating => write!(f, "free-floating entity"),
            Ineligibility::NotWhitelisted { name } => write!(f, "{} not in whitelist", name),
            Ineligibility::IsRoot => write!(f, "is root"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EligibilityVerdict {
    reason: Option<Ineligibility>,
    warnings: Vec<String>,
}

impl EligibilityVerdict {
    pub fn eligible() -> Self {
        Self::default()
    }

    pub fn rejected(reason: Ineligibility) -> Self {
        Self {
            reason: Some(reason),
            warnings: Vec::new(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.reason.is_none()
    }

    pub fn reason(&self) -> Option<&Ineligibility> {
        self.reason.as_ref()
    }

    /// `"eligible"` or the failure reason.
    pub fn reason_text(&self) -> String {
        match &self.reason {
            Some(reason) => reason.to_string(),
            None => "eligible".to_owned(),
        }
    }

    /// Non-fatal observations, e.g. a tolerated root part.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl fmt::Display for EligibilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason_text())
    }
}

/// Names checked against the whitelist: behaviors first, then resources as
/// `Resource.<name>`, both in discovery order.
pub fn candidate_names<H: VesselHost + ?Sized>(host: &H, part: H::PartId) -> Vec<String> {
    let mut names = host.behavior_names(part);
    names.extend(
        host.resource_names(part)
            .into_iter()
            .map(|r| format!("{}{}", RESOURCE_PREFIX, r)),
    );
    names
}

/// Borrowed view over the context pieces eligibility needs.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityEvaluator<'a> {
    whitelist: &'a WhitelistRegistry,
    gate: &'a GlobalGate,
    policy: &'a EligibilityPolicy,
}

impl<'a> EligibilityEvaluator<'a> {
    pub fn new(
        whitelist: &'a WhitelistRegistry,
        gate: &'a GlobalGate,
        policy: &'a EligibilityPolicy,
    ) -> Self {
        Self {
            whitelist,
            gate,
            policy,
        }
    }

    pub fn can_demote<H: VesselHost + ?Sized>(
        &self,
        host: &H,
        part: H::PartId,
        scene: Scene,
    ) -> EligibilityVerdict {
        if !host.is_valid(part) {
            return EligibilityVerdict::rejected(Ineligibility::InvalidPart);
        }
        let Some(state) = host.physics_state(part) else {
            return EligibilityVerdict::rejected(Ineligibility::InvalidPart);
        };

        let mut verdict = EligibilityVerdict::eligible();
        for check in &self.policy.order {
            let failure = match check {
                Precondition::GlobalGate => {
                    (!self.gate.is_enabled()).then_some(Ineligibility::DisabledGlobally)
                }
                Precondition::AlwaysSimulate => host
                    .requires_full_simulation(part)
                    .then_some(Ineligibility::AlwaysSimulate),
                Precondition::AuthoredPhysical => state
                    .original_significance
                    .filter(|_| state.authored_non_physical())
                    .map(|significance| Ineligibility::AuthoredNonPhysical { significance }),
                Precondition::NotFreeFloating => host
                    .is_free_floating(part)
                    .then_some(Ineligibility::FreeFloating),
                Precondition::Whitelisted => self.first_disallowed(host, part),
                Precondition::HasParent => self.check_root(host, part, scene, &mut verdict),
            };
            if let Some(reason) = failure {
                log::debug!("{}: cannot prune physics: {}", host.describe(part), reason);
                verdict.reason = Some(reason);
                return verdict;
            }
        }
        verdict
    }

    fn first_disallowed<H: VesselHost + ?Sized>(
        &self,
        host: &H,
        part: H::PartId,
    ) -> Option<Ineligibility> {
        candidate_names(host, part)
            .into_iter()
            .find(|name| !self.whitelist.is_allowed(name))
            .map(|name| Ineligibility::NotWhitelisted { name })
    }

    fn check_root<H: VesselHost + ?Sized>(
        &self,
        host: &H,
        part: H::PartId,
        scene: Scene,
        verdict: &mut EligibilityVerdict,
    ) -> Option<Ineligibility> {
        if host.parent(part).is_some() {
            return None;
        }
        let tolerated = self.policy.root_rule == RootRule::AllowInEditor && !scene.is_live();
        if tolerated {
            let warning = format!("{} is root; tolerated outside flight", host.describe(part));
            log::warn!("{}", warning);
            verdict.warnings.push(warning);
            None
        } else {
            Some(Ineligibility::IsRoot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PhysicsState;
    use crate::test_support::MockVessel;
    use crate::whitelist::{StaticSources, WhitelistSource};

    fn registry(text: &str) -> WhitelistRegistry {
        WhitelistRegistry::new(StaticSources::new(vec![WhitelistSource::from_text(
            "test.ppwl",
            text,
        )]))
    }

    fn evaluate(vessel: &MockVessel, part: u32, whitelist: &str, gate: bool) -> EligibilityVerdict {
        let registry = registry(whitelist);
        let gate = GlobalGate::new(gate);
        let policy = EligibilityPolicy::default();
        EligibilityEvaluator::new(&registry, &gate, &policy).can_demote(vessel, part, Scene::Flight)
    }

    #[test]
    fn whitelisted_child_is_eligible() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let child = vessel.add_child("light", root);
        vessel.add_behavior(child, "Some.Namespace.MyBehavior");

        let verdict = evaluate(&vessel, child, "MyBehavior", true);
        assert!(verdict.is_eligible(), "{}", verdict);
        assert_eq!(verdict.reason_text(), "eligible");
    }

    #[test]
    fn unlisted_resource_names_the_resource() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let child = vessel.add_child("tank", root);
        vessel.add_behavior(child, "Some.Namespace.MyBehavior");
        vessel.add_resource(child, "Fuel");

        let verdict = evaluate(&vessel, child, "MyBehavior", true);
        assert_eq!(
            verdict.reason(),
            Some(&Ineligibility::NotWhitelisted {
                name: "Resource.Fuel".into()
            })
        );
        assert!(verdict.reason_text().contains("Resource.Fuel"));
    }

    #[test]
    fn behaviors_are_checked_before_resources() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let child = vessel.add_child("tank", root);
        vessel.add_resource(child, "Fuel");
        vessel.add_behavior(child, "Vendor.Unknown");

        let verdict = evaluate(&vessel, child, "", true);
        assert_eq!(
            verdict.reason(),
            Some(&Ineligibility::NotWhitelisted {
                name: "Vendor.Unknown".into()
            })
        );
    }

    #[test]
    fn root_is_refused_in_flight() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");

        let verdict = evaluate(&vessel, root, "", true);
        assert_eq!(verdict.reason(), Some(&Ineligibility::IsRoot));
        assert_eq!(verdict.reason_text(), "is root");
    }

    #[test]
    fn root_is_tolerated_in_editor_with_warning() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let registry = registry("");
        let gate = GlobalGate::default();
        let policy = EligibilityPolicy::default();

        let verdict =
            EligibilityEvaluator::new(&registry, &gate, &policy).can_demote(&vessel, root, Scene::Editor);
        assert!(verdict.is_eligible());
        assert_eq!(verdict.warnings().len(), 1);
    }

    #[test]
    fn strict_root_rule_refuses_in_editor() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let registry = registry("");
        let gate = GlobalGate::default();
        let policy = EligibilityPolicy {
            root_rule: RootRule::AlwaysDisallow,
            ..EligibilityPolicy::default()
        };

        let verdict =
            EligibilityEvaluator::new(&registry, &gate, &policy).can_demote(&vessel, root, Scene::Editor);
        assert_eq!(verdict.reason(), Some(&Ineligibility::IsRoot));
    }

    #[test]
    fn gate_off_rejects_everything() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let child = vessel.add_child("light", root);

        let verdict = evaluate(&vessel, child, "", false);
        assert_eq!(verdict.reason(), Some(&Ineligibility::DisabledGlobally));
        assert_eq!(verdict.reason_text(), "disabled globally");
    }

    #[test]
    fn structural_flags_are_refused() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let strut = vessel.add_child("strut", root);
        vessel.part_mut(strut).always_simulate = true;
        let kerbal = vessel.add_child("kerbal", root);
        vessel.part_mut(kerbal).free_floating = true;

        assert_eq!(
            evaluate(&vessel, strut, "", true).reason(),
            Some(&Ineligibility::AlwaysSimulate)
        );
        assert_eq!(
            evaluate(&vessel, kerbal, "", true).reason(),
            Some(&Ineligibility::FreeFloating)
        );
    }

    #[test]
    fn authored_non_physical_is_refused() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let flag = vessel.add_child("flag", root);
        vessel.part_mut(flag).state = Some(PhysicsState::from_persisted(1, false));

        assert_eq!(
            evaluate(&vessel, flag, "", true).reason(),
            Some(&Ineligibility::AuthoredNonPhysical { significance: 1 })
        );
    }

    #[test]
    fn missing_state_is_invalid() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        let child = vessel.add_child("light", root);
        vessel.part_mut(child).state = None;

        assert_eq!(
            evaluate(&vessel, child, "", true).reason(),
            Some(&Ineligibility::InvalidPart)
        );
        assert_eq!(
            evaluate(&vessel, 999, "", true).reason(),
            Some(&Ineligibility::InvalidPart)
        );
    }

    #[test]
    fn policy_order_decides_the_reported_reason() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        vessel.add_behavior(root, "Vendor.Unknown");
        let registry = registry("");
        let gate = GlobalGate::default();

        let default_policy = EligibilityPolicy::default();
        let verdict = EligibilityEvaluator::new(&registry, &gate, &default_policy)
            .can_demote(&vessel, root, Scene::Flight);
        assert!(matches!(
            verdict.reason(),
            Some(Ineligibility::NotWhitelisted { .. })
        ));

        let root_first = EligibilityPolicy {
            order: vec![Precondition::HasParent, Precondition::Whitelisted],
            ..EligibilityPolicy::default()
        };
        let verdict = EligibilityEvaluator::new(&registry, &gate, &root_first)
            .can_demote(&vessel, root, Scene::Flight);
        assert_eq!(verdict.reason(), Some(&Ineligibility::IsRoot));
    }

    #[test]
    fn candidate_names_list_behaviors_then_resources() {
        let mut vessel = MockVessel::new();
        let root = vessel.add_root("pod");
        vessel.add_resource(root, "Ore");
        vessel.add_behavior(root, "A.B");
        vessel.add_resource(root, "Fuel");

        assert_eq!(
            candidate_names(&vessel, root),
            vec!["A.B".to_owned(), "Resource.Ore".into(), "Resource.Fuel".into()]
        );
    }
}
