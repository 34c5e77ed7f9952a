//! Top-level owner of the shared pruning state.
//!
//! One [`PruneContext`] per process (or per test). It owns the lazily built
//! whitelist, the global gate and the policy, and hands out borrowed
//! [`EligibilityEvaluator`]s. Nothing here is global or thread-shared.

use crate::config::{PruneConfig, SignificanceLevels};
use crate::eligibility::{EligibilityEvaluator, EligibilityPolicy, EligibilityVerdict};
use crate::gate::GlobalGate;
use crate::host::{Scene, VesselHost};
use crate::whitelist::{WhitelistProvider, WhitelistRegistry};

#[derive(Debug)]
pub struct PruneContext {
    whitelist: WhitelistRegistry,
    gate: GlobalGate,
    policy: EligibilityPolicy,
    levels: SignificanceLevels,
}

impl PruneContext {
    pub fn new(config: &PruneConfig, provider: impl WhitelistProvider + 'static) -> Self {
        let whitelist =
            WhitelistRegistry::new(provider).with_miss_logging(config.log_whitelist_misses);
        Self::with_registry(config, whitelist)
    }

    pub fn with_registry(config: &PruneConfig, whitelist: WhitelistRegistry) -> Self {
        Self {
            whitelist,
            gate: GlobalGate::new(config.enabled),
            policy: config.policy.clone(),
            levels: config.levels,
        }
    }

    pub fn evaluator(&self) -> EligibilityEvaluator<'_> {
        EligibilityEvaluator::new(&self.whitelist, &self.gate, &self.policy)
    }

    /// Shorthand for `self.evaluator().can_demote(..)`.
    pub fn can_demote<H: VesselHost + ?Sized>(
        &self,
        host: &H,
        part: H::PartId,
        scene: Scene,
    ) -> EligibilityVerdict {
        self.evaluator().can_demote(host, part, scene)
    }

    pub fn whitelist(&self) -> &WhitelistRegistry {
        &self.whitelist
    }

    pub fn whitelist_mut(&mut self) -> &mut WhitelistRegistry {
        &mut self.whitelist
    }

    /// Operator command: drop and rebuild the whitelist.
    pub fn rebuild_whitelist(&mut self) -> usize {
        self.whitelist.rebuild().len()
    }

    pub fn gate(&self) -> &GlobalGate {
        &self.gate
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    /// Returns `true` if the value changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        self.gate.set_enabled(enabled)
    }

    pub fn toggle_enabled(&mut self) -> bool {
        self.gate.toggle()
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: EligibilityPolicy) {
        self.policy = policy;
    }

    pub fn levels(&self) -> SignificanceLevels {
        self.levels
    }

    /// Changes whenever the gate flips or the whitelist is reset; parts
    /// reconcile when the revision they last saw is stale.
    pub fn revision(&self) -> u64 {
        self.whitelist.revision() + self.gate.revision()
    }
}

impl Default for PruneContext {
    fn default() -> Self {
        Self::with_registry(&PruneConfig::default(), WhitelistRegistry::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_tracks_gate_and_whitelist() {
        let mut ctx = PruneContext::default();
        assert_eq!(ctx.revision(), 0);

        ctx.set_enabled(false);
        assert_eq!(ctx.revision(), 1);
        ctx.set_enabled(false);
        assert_eq!(ctx.revision(), 1);

        ctx.rebuild_whitelist();
        assert_eq!(ctx.revision(), 2);
    }

    #[test]
    fn gate_default_comes_from_config() {
        let config = PruneConfig {
            enabled: false,
            ..PruneConfig::default()
        };
        let ctx = PruneContext::with_registry(&config, WhitelistRegistry::empty());
        assert!(!ctx.is_enabled());
    }
}
