//! Physics-significance state machine.
//!
//! A part is either `FULL` (own rigid body, jointed to its parent) or
//! `REDUCED` (merged into its parent's body). The live state is always driven
//! towards `wanted && eligible`:
//!
//! - [`initialize`] records the original significance once, drops a stale
//!   wanted flag when the part is no longer eligible and applies the result.
//! - [`toggle`] sets the wanted flag on a part and each symmetry sibling, and
//!   runs every one of them through its own eligibility check.
//! - [`fixed_update`] is the per-physics-step entry point. It edge-detects
//!   wanted flag changes made through [`set_wanted`], context changes (gate
//!   flip, whitelist rebuild) and host-side mode changes. Wanted parts and
//!   parts off their baseline level are re-checked on every step, so a part
//!   that gains a denied behavior or loses its parent goes back to `FULL`.
//!
//! Host writes happen only when the live value differs, so repeating any
//! transition is free.

use serde::{Deserialize, Serialize};

use crate::config::SignificanceLevels;
use crate::constants::is_full_level;
use crate::context::PruneContext;
use crate::eligibility::EligibilityVerdict;
use crate::host::{update_state, PhysicsMode, Scene, VesselHost};
use crate::state::{ChangeTracker, PhysicsState};

/// What a single transition did to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// No host mutation.
    Unchanged,
    /// Level set to reduced and/or joint removed.
    Demoted,
    /// Level restored to the baseline.
    Promoted,
    /// Level already at baseline; a missing joint was rebuilt.
    Rejoined,
}

impl Transition {
    pub fn is_change(self) -> bool {
        self != Transition::Unchanged
    }

    fn changes_level(self) -> bool {
        matches!(self, Transition::Demoted | Transition::Promoted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub verdict: EligibilityVerdict,
    pub transition: Transition,
    /// This call recorded the original significance.
    pub original_recorded: bool,
    /// A persisted wanted flag was dropped because the part is ineligible.
    pub wanted_cleared: bool,
}

/// Result of a toggle: the part itself first, then its siblings in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome<P> {
    pub part: Transition,
    pub siblings: Vec<(P, Transition)>,
}

impl<P> ToggleOutcome<P> {
    /// Number of parts whose host state changed.
    pub fn changed(&self) -> usize {
        usize::from(self.part.is_change())
            + self.siblings.iter().filter(|(_, t)| t.is_change()).count()
    }
}

/// Level a promotion returns to: the authored original when known.
pub fn baseline_level(state: &PhysicsState, levels: SignificanceLevels) -> i32 {
    state.original_significance.unwrap_or(levels.full)
}

/// Observed mode, trusting rigid body presence over the significance flag.
///
/// A disagreement is expected right after a level write (`pending`) and is
/// only logged as a warning otherwise.
pub fn observed_mode<H: VesselHost + ?Sized>(host: &H, part: H::PartId, pending: bool) -> PhysicsMode {
    let by_flag = is_full_level(host.significance(part));
    let by_body = host.has_rigid_body(part);
    if by_flag != by_body {
        if pending {
            log::debug!("{}: waiting for host to apply significance", host.describe(part));
        } else {
            log::warn!(
                "{}: significance says {} but rigid body is {}; trusting the body",
                host.describe(part),
                if by_flag { "full" } else { "reduced" },
                if by_body { "present" } else { "absent" }
            );
        }
    }
    if by_body {
        PhysicsMode::Full
    } else {
        PhysicsMode::Reduced
    }
}

/// FULL → REDUCED. Caller has already checked eligibility.
pub fn demote<H: VesselHost + ?Sized>(
    host: &mut H,
    part: H::PartId,
    levels: SignificanceLevels,
) -> Transition {
    let mut transition = Transition::Unchanged;
    let current = host.significance(part);
    if current != levels.reduced {
        log::info!(
            "{}: significance {} -> {}",
            host.describe(part),
            current,
            levels.reduced
        );
        host.set_significance(part, levels.reduced);
        transition = Transition::Demoted;
    }
    if host.has_attachment_joint(part) {
        log::info!("{}: removing attachment joint", host.describe(part));
        host.destroy_attachment_joint(part);
        transition = Transition::Demoted;
    }
    transition
}

/// REDUCED → FULL (or back to the authored level), rebuilding the joint to
/// the parent when the part needs one and has none.
pub fn promote<H: VesselHost + ?Sized>(
    host: &mut H,
    part: H::PartId,
    state: &PhysicsState,
    levels: SignificanceLevels,
) -> Transition {
    let mut transition = Transition::Unchanged;
    let target = baseline_level(state, levels);
    let current = host.significance(part);
    if current != target {
        log::info!("{}: significance {} -> {}", host.describe(part), current, target);
        host.set_significance(part, target);
        transition = Transition::Promoted;
    }
    if is_full_level(target) && host.parent(part).is_some() && !host.has_attachment_joint(part) {
        let mode = host.attach_nodes(part).joint_mode();
        log::info!("{}: creating {:?} attachment joint", host.describe(part), mode);
        host.create_attachment_joint(part, mode);
        if transition == Transition::Unchanged {
            transition = Transition::Rejoined;
        }
    }
    transition
}

fn mark_applied<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    transition: Transition,
) {
    let revision = ctx.revision();
    update_state(host, part, |s| {
        s.tracker.seen_revision = revision;
        if transition.changes_level() {
            s.tracker.pending = true;
        }
    });
}

/// Drive one part to `wanted && eligible`. No sibling propagation.
pub fn reconcile<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    scene: Scene,
) -> Transition {
    if !scene.is_live() || !host.is_valid(part) {
        return Transition::Unchanged;
    }
    let Some(state) = host.physics_state(part) else {
        return Transition::Unchanged;
    };

    let verdict = ctx.can_demote(host, part, scene);
    let transition = if state.wanted && verdict.is_eligible() {
        demote(host, part, ctx.levels())
    } else {
        let transition = promote(host, part, &state, ctx.levels());
        if state.wanted && transition.is_change() {
            log::info!("{}: back to full physics: {}", host.describe(part), verdict);
        }
        transition
    };
    mark_applied(ctx, host, part, transition);
    transition
}

/// Host start hook for a part. Safe to call more than once.
///
/// Returns `None` for an invalid handle.
pub fn initialize<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    scene: Scene,
) -> Option<InitOutcome> {
    if !host.is_valid(part) {
        return None;
    }

    let mut state = host.physics_state(part).unwrap_or_default();
    let significance = host.significance(part);
    let original_recorded = state.observe_original(significance);
    if original_recorded {
        log::info!(
            "{}: original significance = {} in {:?}",
            host.describe(part),
            significance,
            scene
        );
    }
    state.tracker = ChangeTracker {
        initialized: true,
        prev_wanted: state.wanted,
        prev_mode: observed_mode(host, part, false),
        seen_revision: ctx.revision(),
        pending: false,
    };
    host.store_physics_state(part, state);

    let verdict = ctx.can_demote(host, part, scene);
    let mut wanted_cleared = false;
    if state.wanted && !verdict.is_eligible() {
        log::info!("{}: dropping wanted pruning: {}", host.describe(part), verdict);
        update_state(host, part, |s| {
            s.wanted = false;
            s.tracker.prev_wanted = false;
        });
        state.wanted = false;
        wanted_cleared = true;
    }

    let transition = if !scene.is_live() {
        Transition::Unchanged
    } else if state.wanted {
        demote(host, part, ctx.levels())
    } else {
        promote(host, part, &state, ctx.levels())
    };
    mark_applied(ctx, host, part, transition);

    Some(InitOutcome {
        verdict,
        transition,
        original_recorded,
        wanted_cleared,
    })
}

/// Forget the original significance and initialize again. Operator use.
pub fn reset_part<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    scene: Scene,
) -> Option<InitOutcome> {
    update_state(host, part, PhysicsState::reset_original)?;
    initialize(ctx, host, part, scene)
}

/// UI setter: write the wanted flag only. The next [`fixed_update`] picks it
/// up and propagates it. Returns `true` if the flag changed.
pub fn set_wanted<H: VesselHost + ?Sized>(host: &mut H, part: H::PartId, wanted: bool) -> bool {
    update_state(host, part, |s| {
        let changed = s.wanted != wanted;
        s.wanted = wanted;
        changed
    })
    .unwrap_or(false)
}

fn apply_toggle<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    wanted: bool,
    scene: Scene,
) -> ToggleOutcome<H::PartId> {
    log::info!("{}: wanted pruning is now {}", host.describe(part), wanted);
    let write_flag = |s: &mut PhysicsState| {
        s.wanted = wanted;
        s.tracker.prev_wanted = wanted;
    };

    update_state(host, part, write_flag);
    let own = reconcile(ctx, host, part, scene);

    let mut siblings = Vec::new();
    for sibling in host.symmetry_siblings(part) {
        if sibling == part || !host.is_valid(sibling) {
            continue;
        }
        if update_state(host, sibling, write_flag).is_none() {
            continue;
        }
        siblings.push((sibling, reconcile(ctx, host, sibling, scene)));
    }

    ToggleOutcome {
        part: own,
        siblings,
    }
}

/// Operator/user toggle. Only accepted in a live scene; `None` otherwise or
/// for an unconfigured part.
pub fn toggle<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    wanted: bool,
    scene: Scene,
) -> Option<ToggleOutcome<H::PartId>> {
    if !scene.is_live() {
        log::debug!("{}: toggle ignored outside flight", host.describe(part));
        return None;
    }
    if !host.is_valid(part) || host.physics_state(part).is_none() {
        return None;
    }
    Some(apply_toggle(ctx, host, part, wanted, scene))
}

/// Per-physics-step entry point.
pub fn fixed_update<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &mut H,
    part: H::PartId,
    scene: Scene,
) -> Transition {
    if !scene.is_live() || !host.is_valid(part) {
        return Transition::Unchanged;
    }
    let Some(state) = host.physics_state(part) else {
        return Transition::Unchanged;
    };
    if !state.tracker.initialized {
        return initialize(ctx, host, part, scene)
            .map(|outcome| outcome.transition)
            .unwrap_or(Transition::Unchanged);
    }

    let transition = if state.wanted != state.tracker.prev_wanted {
        apply_toggle(ctx, host, part, state.wanted, scene).part
    } else if state.wanted
        || state.tracker.seen_revision != ctx.revision()
        || host.significance(part) != baseline_level(&state, ctx.levels())
    {
        // Verdicts are not cached: wanted or off-baseline parts re-check
        // every step.
        reconcile(ctx, host, part, scene)
    } else {
        Transition::Unchanged
    };

    let pending = host
        .physics_state(part)
        .is_some_and(|s| s.tracker.pending);
    let mode = observed_mode(host, part, pending);
    let settled = is_full_level(host.significance(part)) == host.has_rigid_body(part);
    let description = host.describe(part);
    update_state(host, part, |s| {
        if s.tracker.prev_mode != mode {
            log::info!("{}: {:?} -> {:?}", description, s.tracker.prev_mode, mode);
            s.tracker.prev_mode = mode;
        }
        if settled {
            s.tracker.pending = false;
        }
    });

    transition
}
