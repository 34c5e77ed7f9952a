//! Read-only introspection: per-part dumps, the toggle label and vessel-wide
//! counts.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::constants::{TOGGLE_LABEL, WAIT_SUFFIX};
use crate::context::PruneContext;
use crate::eligibility::{candidate_names, EligibilityVerdict};
use crate::host::{PhysicsMode, Scene, VesselHost};
use crate::significance::observed_mode;

/// A candidate name and whether the whitelist allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCheck {
    pub name: String,
    pub allowed: bool,
}

/// Snapshot of one part's physics-relevant state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartReport {
    pub label: String,
    pub significance: i32,
    pub mode: PhysicsMode,
    pub original: Option<i32>,
    pub wanted: bool,
    pub verdict: EligibilityVerdict,
    pub parent: Option<String>,
    pub sibling_count: usize,
    pub has_joint: bool,
    pub names: Vec<NameCheck>,
}

impl PartReport {
    /// `None` for an invalid handle.
    pub fn collect<H: VesselHost + ?Sized>(
        ctx: &PruneContext,
        host: &H,
        part: H::PartId,
        scene: Scene,
    ) -> Option<Self> {
        if !host.is_valid(part) {
            return None;
        }
        let state = host.physics_state(part).unwrap_or_default();
        let whitelist = ctx.whitelist();
        let names = candidate_names(host, part)
            .into_iter()
            .map(|name| NameCheck {
                allowed: whitelist.check_quiet(&name),
                name,
            })
            .collect();

        Some(Self {
            label: host.describe(part),
            significance: host.significance(part),
            mode: observed_mode(host, part, state.tracker.pending),
            original: state.original_significance,
            wanted: state.wanted,
            verdict: ctx.can_demote(host, part, scene),
            parent: host.parent(part).map(|p| host.describe(p)),
            sibling_count: host.symmetry_siblings(part).len(),
            has_joint: host.has_attachment_joint(part),
            names,
        })
    }
}

impl fmt::Display for PartReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = "-".repeat(16);
        writeln!(f, "{} {} BEGIN {}", sep, self.label, sep)?;
        writeln!(f, "PHYSICS {:?} {}", self.mode, self.significance)?;
        match self.original {
            Some(original) => writeln!(f, "ORIGINAL {}", original)?,
            None => writeln!(f, "ORIGINAL unknown")?,
        }
        writeln!(f, "WANTED {}", self.wanted)?;
        writeln!(f, "ELIGIBILITY {}", self.verdict)?;
        for warning in self.verdict.warnings() {
            writeln!(f, "WARNING {}", warning)?;
        }
        writeln!(f, "PARENT {}", self.parent.as_deref().unwrap_or("none"))?;
        writeln!(f, "SYMMETRY {}", self.sibling_count)?;
        writeln!(f, "JOINT {}", if self.has_joint { "present" } else { "none" })?;
        for (i, check) in self.names.iter().enumerate() {
            writeln!(
                f,
                "NAME [{}] {} {}",
                i,
                check.name,
                if check.allowed { "allowed" } else { "denied" }
            )?;
        }
        write!(f, "{} {} END {}", sep, self.label, sep)
    }
}

/// Label for the per-part toggle. Gets a wait suffix while the live physics
/// has not caught up with `wanted && eligible`.
pub fn toggle_label<H: VesselHost + ?Sized>(
    ctx: &PruneContext,
    host: &H,
    part: H::PartId,
    scene: Scene,
) -> String {
    let wanted = host.physics_state(part).is_some_and(|s| s.wanted);
    let wanted_full = !(wanted && ctx.can_demote(host, part, scene).is_eligible());
    let observed_full = host.has_rigid_body(part);
    if wanted_full != observed_full {
        format!("{}{}", TOGGLE_LABEL, WAIT_SUFFIX)
    } else {
        TOGGLE_LABEL.to_owned()
    }
}

/// Vessel-wide physics distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VesselSummary {
    pub full_count: usize,
    pub reduced_count: usize,
    pub eligible_count: usize,
    pub wanted_count: usize,
    /// Ineligibility reason (display text) to part count.
    pub reasons: BTreeMap<String, usize>,
}

impl VesselSummary {
    pub fn total(&self) -> usize {
        self.full_count + self.reduced_count
    }

    /// Relative physics cost (full part = 1.0).
    ///
    /// A reduced part still contributes mass and drag to its parent, ≈ 0.1.
    pub fn estimated_cost(&self) -> f64 {
        self.full_count as f64 + self.reduced_count as f64 * 0.1
    }

    pub fn add(&mut self, mode: PhysicsMode, wanted: bool, verdict: &EligibilityVerdict) {
        match mode {
            PhysicsMode::Full => self.full_count += 1,
            PhysicsMode::Reduced => self.reduced_count += 1,
        }
        if wanted {
            self.wanted_count += 1;
        }
        if verdict.is_eligible() {
            self.eligible_count += 1;
        } else {
            *self.reasons.entry(verdict.reason_text()).or_default() += 1;
        }
    }
}

/// Summarize `parts`, skipping invalid handles.
pub fn summarize<H, I>(ctx: &PruneContext, host: &H, parts: I, scene: Scene) -> VesselSummary
where
    H: VesselHost + ?Sized,
    I: IntoIterator<Item = H::PartId>,
{
    let mut summary = VesselSummary::default();
    for part in parts {
        if !host.is_valid(part) {
            continue;
        }
        let state = host.physics_state(part).unwrap_or_default();
        let mode = observed_mode(host, part, state.tracker.pending);
        summary.add(mode, state.wanted, &ctx.can_demote(host, part, scene));
    }
    summary
}
