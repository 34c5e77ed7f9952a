//! Shared constants: significance levels, rule file grammar, labels.
//!
//! Significance follows the host convention: `<= 0` means the part is a full
//! independent physics body, a positive value means it is merged into its
//! parent for physics purposes.

/// Persisted sentinel for "original significance not observed yet".
pub const UNKNOWN_SIGNIFICANCE: i32 = -99999;

/// Level written when a part is promoted back to full physics.
pub const FULL_SIGNIFICANCE: i32 = 0;

/// Level written when a part is demoted.
pub const REDUCED_SIGNIFICANCE: i32 = 1;

/// Markers that start a trailing comment in a whitelist rule file.
pub const COMMENT_MARKERS: [&str; 2] = ["//", "#"];

/// File extensions (compared case-insensitively) that hold whitelist rules.
pub const WHITELIST_EXTENSIONS: [&str; 2] = ["prunephysicswhitelist", "ppwl"];

/// Prefix put in front of resource names before they are whitelisted.
pub const RESOURCE_PREFIX: &str = "Resource.";

/// Display name of the per-part toggle.
pub const TOGGLE_LABEL: &str = "PrunePhysics";

/// Suffix shown on the toggle while the host has not caught up yet.
pub const WAIT_SUFFIX: &str = " (WAIT)";

/// Whether a significance level means "full independent physics body".
#[inline]
pub fn is_full_level(level: i32) -> bool {
    level <= 0
}
