//! C FFI bindings for the PrunePhysics engine
//!
//! Lets a game host written in any language with C FFI support keep its
//! vessel mirrored in the engine and ask which parts may drop their rigid
//! body. Part handles are the `uint32_t` ids returned by the add functions.
//!
//! # Basic Usage (C)
//! ```c
//! #include "prunephysics.h"
//!
//! PrunePhysicsHandle prune = prunephysics_create();
//! prunephysics_add_whitelist_text(prune, "stock.ppwl", "ModuleLight\nElectricCharge\n");
//!
//! uint32_t pod = prunephysics_add_root(prune, "mk1pod");
//! uint32_t light = prunephysics_add_child(prune, "spotLight", pod);
//! prunephysics_add_behavior(prune, light, "Stock.ModuleLight");
//! prunephysics_set_scene(prune, true);
//! prunephysics_set_wanted(prune, light, true);
//!
//! // Physics loop
//! while (running) {
//!     prunephysics_fixed_update(prune);
//!
//!     PrunePhysicsPartState state;
//!     if (prunephysics_get_part_state(prune, light, &state) && !state.has_rigid_body) {
//!         // merge the light into its parent
//!     }
//! }
//!
//! prunephysics_destroy(prune);
//! ```

use std::ffi::{c_char, CStr};

use prunephysics_core::components::{PartId, Resource};
use prunephysics_core::engine::PruneEngine;
use prunephysics_logic::config::PruneConfig;
use prunephysics_logic::constants::{UNKNOWN_SIGNIFICANCE, WAIT_SUFFIX};
use prunephysics_logic::diagnostics::toggle_label;
use prunephysics_logic::host::{AttachNodes, Scene, VesselHost};
use prunephysics_logic::whitelist::{StaticSources, WhitelistSource};

/// Returned by the add functions when no part was created
pub const PRUNEPHYSICS_INVALID_PART: u32 = u32::MAX;

/// Engine plus the rule text the host has pushed so far
pub struct PruneSession {
    engine: PruneEngine,
    sources: StaticSources,
}

/// Opaque handle to a pruning session
pub type PrunePhysicsHandle = *mut PruneSession;

/// Part state returned to C
#[repr(C)]
pub struct PrunePhysicsPartState {
    pub id: u32,
    /// Current significance level
    pub significance: i32,
    /// Authored significance, or -99999 if not recorded yet
    pub original_significance: i32,
    /// 1 if the operator asked for pruning
    pub wanted: u8,
    /// 1 if the part may be demoted right now
    pub eligible: u8,
    /// 1 if the part still has its own rigid body
    pub has_rigid_body: u8,
    /// 1 if the part is jointed to its parent
    pub has_joint: u8,
    /// 1 while the wanted mode and the observed mode disagree
    pub waiting: u8,
}

// ============================================================================
// Helpers
// ============================================================================

fn session<'a>(handle: PrunePhysicsHandle) -> Option<&'a mut PruneSession> {
    if handle.is_null() {
        None
    } else {
        Some(unsafe { &mut *handle })
    }
}

fn text<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    match unsafe { CStr::from_ptr(ptr) }.to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("ffi: string is not UTF-8: {}", e);
            None
        }
    }
}

fn part_or_invalid(id: Option<PartId>) -> u32 {
    id.map(|p| p.0).unwrap_or(PRUNEPHYSICS_INVALID_PART)
}

// ============================================================================
// Lifecycle Functions
// ============================================================================

/// Create a session with the default config, an empty vessel and no rules
///
/// Returns a handle that must be freed with `prunephysics_destroy`
#[no_mangle]
pub extern "C" fn prunephysics_create() -> PrunePhysicsHandle {
    let sources = StaticSources::default();
    Box::into_raw(Box::new(PruneSession {
        engine: PruneEngine::new(&PruneConfig::default(), sources.clone()),
        sources,
    }))
}

/// Destroy a session and free its memory
#[no_mangle]
pub extern "C" fn prunephysics_destroy(handle: PrunePhysicsHandle) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

// ============================================================================
// Whitelist
// ============================================================================

/// Add the body of one rule file and rebuild the whitelist
///
/// Returns the number of compiled rules afterwards
#[no_mangle]
pub extern "C" fn prunephysics_add_whitelist_text(
    handle: PrunePhysicsHandle,
    origin: *const c_char,
    rules: *const c_char,
) -> u32 {
    let (Some(session), Some(rules)) = (session(handle), text(rules)) else {
        return 0;
    };
    let origin = text(origin).unwrap_or("<ffi>");
    session
        .sources
        .push(WhitelistSource::from_text(origin, rules));
    session
        .engine
        .set_whitelist_provider(session.sources.clone());
    session.engine.reset_whitelist() as u32
}

/// Forget all rule text pushed so far
#[no_mangle]
pub extern "C" fn prunephysics_clear_whitelist(handle: PrunePhysicsHandle) {
    let Some(session) = session(handle) else {
        return;
    };
    session.sources = StaticSources::default();
    session
        .engine
        .set_whitelist_provider(session.sources.clone());
}

/// Rebuild the whitelist from the pushed rule text. Returns the rule count.
#[no_mangle]
pub extern "C" fn prunephysics_reset_whitelist(handle: PrunePhysicsHandle) -> u32 {
    match session(handle) {
        Some(session) => session.engine.reset_whitelist() as u32,
        None => 0,
    }
}

// ============================================================================
// Vessel Mirroring
// ============================================================================

/// Add the root part. Returns its id.
#[no_mangle]
pub extern "C" fn prunephysics_add_root(handle: PrunePhysicsHandle, name: *const c_char) -> u32 {
    let (Some(session), Some(name)) = (session(handle), text(name)) else {
        return PRUNEPHYSICS_INVALID_PART;
    };
    session.engine.vessel.add_root(name).0
}

/// Add a part under `parent`
///
/// Returns `PRUNEPHYSICS_INVALID_PART` if the parent is unknown
#[no_mangle]
pub extern "C" fn prunephysics_add_child(
    handle: PrunePhysicsHandle,
    name: *const c_char,
    parent: u32,
) -> u32 {
    let (Some(session), Some(name)) = (session(handle), text(name)) else {
        return PRUNEPHYSICS_INVALID_PART;
    };
    part_or_invalid(session.engine.vessel.add_child(name, PartId(parent)))
}

/// Remove a part; its children become roots
#[no_mangle]
pub extern "C" fn prunephysics_remove_part(handle: PrunePhysicsHandle, part: u32) -> bool {
    match session(handle) {
        Some(session) => session.engine.vessel.remove_part(PartId(part)),
        None => false,
    }
}

/// Append a behavior by its qualified type name
#[no_mangle]
pub extern "C" fn prunephysics_add_behavior(
    handle: PrunePhysicsHandle,
    part: u32,
    type_name: *const c_char,
) -> bool {
    let (Some(session), Some(type_name)) = (session(handle), text(type_name)) else {
        return false;
    };
    session.engine.vessel.add_behavior(PartId(part), type_name)
}

/// Append a resource container filled to `max_amount`
#[no_mangle]
pub extern "C" fn prunephysics_add_resource(
    handle: PrunePhysicsHandle,
    part: u32,
    name: *const c_char,
    max_amount: f64,
) -> bool {
    let (Some(session), Some(name)) = (session(handle), text(name)) else {
        return false;
    };
    session
        .engine
        .vessel
        .add_resource(PartId(part), Resource::full(name, max_amount))
}

/// Set the attach nodes between a part and its parent
///
/// Either node may be NULL; a part without both nodes is surface attached.
#[no_mangle]
pub extern "C" fn prunephysics_set_attach_nodes(
    handle: PrunePhysicsHandle,
    part: u32,
    on_part: *const c_char,
    on_parent: *const c_char,
) -> bool {
    let Some(session) = session(handle) else {
        return false;
    };
    let nodes = AttachNodes {
        on_part: text(on_part).map(str::to_owned),
        on_parent: text(on_parent).map(str::to_owned),
    };
    session.engine.vessel.set_attach_nodes(PartId(part), nodes)
}

/// Rigid body mass of a part
#[no_mangle]
pub extern "C" fn prunephysics_set_mass(handle: PrunePhysicsHandle, part: u32, mass: f32) -> bool {
    match session(handle) {
        Some(session) => session.engine.vessel.set_mass(PartId(part), mass),
        None => false,
    }
}

/// Mark a part as not attached to the vessel tree
#[no_mangle]
pub extern "C" fn prunephysics_set_free_floating(
    handle: PrunePhysicsHandle,
    part: u32,
    on: bool,
) -> bool {
    match session(handle) {
        Some(session) => session.engine.vessel.set_free_floating(PartId(part), on),
        None => false,
    }
}

/// Mark a part the host must keep fully simulated
#[no_mangle]
pub extern "C" fn prunephysics_set_always_simulate(
    handle: PrunePhysicsHandle,
    part: u32,
    on: bool,
) -> bool {
    match session(handle) {
        Some(session) => session.engine.vessel.set_always_simulate(PartId(part), on),
        None => false,
    }
}

/// Link `count` parts into one symmetry group
#[no_mangle]
pub extern "C" fn prunephysics_link_symmetry(
    handle: PrunePhysicsHandle,
    parts: *const u32,
    count: usize,
) -> bool {
    let Some(session) = session(handle) else {
        return false;
    };
    if parts.is_null() {
        return false;
    }
    let ids: Vec<PartId> = unsafe { std::slice::from_raw_parts(parts, count) }
        .iter()
        .map(|&id| PartId(id))
        .collect();
    session.engine.vessel.link_symmetry(&ids)
}

/// Number of parts in the vessel
#[no_mangle]
pub extern "C" fn prunephysics_part_count(handle: PrunePhysicsHandle) -> u32 {
    match session(handle) {
        Some(session) => session.engine.vessel.len() as u32,
        None => 0,
    }
}

// ============================================================================
// Pruning Control
// ============================================================================

/// Switch between editor (false) and flight (true); reinitializes every part
#[no_mangle]
pub extern "C" fn prunephysics_set_scene(handle: PrunePhysicsHandle, flight: bool) {
    let Some(session) = session(handle) else {
        return;
    };
    let scene = if flight { Scene::Flight } else { Scene::Editor };
    session.engine.set_scene(scene);
}

/// Run the start hook on every part, e.g. after mirroring a new vessel
///
/// Returns the number of parts initialized
#[no_mangle]
pub extern "C" fn prunephysics_initialize_all(handle: PrunePhysicsHandle) -> u32 {
    match session(handle) {
        Some(session) => session.engine.initialize_all().len() as u32,
        None => 0,
    }
}

/// Set the wanted flag; applied on the next `prunephysics_fixed_update`
#[no_mangle]
pub extern "C" fn prunephysics_set_wanted(
    handle: PrunePhysicsHandle,
    part: u32,
    wanted: bool,
) -> bool {
    match session(handle) {
        Some(session) => session.engine.set_wanted(PartId(part), wanted),
        None => false,
    }
}

/// Toggle a part and its symmetry siblings immediately (flight only)
///
/// Returns how many parts changed state
#[no_mangle]
pub extern "C" fn prunephysics_toggle(handle: PrunePhysicsHandle, part: u32, wanted: bool) -> u32 {
    session(handle)
        .and_then(|session| session.engine.toggle(PartId(part), wanted))
        .map(|outcome| outcome.changed() as u32)
        .unwrap_or(0)
}

/// One physics step. Returns the number of parts that changed state.
#[no_mangle]
pub extern "C" fn prunephysics_fixed_update(handle: PrunePhysicsHandle) -> u32 {
    match session(handle) {
        Some(session) => session.engine.fixed_update().transitions.len() as u32,
        None => 0,
    }
}

/// Per-frame refresh. Returns how many toggle labels changed.
#[no_mangle]
pub extern "C" fn prunephysics_update(handle: PrunePhysicsHandle) -> u32 {
    match session(handle) {
        Some(session) => session.engine.update() as u32,
        None => 0,
    }
}

#[no_mangle]
pub extern "C" fn prunephysics_is_enabled(handle: PrunePhysicsHandle) -> bool {
    session(handle).is_some_and(|session| session.engine.is_enabled())
}

/// Set the global gate. Parts follow on the next step.
#[no_mangle]
pub extern "C" fn prunephysics_set_enabled(handle: PrunePhysicsHandle, enabled: bool) {
    if let Some(session) = session(handle) {
        session.engine.set_enabled(enabled);
    }
}

/// Flip the global gate. Returns the new value.
#[no_mangle]
pub extern "C" fn prunephysics_toggle_enabled(handle: PrunePhysicsHandle) -> bool {
    session(handle).is_some_and(|session| session.engine.toggle_enabled())
}

/// Run an operator command such as `disable ModuleLight$`
///
/// Returns the number of behaviors switched, or -1 if the command is invalid
#[no_mangle]
pub extern "C" fn prunephysics_run_command(handle: PrunePhysicsHandle, line: *const c_char) -> i32 {
    let (Some(session), Some(line)) = (session(handle), text(line)) else {
        return -1;
    };
    match session.engine.run_command(line) {
        Ok(count) => count as i32,
        Err(e) => {
            log::warn!("ffi: {}", e);
            -1
        }
    }
}

// ============================================================================
// Query Functions
// ============================================================================

/// Get the state of one part
///
/// Returns false if the part is unknown
#[no_mangle]
pub extern "C" fn prunephysics_get_part_state(
    handle: PrunePhysicsHandle,
    part: u32,
    state: *mut PrunePhysicsPartState,
) -> bool {
    if state.is_null() {
        return false;
    }
    let Some(session) = session(handle) else {
        return false;
    };
    let id = PartId(part);
    let vessel = &session.engine.vessel;
    let Some(physics) = vessel.physics_state(id) else {
        return false;
    };

    let out = unsafe { &mut *state };
    out.id = part;
    out.significance = vessel.significance(id);
    out.original_significance = physics
        .original_significance
        .unwrap_or(UNKNOWN_SIGNIFICANCE);
    out.wanted = physics.wanted as u8;
    out.eligible = session.engine.verdict(id).is_eligible() as u8;
    out.has_rigid_body = vessel.has_rigid_body(id) as u8;
    out.has_joint = vessel.has_attachment_joint(id) as u8;
    out.waiting = toggle_label(session.engine.context(), vessel, id, session.engine.scene())
        .ends_with(WAIT_SUFFIX) as u8;
    true
}

/// Write why a part may not be demoted into `buffer` as a NUL-terminated
/// string, truncated to `capacity`
///
/// Returns the full length of the reason without the terminator, so a
/// caller can retry with a larger buffer. Eligible parts yield "eligible".
#[no_mangle]
pub extern "C" fn prunephysics_verdict_reason(
    handle: PrunePhysicsHandle,
    part: u32,
    buffer: *mut c_char,
    capacity: usize,
) -> usize {
    let Some(session) = session(handle) else {
        return 0;
    };
    let reason = session.engine.verdict(PartId(part)).reason_text();
    let bytes = reason.as_bytes();
    if !buffer.is_null() && capacity > 0 {
        let copied = bytes.len().min(capacity - 1);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.cast::<u8>(), copied);
            *buffer.add(copied) = 0;
        }
    }
    bytes.len()
}
