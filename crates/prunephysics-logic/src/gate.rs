//! Process-wide kill switch for physics pruning.
//!
//! While the gate is off every part is treated as ineligible and is pushed
//! back to full physics on its next fixed update. The gate is never
//! persisted; a restart brings back the configured default.

#[derive(Debug, Clone)]
pub struct GlobalGate {
    enabled: bool,
    revision: u64,
}

impl GlobalGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            revision: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if the value changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.revision += 1;
        log::info!(
            "physics pruning {} globally",
            if enabled { "enabled" } else { "disabled" }
        );
        true
    }

    /// Flip and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Bumped on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for GlobalGate {
    fn default() -> Self {
        Self::new(true)
    }
}
