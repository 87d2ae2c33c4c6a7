//! Location permission gate
//!
//! Samples only reach the tracker while permission is granted. The host
//! reports transitions; the gate remembers the latest state.

use crate::domain::types::PermissionState;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct PermissionGate {
    state: PermissionState,
}

impl PermissionGate {
    pub fn new(initial: PermissionState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    #[inline]
    pub fn allows_samples(&self) -> bool {
        self.state == PermissionState::Granted
    }

    /// Apply a reported state
    ///
    /// Returns the previous state if it changed, None for a repeat report.
    pub fn transition(&mut self, next: PermissionState) -> Option<PermissionState> {
        if next == self.state {
            return None;
        }
        let previous = std::mem::replace(&mut self.state, next);

        if next.is_blocked() {
            warn!(from = %previous.as_str(), to = %next.as_str(), "location_permission_required");
        } else {
            info!(from = %previous.as_str(), to = %next.as_str(), "permission_changed");
        }
        Some(previous)
    }
}
