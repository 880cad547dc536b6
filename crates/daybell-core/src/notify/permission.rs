//! Notification permission contract.

use serde::{Deserialize, Serialize};

use crate::platform::NotificationSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not asked yet.
    #[default]
    Default,
}

/// Result of asking for permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionOutcome {
    Granted,
    /// Prompt was dismissed; asking again later is allowed.
    Dismissed,
    /// Denied earlier. The user has to re-enable it in system settings.
    OpenSystemSettings,
}

/// Tracks permission and refuses to prompt again after a denial.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    state: PermissionState,
}

impl PermissionGate {
    pub fn new(state: PermissionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    pub fn is_granted(&self) -> bool {
        self.state == PermissionState::Granted
    }

    /// Re-read the surface's current state (it may change outside the app).
    pub fn refresh(&mut self, surface: &dyn NotificationSurface) -> PermissionState {
        self.state = surface.permission();
        self.state
    }

    pub fn request(&mut self, surface: &mut dyn NotificationSurface) -> PermissionOutcome {
        match self.state {
            PermissionState::Granted => PermissionOutcome::Granted,
            PermissionState::Denied => PermissionOutcome::OpenSystemSettings,
            PermissionState::Default => {
                self.state = surface.request_permission();
                tracing::info!(state = ?self.state, "notification permission requested");
                match self.state {
                    PermissionState::Granted => PermissionOutcome::Granted,
                    PermissionState::Denied => PermissionOutcome::OpenSystemSettings,
                    PermissionState::Default => PermissionOutcome::Dismissed,
                }
            }
        }
    }
}
