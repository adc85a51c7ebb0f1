use crate::config::settings::{AppSettings, SettingsError};
use crate::macos::accessibility::PermissionStatus;
use crate::models::keyboard_mapping::{KeyboardMappingSet, ShortcutCombination};
use crate::models::snap_action::SnapAction;
use crate::services::window_manager::{WindowManager, WindowOperationError};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Result of handling one triggered shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum DispatchOutcome {
    Snapped { action: SnapAction },
    Failed { error: WindowOperationError },
    /// Shortcuts are turned off in settings
    Disabled,
    /// Accessibility permission has not been granted
    PermissionMissing,
    /// No action is bound to the combination
    Unbound,
}

impl DispatchOutcome {
    /// Text for a user-facing notification, if the outcome warrants one
    pub fn notification(&self) -> Option<String> {
        match self {
            DispatchOutcome::Failed { error } => Some(error.to_string()),
            DispatchOutcome::PermissionMissing => {
                Some(WindowOperationError::PermissionDenied.to_string())
            }
            _ => None,
        }
    }
}

/// Metrics for keyboard handler operations
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardHandlerMetrics {
    pub triggered_events: u64,
    pub snaps: u64,
    pub failures: u64,
    pub skipped_disabled: u64,
    pub skipped_permission: u64,
    pub unbound: u64,
}

struct HandlerState {
    settings: AppSettings,
    mappings: KeyboardMappingSet,
}

/// Turns triggered shortcuts into snaps, gated by settings and permission
pub struct KeyboardHandler {
    manager: Arc<WindowManager>,
    state: RwLock<HandlerState>,
    metrics: RwLock<KeyboardHandlerMetrics>,
}

impl KeyboardHandler {
    pub fn new(manager: Arc<WindowManager>, settings: AppSettings) -> Result<Self, SettingsError> {
        let mappings = settings.keyboard_mappings()?;
        Ok(Self {
            manager,
            state: RwLock::new(HandlerState { settings, mappings }),
            metrics: RwLock::new(KeyboardHandlerMetrics::default()),
        })
    }

    /// Swap in new settings. The previous bindings stay active on error.
    pub fn update_settings(&self, settings: AppSettings) -> Result<(), SettingsError> {
        let mappings = settings.keyboard_mappings()?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.settings = settings;
        state.mappings = mappings;
        debug!(enabled = state.settings.enabled, "keyboard settings updated");
        Ok(())
    }

    pub fn settings(&self) -> AppSettings {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .settings
            .clone()
    }

    /// Snapshot of the active bindings
    pub fn mappings(&self) -> KeyboardMappingSet {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mappings
            .clone()
    }

    /// Resolve `combination` to its bound action and dispatch it.
    pub fn handle_shortcut(&self, combination: &ShortcutCombination) -> DispatchOutcome {
        let action = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mappings
            .find_by_shortcut(combination)
            .map(|mapping| mapping.action);

        match action {
            Some(action) => self.dispatch(action),
            None => {
                debug!(shortcut = %combination, "no action bound to shortcut");
                self.record(|metrics| metrics.unbound += 1);
                DispatchOutcome::Unbound
            }
        }
    }

    /// Run `action` unless shortcuts are disabled or permission is missing.
    pub fn dispatch(&self, action: SnapAction) -> DispatchOutcome {
        self.record(|metrics| metrics.triggered_events += 1);

        let enabled = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .settings
            .enabled;
        if !enabled {
            debug!(%action, "shortcuts disabled, ignoring");
            self.record(|metrics| metrics.skipped_disabled += 1);
            return DispatchOutcome::Disabled;
        }

        let permission = self.manager.permission_status();
        if permission != PermissionStatus::Granted {
            warn!(%action, ?permission, "accessibility permission missing, ignoring shortcut");
            self.record(|metrics| metrics.skipped_permission += 1);
            return DispatchOutcome::PermissionMissing;
        }

        match self.manager.snap(action) {
            Ok(()) => {
                info!(%action, "window snapped");
                self.record(|metrics| metrics.snaps += 1);
                DispatchOutcome::Snapped { action }
            }
            Err(error) => {
                warn!(%action, kind = error.kind(), "snap failed: {error}");
                self.record(|metrics| metrics.failures += 1);
                DispatchOutcome::Failed { error }
            }
        }
    }

    pub fn metrics(&self) -> KeyboardHandlerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, update: impl FnOnce(&mut KeyboardHandlerMetrics)) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut *metrics);
    }
}
