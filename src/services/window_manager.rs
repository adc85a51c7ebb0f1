//! Snap orchestration: resolve the focused window, pick its display, compute
//! the target frame and commit it through the accessibility seam.
//!
//! Every call re-resolves the window and re-enumerates displays. Nothing is
//! cached between calls.

use crate::macos::accessibility::{
    AccessibilityProvider, AxError, PermissionStatus, SystemAccessibilityProvider,
    WindowAttribute, WindowHandle,
};
use crate::macos::core_graphics::{DisplayError, DisplayProvider, SystemDisplayProvider};
use crate::models::display::DisplayDescriptor;
use crate::models::geometry::{AxSpace, Rect, ScreenSpace};
use crate::models::snap_action::SnapAction;
use crate::services::screen_calculator::ScreenCalculator;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, debug_span, trace};

/// Why a snap did not happen. The messages are meant for end users.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowOperationError {
    #[error("No window to operate on was found")]
    NoFrontmostWindow,

    #[error("Windows in full screen cannot be moved")]
    FullScreenWindow,

    #[error("Accessibility permission is required")]
    PermissionDenied,

    #[error("This window cannot be moved or resized")]
    NotResizable,

    #[error("An unexpected error occurred")]
    Unknown,
}

impl WindowOperationError {
    /// Stable identifier, identical to the serialized form
    pub fn kind(self) -> &'static str {
        match self {
            WindowOperationError::NoFrontmostWindow => "noFrontmostWindow",
            WindowOperationError::FullScreenWindow => "fullScreenWindow",
            WindowOperationError::PermissionDenied => "permissionDenied",
            WindowOperationError::NotResizable => "notResizable",
            WindowOperationError::Unknown => "unknown",
        }
    }

    /// Translate a failure to resolve the focused window.
    fn from_resolve_error(error: AxError) -> Self {
        match error {
            AxError::ApiDisabled => WindowOperationError::PermissionDenied,
            AxError::InvalidElement
            | AxError::NoValue
            | AxError::AttributeUnsupported
            | AxError::CannotComplete
            | AxError::Failure => WindowOperationError::NoFrontmostWindow,
            AxError::Unsupported | AxError::Other(_) => WindowOperationError::Unknown,
        }
    }
}

/// Progress of a single snap, reported in trace events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapPhase {
    ResolvingWindow,
    CheckingConstraints,
    ComputingTarget,
    Committing,
}

impl SnapPhase {
    pub fn name(self) -> &'static str {
        match self {
            SnapPhase::ResolvingWindow => "resolvingWindow",
            SnapPhase::CheckingConstraints => "checkingConstraints",
            SnapPhase::ComputingTarget => "computingTarget",
            SnapPhase::Committing => "committing",
        }
    }
}

impl fmt::Display for SnapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a snap would do, computed without touching the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapPlan {
    pub action: SnapAction,
    /// Display the window will be placed on
    pub display: DisplayDescriptor,
    /// Full-frame height of the primary display used for conversion
    pub primary_height: f64,
    /// Current window frame; `None` when it could not be read
    pub source_ax: Option<Rect<AxSpace>>,
    pub source_screen: Option<Rect<ScreenSpace>>,
    pub target_screen: Rect<ScreenSpace>,
    pub target_ax: Rect<AxSpace>,
}

/// Moves and resizes the focused window according to a [`SnapAction`].
pub struct WindowManager {
    accessibility: Arc<dyn AccessibilityProvider>,
    displays: Arc<dyn DisplayProvider>,
    snap_lock: Mutex<()>,
}

impl WindowManager {
    pub fn new(
        accessibility: Arc<dyn AccessibilityProvider>,
        displays: Arc<dyn DisplayProvider>,
    ) -> Self {
        Self {
            accessibility,
            displays,
            snap_lock: Mutex::new(()),
        }
    }

    /// Construct a window manager backed by the platform providers.
    ///
    /// Real accessibility calls must come from the thread running the main
    /// run loop.
    pub fn with_system_providers() -> Self {
        Self::new(
            Arc::new(SystemAccessibilityProvider::new()),
            Arc::new(SystemDisplayProvider::new()),
        )
    }

    /// Snap the focused window.
    ///
    /// Position is written before size. If the position write fails the size
    /// is left alone; if only the size write fails the window may already
    /// have moved. Calling again is always safe.
    pub fn snap(&self, action: SnapAction) -> Result<(), WindowOperationError> {
        let _guard = self.snap_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let span = debug_span!("snap", action = %action);
        let _entered = span.enter();

        let (window, plan) = self.prepare(action)?;

        trace!(phase = %SnapPhase::Committing, target = %plan.target_ax);
        Self::commit(window.as_ref(), &plan.target_ax)?;

        debug!(display = plan.display.id, target = %plan.target_screen, "snapped window");
        Ok(())
    }

    /// Compute what [`WindowManager::snap`] would do, without committing.
    pub fn plan(&self, action: SnapAction) -> Result<SnapPlan, WindowOperationError> {
        let span = debug_span!("plan", action = %action);
        let _entered = span.enter();

        self.prepare(action).map(|(_, plan)| plan)
    }

    pub fn permission_status(&self) -> PermissionStatus {
        self.accessibility.permission_status()
    }

    /// Fresh display enumeration
    pub fn displays(&self) -> Result<Vec<DisplayDescriptor>, DisplayError> {
        self.displays.displays()
    }

    fn prepare(
        &self,
        action: SnapAction,
    ) -> Result<(Box<dyn WindowHandle>, SnapPlan), WindowOperationError> {
        trace!(phase = %SnapPhase::ResolvingWindow);
        let window = self.resolve_window()?;

        trace!(phase = %SnapPhase::CheckingConstraints);
        Self::check_constraints(window.as_ref())?;

        trace!(phase = %SnapPhase::ComputingTarget);
        let plan = self.compute_target(action, window.as_ref())?;

        Ok((window, plan))
    }

    fn resolve_window(&self) -> Result<Box<dyn WindowHandle>, WindowOperationError> {
        match self.accessibility.frontmost_window() {
            Ok(Some(window)) => Ok(window),
            Ok(None) => {
                debug!("no focused window");
                Err(WindowOperationError::NoFrontmostWindow)
            }
            Err(err) => {
                debug!(error = %err, "failed to resolve focused window");
                Err(WindowOperationError::from_resolve_error(err))
            }
        }
    }

    fn check_constraints(window: &dyn WindowHandle) -> Result<(), WindowOperationError> {
        // An unanswerable fullscreen query means the attribute is not exposed.
        let fullscreen = window.is_fullscreen().unwrap_or_else(|err| {
            trace!(error = %err, "fullscreen state unavailable");
            false
        });
        if fullscreen {
            return Err(WindowOperationError::FullScreenWindow);
        }

        for attribute in [WindowAttribute::Position, WindowAttribute::Size] {
            match window.is_settable(attribute) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(attribute = attribute.ax_name(), "attribute is not settable");
                    return Err(WindowOperationError::NotResizable);
                }
                Err(err) => {
                    debug!(attribute = attribute.ax_name(), error = %err, "settability query failed");
                    return Err(WindowOperationError::NotResizable);
                }
            }
        }

        Ok(())
    }

    fn compute_target(
        &self,
        action: SnapAction,
        window: &dyn WindowHandle,
    ) -> Result<SnapPlan, WindowOperationError> {
        let displays = self.displays.displays().map_err(|err| {
            debug!(error = %err, "display enumeration failed");
            WindowOperationError::Unknown
        })?;
        let primary_height =
            ScreenCalculator::primary_display_height(&displays).ok_or_else(|| {
                debug!("no displays attached");
                WindowOperationError::Unknown
            })?;

        let source_ax = match window.frame() {
            Ok(frame) => Some(frame),
            Err(err) => {
                debug!(error = %err, "window frame unavailable, using primary display");
                None
            }
        };
        let source_screen = source_ax.map(|frame| frame.to_screen(primary_height));

        let display = ScreenCalculator::target_screen(source_screen.as_ref(), &displays)
            .ok_or(WindowOperationError::Unknown)?
            .clone();
        let target_screen = ScreenCalculator::frame_for(action, &display);
        let target_ax = target_screen.to_ax(primary_height);

        Ok(SnapPlan {
            action,
            display,
            primary_height,
            source_ax,
            source_screen,
            target_screen,
            target_ax,
        })
    }

    fn commit(window: &dyn WindowHandle, target: &Rect<AxSpace>) -> Result<(), WindowOperationError> {
        window.set_position(target.origin()).map_err(|err| {
            debug!(error = %err, "position write rejected");
            WindowOperationError::PermissionDenied
        })?;

        window.set_size(target.size()).map_err(|err| {
            debug!(error = %err, "size write rejected after move");
            WindowOperationError::PermissionDenied
        })
    }
}
