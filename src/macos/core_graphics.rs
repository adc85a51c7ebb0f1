//! Display enumeration seam.
//!
//! Displays are re-enumerated on every call since they can be hot-plugged or
//! rearranged at any time. Frames are reported in screen space, which is
//! what AppKit's `NSScreen` uses natively.

use crate::models::display::DisplayDescriptor;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("display enumeration is not available on this platform")]
    Unsupported,

    #[error("display enumeration failed: {0}")]
    Unavailable(String),
}

/// Abstraction over display enumeration
#[cfg_attr(test, mockall::automock)]
pub trait DisplayProvider: Send + Sync {
    /// Snapshot all attached displays, in platform enumeration order
    fn displays(&self) -> Result<Vec<DisplayDescriptor>, DisplayError>;
}

/// Display provider backed by `NSScreen`
#[derive(Debug, Default)]
pub struct SystemDisplayProvider;

impl SystemDisplayProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayProvider for SystemDisplayProvider {
    fn displays(&self) -> Result<Vec<DisplayDescriptor>, DisplayError> {
        platform::displays()
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::DisplayError;
    use crate::models::display::DisplayDescriptor;
    use crate::models::geometry::Rect;
    use cocoa::appkit::NSScreen;
    use cocoa::base::{id, nil};
    use cocoa::foundation::{NSArray, NSAutoreleasePool, NSRect, NSString};
    use objc::{msg_send, sel, sel_impl};

    fn to_rect(rect: NSRect) -> Result<Rect, DisplayError> {
        Rect::new(rect.origin.x, rect.origin.y, rect.size.width, rect.size.height)
            .map_err(|err| DisplayError::Unavailable(err.to_string()))
    }

    unsafe fn display_number(screen: id, key: id) -> u32 {
        let description: id = screen.deviceDescription();
        if description == nil {
            return 0;
        }
        let number: id = msg_send![description, objectForKey: key];
        if number == nil {
            return 0;
        }
        msg_send![number, unsignedIntValue]
    }

    pub(super) fn displays() -> Result<Vec<DisplayDescriptor>, DisplayError> {
        unsafe {
            let pool = NSAutoreleasePool::new(nil);
            let result = collect_displays();
            pool.drain();
            result
        }
    }

    unsafe fn collect_displays() -> Result<Vec<DisplayDescriptor>, DisplayError> {
        let screens: id = NSScreen::screens(nil);
        if screens == nil {
            return Err(DisplayError::Unavailable("NSScreen.screens returned nil".into()));
        }

        let key = NSString::alloc(nil).init_str("NSScreenNumber");
        let count = screens.count();
        let mut displays = Vec::with_capacity(count as usize);

        for index in 0..count {
            let screen: id = screens.objectAtIndex(index);
            if screen == nil {
                continue;
            }

            let descriptor = DisplayDescriptor::new(
                display_number(screen, key),
                to_rect(NSScreen::frame(screen))?,
                to_rect(NSScreen::visibleFrame(screen))?,
            );
            displays.push(descriptor);
        }

        let _: () = msg_send![key, release];
        Ok(displays)
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use super::DisplayError;
    use crate::models::display::DisplayDescriptor;

    pub(super) fn displays() -> Result<Vec<DisplayDescriptor>, DisplayError> {
        Err(DisplayError::Unsupported)
    }
}

/// In-memory display provider for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryDisplayProvider {
    displays: RwLock<Vec<DisplayDescriptor>>,
}

impl InMemoryDisplayProvider {
    /// Enumeration order is preserved as given.
    pub fn new_with(displays: Vec<DisplayDescriptor>) -> Self {
        Self {
            displays: RwLock::new(displays),
        }
    }

    /// Swap the attached displays, as a hot-plug would
    pub fn set_displays(&self, displays: Vec<DisplayDescriptor>) {
        *self.displays.write().unwrap_or_else(PoisonError::into_inner) = displays;
    }
}

impl DisplayProvider for InMemoryDisplayProvider {
    fn displays(&self) -> Result<Vec<DisplayDescriptor>, DisplayError> {
        Ok(self
            .displays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
