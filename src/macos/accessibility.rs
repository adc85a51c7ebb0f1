//! Accessibility seam: resolving the focused window and reading/writing its
//! geometry.
//!
//! The snapping engine only sees [`AccessibilityProvider`] and
//! [`WindowHandle`]. On macOS [`SystemAccessibilityProvider`] talks to the
//! ApplicationServices AX API; everywhere else it reports
//! [`AxError::Unsupported`]. [`InMemoryAccessibilityProvider`] backs tests,
//! benches and dry runs.
//!
//! All real AX calls must be made from the thread that owns the main run loop.

use crate::models::geometry::{AxSpace, Point, Rect, Size};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Failures reported by the accessibility layer, decoded from `AXError` codes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxError {
    #[error("accessibility API is disabled for this process")]
    ApiDisabled,

    #[error("accessibility element is no longer valid")]
    InvalidElement,

    #[error("attribute is not supported by this element")]
    AttributeUnsupported,

    #[error("attribute has no value")]
    NoValue,

    #[error("the target application could not complete the request")]
    CannotComplete,

    #[error("accessibility call failed")]
    Failure,

    #[error("window control is not available on this platform")]
    Unsupported,

    #[error("accessibility error code {0}")]
    Other(i32),
}

impl AxError {
    pub const SUCCESS: i32 = 0;

    /// Decode an `AXError` status; `None` for success.
    pub fn from_code(code: i32) -> Option<Self> {
        let error = match code {
            Self::SUCCESS => return None,
            -25200 => AxError::Failure,
            -25202 => AxError::InvalidElement,
            -25204 => AxError::CannotComplete,
            -25205 => AxError::AttributeUnsupported,
            -25211 => AxError::ApiDisabled,
            -25212 => AxError::NoValue,
            other => AxError::Other(other),
        };
        Some(error)
    }

    pub fn check(code: i32) -> Result<(), Self> {
        match Self::from_code(code) {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}

/// Tracks accessibility permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PermissionStatus {
    Unknown,
    Granted,
    Denied,
}

/// Window attributes the engine writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowAttribute {
    Position,
    Size,
}

impl WindowAttribute {
    pub fn ax_name(self) -> &'static str {
        match self {
            WindowAttribute::Position => "AXPosition",
            WindowAttribute::Size => "AXSize",
        }
    }
}

/// Capabilities of a single resolved window.
///
/// A handle is valid for one operation only and must never be cached.
#[cfg_attr(test, mockall::automock)]
pub trait WindowHandle {
    /// Current frame in AX space
    fn frame(&self) -> Result<Rect<AxSpace>, AxError>;

    /// Whether the window is presented in its own fullscreen space
    fn is_fullscreen(&self) -> Result<bool, AxError>;

    fn is_settable(&self, attribute: WindowAttribute) -> Result<bool, AxError>;

    /// Move the window's top-left corner (AX space)
    fn set_position(&self, position: Point) -> Result<(), AxError>;

    fn set_size(&self, size: Size) -> Result<(), AxError>;
}

/// Abstraction for interacting with macOS Accessibility APIs
#[cfg_attr(test, mockall::automock)]
pub trait AccessibilityProvider: Send + Sync {
    /// Retrieve permission status without prompting the user
    fn permission_status(&self) -> PermissionStatus;

    /// The focused window of the active application, if any
    fn frontmost_window(&self) -> Result<Option<Box<dyn WindowHandle>>, AxError>;
}

/// Provider backed by the real accessibility API
#[derive(Debug, Default)]
pub struct SystemAccessibilityProvider;

impl SystemAccessibilityProvider {
    pub fn new() -> Self {
        Self
    }
}

impl AccessibilityProvider for SystemAccessibilityProvider {
    fn permission_status(&self) -> PermissionStatus {
        match crate::macos::permissions::is_accessibility_permission_granted() {
            Ok(true) => PermissionStatus::Granted,
            Ok(false) => PermissionStatus::Denied,
            Err(_) => PermissionStatus::Unknown,
        }
    }

    fn frontmost_window(&self) -> Result<Option<Box<dyn WindowHandle>>, AxError> {
        platform::frontmost_window()
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::{AxError, WindowAttribute, WindowHandle};
    use crate::models::geometry::{AxSpace, Point, Rect, Size};
    use cocoa::base::{id, nil};
    use core_foundation::base::{CFType, TCFType};
    use core_foundation::boolean::CFBoolean;
    use core_foundation::string::CFString;
    use core_foundation_sys::base::{CFRelease, CFTypeRef};
    use core_foundation_sys::string::CFStringRef;
    use core_graphics::geometry::{CGPoint, CGSize};
    use objc::{class, msg_send, sel, sel_impl};
    use std::ffi::c_void;
    use std::ptr;

    type AXUIElementRef = CFTypeRef;

    const AX_VALUE_TYPE_CGPOINT: u32 = 1;
    const AX_VALUE_TYPE_CGSIZE: u32 = 2;

    const AX_FOCUSED_WINDOW: &str = "AXFocusedWindow";
    const AX_FULLSCREEN: &str = "AXFullScreen";

    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
        fn AXUIElementCopyAttributeValue(
            element: AXUIElementRef,
            attribute: CFStringRef,
            value: *mut CFTypeRef,
        ) -> i32;
        fn AXUIElementSetAttributeValue(
            element: AXUIElementRef,
            attribute: CFStringRef,
            value: CFTypeRef,
        ) -> i32;
        fn AXUIElementIsAttributeSettable(
            element: AXUIElementRef,
            attribute: CFStringRef,
            settable: *mut u8,
        ) -> i32;
        fn AXValueCreate(value_type: u32, value: *const c_void) -> CFTypeRef;
        fn AXValueGetValue(value: CFTypeRef, value_type: u32, value_out: *mut c_void) -> bool;
    }

    /// Owned `AXUIElementRef`, released on drop
    #[derive(Debug)]
    struct AxElement(AXUIElementRef);

    impl Drop for AxElement {
        fn drop(&mut self) {
            if !self.0.is_null() {
                unsafe { CFRelease(self.0) };
            }
        }
    }

    impl AxElement {
        fn application(pid: i32) -> Result<Self, AxError> {
            let element = unsafe { AXUIElementCreateApplication(pid) };
            if element.is_null() {
                return Err(AxError::InvalidElement);
            }
            Ok(Self(element))
        }

        /// Copy an attribute value; the caller owns the returned reference.
        fn copy_attribute_raw(&self, name: &str) -> Result<CFTypeRef, AxError> {
            let attribute = CFString::new(name);
            let mut value: CFTypeRef = ptr::null();
            let code = unsafe {
                AXUIElementCopyAttributeValue(self.0, attribute.as_concrete_TypeRef(), &mut value)
            };
            AxError::check(code)?;
            if value.is_null() {
                return Err(AxError::NoValue);
            }
            Ok(value)
        }

        fn copy_attribute(&self, name: &str) -> Result<CFType, AxError> {
            let value = self.copy_attribute_raw(name)?;
            Ok(unsafe { CFType::wrap_under_create_rule(value) })
        }

        fn copy_ax_value<T: Default>(&self, name: &str, value_type: u32) -> Result<T, AxError> {
            let value = self.copy_attribute(name)?;
            let mut out = T::default();
            let ok = unsafe {
                AXValueGetValue(
                    value.as_CFTypeRef(),
                    value_type,
                    &mut out as *mut T as *mut c_void,
                )
            };
            if ok {
                Ok(out)
            } else {
                Err(AxError::NoValue)
            }
        }

        fn set_ax_value<T>(&self, name: &str, value_type: u32, value: &T) -> Result<(), AxError> {
            let raw = unsafe { AXValueCreate(value_type, value as *const T as *const c_void) };
            if raw.is_null() {
                return Err(AxError::Failure);
            }
            let value = unsafe { CFType::wrap_under_create_rule(raw) };
            let attribute = CFString::new(name);
            let code = unsafe {
                AXUIElementSetAttributeValue(
                    self.0,
                    attribute.as_concrete_TypeRef(),
                    value.as_CFTypeRef(),
                )
            };
            AxError::check(code)
        }
    }

    #[derive(Debug)]
    struct SystemWindow {
        element: AxElement,
    }

    impl WindowHandle for SystemWindow {
        fn frame(&self) -> Result<Rect<AxSpace>, AxError> {
            let origin: CGPoint = self.element.copy_ax_value(
                WindowAttribute::Position.ax_name(),
                AX_VALUE_TYPE_CGPOINT,
            )?;
            let size: CGSize = self
                .element
                .copy_ax_value(WindowAttribute::Size.ax_name(), AX_VALUE_TYPE_CGSIZE)?;

            Rect::new(origin.x, origin.y, size.width, size.height).map_err(|_| AxError::NoValue)
        }

        fn is_fullscreen(&self) -> Result<bool, AxError> {
            let value = self.element.copy_attribute(AX_FULLSCREEN)?;
            value
                .downcast::<CFBoolean>()
                .map(bool::from)
                .ok_or(AxError::NoValue)
        }

        fn is_settable(&self, attribute: WindowAttribute) -> Result<bool, AxError> {
            let name = CFString::new(attribute.ax_name());
            let mut settable: u8 = 0;
            let code = unsafe {
                AXUIElementIsAttributeSettable(
                    self.element.0,
                    name.as_concrete_TypeRef(),
                    &mut settable,
                )
            };
            AxError::check(code)?;
            Ok(settable != 0)
        }

        fn set_position(&self, position: Point) -> Result<(), AxError> {
            let point = CGPoint::new(position.x, position.y);
            self.element.set_ax_value(
                WindowAttribute::Position.ax_name(),
                AX_VALUE_TYPE_CGPOINT,
                &point,
            )
        }

        fn set_size(&self, size: Size) -> Result<(), AxError> {
            let size = CGSize::new(size.width, size.height);
            self.element
                .set_ax_value(WindowAttribute::Size.ax_name(), AX_VALUE_TYPE_CGSIZE, &size)
        }
    }

    fn frontmost_pid() -> Option<i32> {
        unsafe {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            if workspace == nil {
                return None;
            }
            let application: id = msg_send![workspace, frontmostApplication];
            if application == nil {
                return None;
            }
            let pid: i32 = msg_send![application, processIdentifier];
            Some(pid)
        }
    }

    pub(super) fn frontmost_window() -> Result<Option<Box<dyn WindowHandle>>, AxError> {
        let Some(pid) = frontmost_pid() else {
            return Ok(None);
        };

        let application = AxElement::application(pid)?;
        match application.copy_attribute_raw(AX_FOCUSED_WINDOW) {
            Ok(window) => Ok(Some(Box::new(SystemWindow {
                element: AxElement(window),
            }))),
            Err(AxError::NoValue) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use super::{AxError, WindowHandle};

    pub(super) fn frontmost_window() -> Result<Option<Box<dyn WindowHandle>>, AxError> {
        Err(AxError::Unsupported)
    }
}

/// A recorded geometry write on an [`InMemoryWindow`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowMutation {
    Position(Point),
    Size(Size),
}

#[derive(Debug, Clone)]
struct InMemoryWindowState {
    frame: Option<Rect<AxSpace>>,
    fullscreen: bool,
    position_settable: bool,
    size_settable: bool,
    position_error: Option<AxError>,
    size_error: Option<AxError>,
    mutations: Vec<WindowMutation>,
    queries: usize,
}

/// Window stand-in that applies writes to its own frame and records them.
///
/// Clones share state, so a test can keep one clone while the provider hands
/// another to the engine.
#[derive(Debug, Clone)]
pub struct InMemoryWindow {
    state: Arc<RwLock<InMemoryWindowState>>,
}

impl InMemoryWindow {
    pub fn new(frame: Rect<AxSpace>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryWindowState {
                frame: Some(frame),
                fullscreen: false,
                position_settable: true,
                size_settable: true,
                position_error: None,
                size_error: None,
                mutations: Vec::new(),
                queries: 0,
            })),
        }
    }

    /// A window whose geometry cannot be read
    pub fn without_frame() -> Self {
        let window = Self::new(Rect::from_raw(0.0, 0.0, 0.0, 0.0));
        window.write().frame = None;
        window
    }

    pub fn fullscreen(self, fullscreen: bool) -> Self {
        self.write().fullscreen = fullscreen;
        self
    }

    pub fn settable(self, position: bool, size: bool) -> Self {
        {
            let mut state = self.write();
            state.position_settable = position;
            state.size_settable = size;
        }
        self
    }

    /// Make subsequent position writes fail with `error`
    pub fn failing_position(self, error: AxError) -> Self {
        self.write().position_error = Some(error);
        self
    }

    /// Make subsequent size writes fail with `error`
    pub fn failing_size(self, error: AxError) -> Self {
        self.write().size_error = Some(error);
        self
    }

    pub fn current_frame(&self) -> Option<Rect<AxSpace>> {
        self.read().frame
    }

    pub fn mutations(&self) -> Vec<WindowMutation> {
        self.read().mutations.clone()
    }

    /// Number of fullscreen/settability queries answered
    pub fn query_count(&self) -> usize {
        self.read().queries
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryWindowState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryWindowState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WindowHandle for InMemoryWindow {
    fn frame(&self) -> Result<Rect<AxSpace>, AxError> {
        self.read().frame.ok_or(AxError::NoValue)
    }

    fn is_fullscreen(&self) -> Result<bool, AxError> {
        let mut state = self.write();
        state.queries += 1;
        Ok(state.fullscreen)
    }

    fn is_settable(&self, attribute: WindowAttribute) -> Result<bool, AxError> {
        let mut state = self.write();
        state.queries += 1;
        Ok(match attribute {
            WindowAttribute::Position => state.position_settable,
            WindowAttribute::Size => state.size_settable,
        })
    }

    fn set_position(&self, position: Point) -> Result<(), AxError> {
        let mut state = self.write();
        if let Some(error) = state.position_error {
            return Err(error);
        }
        state.mutations.push(WindowMutation::Position(position));
        if let Some(frame) = state.frame.as_mut() {
            frame.x = position.x;
            frame.y = position.y;
        }
        Ok(())
    }

    fn set_size(&self, size: Size) -> Result<(), AxError> {
        let mut state = self.write();
        if let Some(error) = state.size_error {
            return Err(error);
        }
        state.mutations.push(WindowMutation::Size(size));
        if let Some(frame) = state.frame.as_mut() {
            frame.width = size.width;
            frame.height = size.height;
        }
        Ok(())
    }
}

/// Simple in-memory provider used for testing the higher level services
#[derive(Debug)]
pub struct InMemoryAccessibilityProvider {
    frontmost: RwLock<Option<InMemoryWindow>>,
    frontmost_error: RwLock<Option<AxError>>,
    status: RwLock<PermissionStatus>,
}

impl InMemoryAccessibilityProvider {
    /// Provider with `window` focused and permission granted
    pub fn new_with(window: InMemoryWindow) -> Self {
        Self {
            frontmost: RwLock::new(Some(window)),
            frontmost_error: RwLock::new(None),
            status: RwLock::new(PermissionStatus::Granted),
        }
    }

    /// Provider with no focused window and permission granted
    pub fn empty() -> Self {
        let provider = Self::default();
        provider.set_permission_status(PermissionStatus::Granted);
        provider
    }

    pub fn set_permission_status(&self, status: PermissionStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn set_frontmost(&self, window: Option<InMemoryWindow>) {
        *self.frontmost.write().unwrap_or_else(PoisonError::into_inner) = window;
    }

    /// Make frontmost-window resolution fail with `error`
    pub fn set_frontmost_error(&self, error: Option<AxError>) {
        *self
            .frontmost_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }
}

impl AccessibilityProvider for InMemoryAccessibilityProvider {
    fn permission_status(&self) -> PermissionStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn frontmost_window(&self) -> Result<Option<Box<dyn WindowHandle>>, AxError> {
        if let Some(error) = *self
            .frontmost_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(error);
        }

        let frontmost = self.frontmost.read().unwrap_or_else(PoisonError::into_inner);
        Ok(frontmost
            .clone()
            .map(|window| Box::new(window) as Box<dyn WindowHandle>))
    }
}

impl Default for InMemoryAccessibilityProvider {
    fn default() -> Self {
        Self {
            frontmost: RwLock::new(None),
            frontmost_error: RwLock::new(None),
            status: RwLock::new(PermissionStatus::Unknown),
        }
    }
}
