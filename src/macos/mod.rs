//! macOS integration layer for TileSnap
//!
//! These modules provide safe, testable abstractions over the macOS
//! Accessibility and AppKit display APIs. The concrete implementations talk to
//! the platform while unit tests rely on in-memory stubs or mocks.

pub mod accessibility;
pub mod core_graphics;
pub mod permissions;

pub use accessibility::*;
pub use core_graphics::*;
pub use permissions::*;
