//! Data model shared by the snapping engine and its callers

pub mod display;
pub mod geometry;
pub mod keyboard_mapping;
pub mod snap_action;

pub use display::*;
pub use geometry::*;
pub use keyboard_mapping::*;
pub use snap_action::*;
