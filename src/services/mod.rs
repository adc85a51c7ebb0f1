//! Core services for TileSnap

pub mod keyboard_handler;
pub mod screen_calculator;
pub mod window_manager;

pub use keyboard_handler::*;
pub use screen_calculator::*;
pub use window_manager::*;
