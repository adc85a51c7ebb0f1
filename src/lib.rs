//! TileSnap - Keyboard-Driven Window Snapping for macOS
//!
//! TileSnap moves the focused window to a fixed layout (maximized, left/right
//! half, or one of three vertical thirds) on whichever display the window
//! mostly occupies. The snapping engine lives in [`services`]; the platform
//! seams it talks through live in [`macos`].

pub mod cli;
pub mod config;
pub mod logging;
pub mod macos;
pub mod models;
pub mod services;

pub use models::*;
pub use services::*;

/// Result type alias for TileSnap operations
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to TileSnap's caller layer
#[derive(thiserror::Error, Debug)]
pub enum TileSnapError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Unknown snap action: {0}")]
    UnknownAction(String),

    #[error("macOS API error: {0}")]
    MacOSAPIError(String),
}
