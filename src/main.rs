//! TileSnap - Keyboard-Driven Window Snapping for macOS
//!
//! Command-line entry point. Window control must run on the main thread, so
//! everything here stays synchronous.

use tilesnap::{cli::run_cli, Result};

fn main() -> Result<()> {
    run_cli()
}
