//! Configuration management for TileSnap

pub mod settings;

pub use settings::{AppSettings, SettingsConfig, SettingsError, SettingsStore, ShortcutBindings};
