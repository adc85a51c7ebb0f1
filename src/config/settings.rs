use crate::models::keyboard_mapping::{
    KeyboardMapping, KeyboardMappingError, KeyboardMappingSet, ShortcutCombination,
};
use crate::models::snap_action::SnapAction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid shortcut for {action}: {source}")]
    InvalidShortcut {
        action: SnapAction,
        #[source]
        source: KeyboardMappingError,
    },
    #[error("Validation error: {0}")]
    Validation(#[source] KeyboardMappingError),
}

/// Shortcut text per action. Missing entries fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutBindings {
    pub maximize: String,
    pub left: String,
    pub right: String,
    pub left_third: String,
    pub center_third: String,
    pub right_third: String,
}

impl ShortcutBindings {
    pub fn get(&self, action: SnapAction) -> &str {
        match action {
            SnapAction::Maximize => &self.maximize,
            SnapAction::Left => &self.left,
            SnapAction::Right => &self.right,
            SnapAction::LeftThird => &self.left_third,
            SnapAction::CenterThird => &self.center_third,
            SnapAction::RightThird => &self.right_third,
        }
    }

    pub fn set(&mut self, action: SnapAction, shortcut: impl Into<String>) {
        let slot = match action {
            SnapAction::Maximize => &mut self.maximize,
            SnapAction::Left => &mut self.left,
            SnapAction::Right => &mut self.right,
            SnapAction::LeftThird => &mut self.left_third,
            SnapAction::CenterThird => &mut self.center_third,
            SnapAction::RightThird => &mut self.right_third,
        };
        *slot = shortcut.into();
    }
}

impl Default for ShortcutBindings {
    fn default() -> Self {
        let default = |action| ShortcutCombination::default_for(action).to_string();
        Self {
            maximize: default(SnapAction::Maximize),
            left: default(SnapAction::Left),
            right: default(SnapAction::Right),
            left_third: default(SnapAction::LeftThird),
            center_third: default(SnapAction::CenterThird),
            right_third: default(SnapAction::RightThird),
        }
    }
}

/// User preferences persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Whether shortcuts trigger snaps at all
    pub enabled: bool,
    /// Stored for the host application; tilesnap itself never registers a login item
    pub launch_at_login: bool,
    pub shortcuts: ShortcutBindings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            launch_at_login: false,
            shortcuts: ShortcutBindings::default(),
        }
    }
}

impl AppSettings {
    /// Parse every binding into a conflict-free mapping set.
    pub fn keyboard_mappings(&self) -> Result<KeyboardMappingSet, SettingsError> {
        let mut set = KeyboardMappingSet::new();
        for action in SnapAction::ALL {
            let shortcut = self
                .shortcuts
                .get(action)
                .parse::<ShortcutCombination>()
                .map_err(|source| SettingsError::InvalidShortcut { action, source })?;

            set.add_mapping(KeyboardMapping { shortcut, action })
                .map_err(SettingsError::Validation)?;
        }
        Ok(set)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.keyboard_mappings().map(|_| ())
    }
}

#[derive(Debug, Clone)]
pub struct SettingsConfig {
    pub config_dir: PathBuf,
    pub file_name: String,
}

impl SettingsConfig {
    /// Use an explicit settings file instead of the default location
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| SETTINGS_FILE.to_string());

        Self {
            config_dir,
            file_name,
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = home_dir.join(".config").join("tilesnap");

        Self {
            config_dir,
            file_name: SETTINGS_FILE.to_string(),
        }
    }
}

/// Reads and writes [`AppSettings`] as TOML
pub struct SettingsStore {
    config: SettingsConfig,
}

impl SettingsStore {
    pub fn new(config: SettingsConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> PathBuf {
        self.config.config_dir.join(&self.config.file_name)
    }

    /// Create the settings directory and a default file if absent.
    /// Returns whether a file was written.
    pub fn initialize(&self) -> Result<bool, SettingsError> {
        if !self.config.config_dir.exists() {
            fs::create_dir_all(&self.config.config_dir)?;
        }

        let path = self.path();
        if path.exists() {
            return Ok(false);
        }

        self.save(&AppSettings::default())?;
        Ok(true)
    }

    /// Missing file yields defaults.
    pub fn load(&self) -> Result<AppSettings, SettingsError> {
        let path = self.path();
        if !path.exists() {
            debug!(path = %path.display(), "settings file absent, using defaults");
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&path)?;
        let settings: AppSettings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        settings.validate()?;

        let path = self.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(settings)?;

        // Atomic write
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(temp_path, &path)?;

        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(SettingsConfig::default())
    }
}
