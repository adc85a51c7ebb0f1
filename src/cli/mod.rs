//! Command-line interface for TileSnap
//!
//! Snaps the focused window from a terminal or script, previews snaps,
//! inspects displays and manages settings and permissions.

use crate::config::settings::{AppSettings, SettingsConfig, SettingsStore};
use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::macos::accessibility::PermissionStatus;
use crate::macos::permissions::{open_accessibility_settings, prompt_accessibility_permission};
use crate::models::snap_action::SnapAction;
use crate::services::{ScreenCalculator, WindowManager, WindowOperationError};
use crate::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// TileSnap command-line interface
#[derive(Parser)]
#[command(name = "tilesnap")]
#[command(about = "Keyboard-driven window snapping for macOS")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct TileSnapCli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable JSON output for machine-readable results
    #[arg(long, global = true)]
    pub json: bool,

    /// Log line format on stderr (overrides TILESNAP_LOG_FORMAT)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Snap the focused window (maximize, left, right, left-third, center-third, right-third)
    Snap { action: SnapAction },

    /// Show where the focused window would go without moving it
    Preview { action: SnapAction },

    /// List attached displays
    Displays,

    /// List snap actions and their shortcuts
    Shortcuts,

    /// Settings management commands
    Config(ConfigCommands),

    /// Permission management commands
    Permissions(PermissionCommands),
}

/// Settings management subcommands
#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub action: ConfigActions,
}

#[derive(Subcommand)]
pub enum ConfigActions {
    /// Show current settings
    Show,

    /// Write a default settings file if none exists
    Init,

    /// Print the settings file location
    Path,

    /// Turn shortcut handling on
    Enable,

    /// Turn shortcut handling off
    Disable,
}

/// Permission management subcommands
#[derive(Args)]
pub struct PermissionCommands {
    #[command(subcommand)]
    pub action: PermissionActions,
}

#[derive(Subcommand)]
pub enum PermissionActions {
    /// Check accessibility permission status
    Status,

    /// Ask the system to prompt for accessibility permission
    Request,

    /// Open the accessibility pane in System Settings
    Open,
}

/// Rendered result of one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub json: Value,
    pub text: String,
}

impl CommandOutput {
    fn new(json: Value, text: impl Into<String>) -> Self {
        Self {
            json,
            text: text.into(),
        }
    }

    pub fn render(&self, json_output: bool) -> Result<String> {
        if json_output {
            Ok(serde_json::to_string_pretty(&self.json)?)
        } else {
            Ok(self.text.clone())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayRow<'a> {
    #[serde(flatten)]
    display: &'a crate::models::display::DisplayDescriptor,
    primary: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortcutRow {
    action: SnapAction,
    name: &'static str,
    shortcut: String,
    symbols: String,
}

/// CLI command executor
pub struct TileSnapCliExecutor {
    manager: Arc<WindowManager>,
    store: SettingsStore,
}

impl TileSnapCliExecutor {
    pub fn new(manager: Arc<WindowManager>, store: SettingsStore) -> Self {
        Self { manager, store }
    }

    /// Execute a CLI command
    pub fn execute(&self, command: Commands) -> Result<CommandOutput> {
        match command {
            Commands::Snap { action } => self.snap(action),
            Commands::Preview { action } => self.preview(action),
            Commands::Displays => self.displays(),
            Commands::Shortcuts => self.shortcuts(),
            Commands::Config(config_cmd) => self.execute_config_command(config_cmd),
            Commands::Permissions(permission_cmd) => {
                self.execute_permission_command(permission_cmd)
            }
        }
    }

    fn snap(&self, action: SnapAction) -> Result<CommandOutput> {
        info!(%action, "Snapping focused window");
        crate::trace_performance!("snap", { self.manager.snap(action) })?;

        Ok(CommandOutput::new(
            json!({ "action": action, "snapped": true }),
            format!("Snapped window: {}", action.display_name()),
        ))
    }

    fn preview(&self, action: SnapAction) -> Result<CommandOutput> {
        let plan = self.manager.plan(action)?;

        let mut text = format!("{} on display {}\n", action.display_name(), plan.display.id);
        match plan.source_screen {
            Some(source) => writeln!(text, "  from:   {}", source)?,
            None => writeln!(text, "  from:   (window frame unavailable)")?,
        }
        writeln!(text, "  to:     {}", plan.target_screen)?;
        write!(text, "  to (ax): {}", plan.target_ax)?;

        Ok(CommandOutput::new(serde_json::to_value(&plan)?, text))
    }

    fn displays(&self) -> Result<CommandOutput> {
        let displays = self.manager.displays()?;
        let primary = ScreenCalculator::primary_display(&displays);

        let rows: Vec<DisplayRow<'_>> = displays
            .iter()
            .map(|display| DisplayRow {
                display,
                primary: primary.is_some_and(|primary| std::ptr::eq(primary, display)),
            })
            .collect();

        let mut text = String::new();
        if rows.is_empty() {
            text.push_str("No displays found.");
        }
        for row in &rows {
            writeln!(
                text,
                "Display {}{}",
                row.display.id,
                if row.primary { " (primary)" } else { "" }
            )?;
            writeln!(text, "  full:   {}", row.display.full_frame)?;
            writeln!(text, "  usable: {}", row.display.usable_frame)?;
        }

        Ok(CommandOutput::new(
            serde_json::to_value(&rows)?,
            text.trim_end().to_string(),
        ))
    }

    fn shortcuts(&self) -> Result<CommandOutput> {
        let settings = self.store.load()?;
        let mappings = settings.keyboard_mappings()?;

        let rows: Vec<ShortcutRow> = SnapAction::ALL
            .into_iter()
            .filter_map(|action| {
                mappings.shortcut_for(action).map(|shortcut| ShortcutRow {
                    action,
                    name: action.display_name(),
                    shortcut: shortcut.to_string(),
                    symbols: shortcut.symbols(),
                })
            })
            .collect();

        let mut text = String::from("Shortcuts:");
        for row in &rows {
            write!(text, "\n  {:<14} {:<8} {}", row.name, row.symbols, row.shortcut)?;
        }
        if !settings.enabled {
            text.push_str("\n(shortcuts are disabled)");
        }

        Ok(CommandOutput::new(
            json!({ "enabled": settings.enabled, "shortcuts": rows }),
            text,
        ))
    }

    fn execute_config_command(&self, cmd: ConfigCommands) -> Result<CommandOutput> {
        match cmd.action {
            ConfigActions::Show => {
                let settings = self.store.load()?;
                Ok(CommandOutput::new(
                    serde_json::to_value(&settings)?,
                    toml::to_string_pretty(&settings)?.trim_end().to_string(),
                ))
            }
            ConfigActions::Init => {
                let created = self.store.initialize()?;
                let path = self.store.path();
                let text = if created {
                    format!("Created default settings at {}", path.display())
                } else {
                    format!("Settings already exist at {}", path.display())
                };
                Ok(CommandOutput::new(
                    json!({ "path": path, "created": created }),
                    text,
                ))
            }
            ConfigActions::Path => {
                let path = self.store.path();
                Ok(CommandOutput::new(
                    json!({ "path": path }),
                    path.display().to_string(),
                ))
            }
            ConfigActions::Enable => self.set_enabled(true),
            ConfigActions::Disable => self.set_enabled(false),
        }
    }

    fn set_enabled(&self, enabled: bool) -> Result<CommandOutput> {
        let settings = AppSettings {
            enabled,
            ..self.store.load()?
        };
        self.store.save(&settings)?;
        debug!(enabled, "shortcut handling toggled");

        Ok(CommandOutput::new(
            json!({ "enabled": enabled }),
            format!(
                "Shortcuts {}",
                if enabled { "enabled" } else { "disabled" }
            ),
        ))
    }

    fn execute_permission_command(&self, cmd: PermissionCommands) -> Result<CommandOutput> {
        match cmd.action {
            PermissionActions::Status => {
                let status = self.manager.permission_status();
                let text = match status {
                    PermissionStatus::Granted => "Accessibility permission: granted",
                    PermissionStatus::Denied => "Accessibility permission: missing",
                    PermissionStatus::Unknown => "Accessibility permission: unknown",
                };
                Ok(CommandOutput::new(json!({ "accessibility": status }), text))
            }
            PermissionActions::Request => {
                let granted = prompt_accessibility_permission()?;
                let text = if granted {
                    "Accessibility permission is granted"
                } else {
                    "Accessibility permission is missing - approve TileSnap in System Settings"
                };
                Ok(CommandOutput::new(json!({ "granted": granted }), text))
            }
            PermissionActions::Open => {
                open_accessibility_settings()?;
                Ok(CommandOutput::new(
                    json!({ "opened": true }),
                    "Opened System Settings",
                ))
            }
        }
    }
}

/// JSON body printed for a failed command
fn error_json(error: &anyhow::Error) -> Value {
    let mut body = json!({
        "error": true,
        "message": error.to_string(),
    });
    if let Some(kind) = error.downcast_ref::<WindowOperationError>() {
        body["kind"] = json!(kind);
    }
    body
}

/// Run the CLI interface
pub fn run_cli() -> Result<()> {
    let cli = TileSnapCli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let store = match &cli.config {
        Some(path) => SettingsStore::new(SettingsConfig::with_path(path)),
        None => SettingsStore::default(),
    };
    let executor = TileSnapCliExecutor::new(Arc::new(WindowManager::with_system_providers()), store);

    match executor
        .execute(cli.command)
        .and_then(|output| output.render(cli.json))
    {
        Ok(rendered) => {
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
            } else {
                error!("Command failed: {:#}", e);
                eprintln!("Error: {:#}", e);
            }
            std::process::exit(1);
        }
    }
}
