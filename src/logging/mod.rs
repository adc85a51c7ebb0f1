//! Structured logging configuration for TileSnap
//!
//! Library code only emits `tracing` events. Installing a subscriber is left
//! to binaries through [`init_logging`].

use crate::{Result, TileSnapError};
use anyhow::Context;
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::{
    fmt::{self, time::UtcTime, writer::MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration for TileSnap
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: LogLevel,
    /// Log format (json, pretty, compact)
    pub format: LogFormat,
    /// Output destination (stderr, file, both)
    pub output: LogOutput,
    /// File path for file output
    pub file_path: Option<PathBuf>,
    /// Include source file and line numbers
    pub include_source: bool,
    /// Include thread names
    pub include_thread_names: bool,
    /// Trace every snap phase
    pub performance_tracing: bool,
}

/// Log levels supported by TileSnap
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format for development
    Pretty,
    /// Single-line format
    Compact,
    /// JSON format for log aggregation
    Json,
}

/// Log output destinations. Stdout is reserved for command output.
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum LogOutput {
    Stderr,
    File,
    Both,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            file_path: None,
            include_source: false,
            include_thread_names: false,
            performance_tracing: false,
        }
    }
}

impl LogConfig {
    /// Create a development-friendly log configuration
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            file_path: None,
            include_source: true,
            include_thread_names: true,
            performance_tracing: true,
        }
    }

    /// Log to `~/Library/Logs/tilesnap.log` as JSON
    pub fn production() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::File,
            file_path: Some(home_dir.join("Library").join("Logs").join("tilesnap.log")),
            include_source: false,
            include_thread_names: false,
            performance_tracing: false,
        }
    }

    /// Load configuration from `TILESNAP_LOG_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let choice = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let flag = |name: &str| choice(name).map(|value| value.eq_ignore_ascii_case("true"));
        let mut config = Self::default();

        if let Some(level) = choice("TILESNAP_LOG_LEVEL").and_then(|v| parse_choice(&v)) {
            config.level = level;
        }
        if let Some(format) = choice("TILESNAP_LOG_FORMAT").and_then(|v| parse_choice(&v)) {
            config.format = format;
        }
        if let Some(output) = choice("TILESNAP_LOG_OUTPUT").and_then(|v| parse_choice(&v)) {
            config.output = output;
        }
        if let Some(file_path) = choice("TILESNAP_LOG_FILE") {
            config.file_path = Some(PathBuf::from(file_path));
        }
        if let Some(include_source) = flag("TILESNAP_LOG_SOURCE") {
            config.include_source = include_source;
        }
        if let Some(performance) = flag("TILESNAP_LOG_PERFORMANCE") {
            config.performance_tracing = performance;
        }

        config
    }

    /// Raise the level to at least debug, as `--verbose` does
    pub fn verbose(mut self) -> Self {
        if matches!(self.level, LogLevel::Info | LogLevel::Warn | LogLevel::Error) {
            self.level = LogLevel::Debug;
        }
        self
    }
}

/// Parse an environment value into one of the clap choices, ignoring case
fn parse_choice<T: ValueEnum>(value: &str) -> Option<T> {
    T::from_str(value.trim(), true).ok()
}

/// Initialize the global tracing subscriber with the given configuration
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = create_filter(config);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if matches!(config.output, LogOutput::Stderr | LogOutput::Both) {
        layers.push(create_layer(config, std::io::stderr, true));
    }
    if matches!(config.output, LogOutput::File | LogOutput::Both) {
        let file_path = config
            .file_path
            .as_ref()
            .ok_or_else(|| {
                TileSnapError::ConfigurationError("File path required for file output".into())
            })?;
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .with_context(|| format!("failed to open log file {}", file_path.display()))?;
        layers.push(create_layer(config, Mutex::new(file), false));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    debug!(?config, "logging initialized");
    Ok(())
}

/// Create an environment filter based on the configuration. `RUST_LOG` wins.
fn create_filter(config: &LogConfig) -> EnvFilter {
    let mut filter_str = format!("tilesnap={}", config.level.as_str());

    if config.performance_tracing {
        filter_str.push_str(",tilesnap::services::window_manager=trace");
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str))
}

fn create_layer<W>(config: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339())
        .with_thread_names(config.include_thread_names)
        .with_file(config.include_source)
        .with_line_number(config.include_source);

    match config.format {
        LogFormat::Pretty => Box::new(layer.pretty()),
        LogFormat::Compact => Box::new(layer.compact()),
        LogFormat::Json => Box::new(layer.json()),
    }
}

/// Time a block and report the elapsed milliseconds at debug level
#[macro_export]
macro_rules! trace_performance {
    ($name:expr, $block:block) => {{
        let span = tracing::debug_span!("performance", operation = $name);
        let _enter = span.enter();
        let start = std::time::Instant::now();

        let result = $block;

        tracing::debug!(
            operation = $name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Performance trace"
        );

        result
    }};
}

/// Initialize logging for testing environments
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Debug,
            include_source: true,
            performance_tracing: true,
            ..LogConfig::default()
        };

        if let Err(e) = init_logging(&config) {
            eprintln!("Failed to initialize test logging: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_choice::<LogLevel>("info"), Some(LogLevel::Info));
        assert_eq!(parse_choice::<LogLevel>(" DEBUG "), Some(LogLevel::Debug));
        assert_eq!(parse_choice::<LogLevel>("invalid"), None);
    }

    #[test]
    fn test_log_output_parsing() {
        assert_eq!(parse_choice::<LogOutput>("STDERR"), Some(LogOutput::Stderr));
        assert_eq!(parse_choice::<LogOutput>("both"), Some(LogOutput::Both));
        assert_eq!(parse_choice::<LogFormat>("Json"), Some(LogFormat::Json));
        assert_eq!(parse_choice::<LogOutput>("stdout"), None);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("TILESNAP_LOG_LEVEL", "trace"),
            ("TILESNAP_LOG_FORMAT", "json"),
            ("TILESNAP_LOG_OUTPUT", "file"),
            ("TILESNAP_LOG_FILE", "/tmp/tilesnap.log"),
            ("TILESNAP_LOG_SOURCE", "TRUE"),
        ]
        .into_iter()
        .collect();

        let config = LogConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/tilesnap.log")));
        assert!(config.include_source);
        assert!(!config.performance_tracing);
    }

    #[test]
    fn test_invalid_env_values_keep_defaults() {
        let config = LogConfig::from_lookup(|name| {
            (name == "TILESNAP_LOG_LEVEL").then(|| "loud".to_string())
        });
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn test_verbose_never_lowers_detail() {
        assert_eq!(LogConfig::default().verbose().level, LogLevel::Debug);

        let tracing = LogConfig {
            level: LogLevel::Trace,
            ..LogConfig::default()
        };
        assert_eq!(tracing.verbose().level, LogLevel::Trace);
    }

    #[test]
    fn test_file_output_requires_path() {
        let config = LogConfig {
            output: LogOutput::File,
            file_path: None,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_performance_macro() {
        init_test_logging();

        let result = trace_performance!("test_operation", {
            std::thread::sleep(std::time::Duration::from_millis(1));
            42
        });

        assert_eq!(result, 42);
    }
}
