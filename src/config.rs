//! Project configuration module.
//!
//! Handles loading, validating, and merging `bracketless.toml`. Stock
//! defaults are serialized to a TOML table and the user's file is merged on
//! top of it, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [options]
//! remove_line_endings = true      # Strip CR/LF from compiled CSS
//! remove_css_comments = true      # Strip /* ... */ comments
//! remove_excess_whitespace = true # Collapse whitespace runs to one space
//! insert_banner = true            # Prepend the banner line to written files
//!
//! [output]
//! banner = "/* Compiled from LESS by bracketless */"
//! line_ending = "auto"            # auto | lf | crlf (banner terminator)
//!
//! [compiler]
//! program = "lessc"               # LESS compiler executable
//! args = []                       # Extra arguments, e.g. ["--compress"]
//!
//! [watch]
//! debounce_ms = 100               # Quiet period before compiling a save
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The loaded [`Config`] is a plain value. Each compile request receives the
//! [`CompileOptions`] in effect when it starts; `watch` reloads the file on
//! change and the next request picks up the new values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the project config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "bracketless.toml";

/// Longest accepted watch debounce.
const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `bracketless.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Post-processing toggles applied to every compile.
    pub options: CompileOptions,
    /// Banner text and line terminator for written files.
    pub output: OutputOptions,
    /// External LESS compiler invocation.
    pub compiler: CompilerConfig,
    /// Watch mode settings.
    pub watch: WatchConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let banner = self.output.banner.trim();
        if !(banner.starts_with("/*") && banner.ends_with("*/")) || banner.len() < 4 {
            return Err(ConfigError::Validation(
                "output.banner must be a CSS comment (/* ... */)".into(),
            ));
        }
        if banner.contains('\n') || banner.contains('\r') {
            return Err(ConfigError::Validation(
                "output.banner must be a single line".into(),
            ));
        }
        if self.compiler.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "compiler.program must not be empty".into(),
            ));
        }
        if self.watch.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "watch.debounce_ms must be at most {MAX_DEBOUNCE_MS}"
            )));
        }
        Ok(())
    }
}

/// Post-processing toggles. Each is independent; they always run in the
/// order documented in [`crate::postprocess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    pub remove_line_endings: bool,
    pub remove_excess_whitespace: bool,
    pub remove_css_comments: bool,
    pub insert_banner: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            remove_line_endings: true,
            remove_excess_whitespace: true,
            remove_css_comments: true,
            insert_banner: true,
        }
    }
}

impl CompileOptions {
    /// All transforms off: the compiler's output is written untouched.
    pub fn verbatim() -> Self {
        Self {
            remove_line_endings: false,
            remove_excess_whitespace: false,
            remove_css_comments: false,
            insert_banner: false,
        }
    }
}

/// Line terminator written after the banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n` on Windows, `\n` elsewhere.
    #[default]
    Auto,
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Auto if cfg!(windows) => "\r\n",
            LineEnding::Auto => "\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    /// Comment line prepended to written files when `insert_banner` is set.
    pub banner: String,
    pub line_ending: LineEnding,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            banner: "/* Compiled from LESS by bracketless */".to_string(),
            line_ending: LineEnding::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Executable name or path.
    pub program: String,
    /// Extra arguments, placed before the stdin marker.
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "lessc".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Milliseconds without further events before a changed file compiles.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` on top of stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let overlay = load_raw_config(path)?;
    let config = resolve_config(stock_defaults_value(), overlay)?;
    tracing::debug!(path = %path.display(), options = ?config.options, "loaded config");
    Ok(config)
}

/// Returns a fully-commented stock `bracketless.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r#"# bracketless configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Post-processing of compiled CSS
# ---------------------------------------------------------------------------
# Enabled transforms always run in this order:
#   line endings -> comments -> whitespace
[options]
# Remove every CR, LF and CRLF.
remove_line_endings = true

# Remove /* ... */ block comments.
remove_css_comments = true

# Collapse every run of whitespace into a single space.
remove_excess_whitespace = true

# Prepend [output].banner to every written .css file.
insert_banner = true

# ---------------------------------------------------------------------------
# Written files
# ---------------------------------------------------------------------------
[output]
# Single-line CSS comment placed at the top of written files.
banner = "/* Compiled from LESS by bracketless */"

# Terminator after the banner: "auto" (platform), "lf" or "crlf".
line_ending = "auto"

# ---------------------------------------------------------------------------
# LESS compiler
# ---------------------------------------------------------------------------
[compiler]
# Executable that reads LESS on stdin and writes CSS on stdout.
program = "lessc"

# Extra arguments, e.g. ["--math=always"].
# lessc output is not compressed unless asked for; add "--compress" for
# minified output beyond what [options] does.
args = []

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Milliseconds to wait after the last save event before compiling.
debounce_ms = 100
"#
}
