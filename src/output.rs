//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Compile / Build
//!
//! Paths are shown relative to the directory the command ran against.
//!
//! ```text
//! less/buttons.less → css/buttons.css
//! less/site.less
//!     LESS error: [Name]: Variable @accent is undefined on line 7 in site.less
//! styles/print.less → styles/print.css
//!
//! Compiled 2 files, 1 failed
//! ```
//!
//! ## Watch
//!
//! ```text
//! Watching /home/me/site (Ctrl+C to stop)
//! less/site.less → css/site.css
//! Config reloaded: bracketless.toml
//! ```

use crate::error::CompileError;
use crate::pipeline::{BatchReport, Compiled};
use crate::watch::WatchEvent;
use std::path::Path;

/// `path` relative to `base` when it lies below it, with `/` separators.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn display_str(path: &str, base: &Path) -> String {
    display_path(Path::new(path), base)
}

fn error_line(error: &CompileError) -> String {
    format!("    {} error: {}", error.kind, error.message)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Compile and build
// ============================================================================

/// Format the outcome of one compile request.
pub fn format_compile_result(
    source: &Path,
    result: &Result<Compiled, CompileError>,
    base: &Path,
) -> Vec<String> {
    let name = display_path(source, base);
    match result {
        Ok(Compiled {
            output_file: Some(out),
            ..
        }) => vec![format!("{} → {}", name, display_path(out, base))],
        Ok(Compiled {
            output_file: None, ..
        }) => vec![name],
        Err(error) => vec![name, error_line(error)],
    }
}

pub fn print_compile_result(source: &Path, result: &Result<Compiled, CompileError>, base: &Path) {
    for line in format_compile_result(source, result, base) {
        println!("{}", line);
    }
}

/// Format a whole build: one entry per source, then a summary line.
pub fn format_batch_report(report: &BatchReport, base: &Path) -> Vec<String> {
    if report.entries.is_empty() {
        return vec![format!("No .less files found in {}", base.display())];
    }

    let mut lines = Vec::new();
    for entry in &report.entries {
        lines.extend(format_compile_result(
            entry.source.path(),
            &entry.result,
            base,
        ));
    }

    lines.push(String::new());
    let compiled = plural(report.succeeded(), "file");
    if report.is_success() {
        lines.push(format!("Compiled {compiled}"));
    } else {
        lines.push(format!("Compiled {compiled}, {} failed", report.failed()));
    }
    lines
}

pub fn print_batch_report(report: &BatchReport, base: &Path) {
    for line in format_batch_report(report, base) {
        println!("{}", line);
    }
}

// ============================================================================
// Watch
// ============================================================================

/// Format a watch event for human-readable output.
pub fn format_watch_event(event: &WatchEvent, base: &Path) -> Vec<String> {
    match event {
        WatchEvent::Started { root } => vec![format!("Watching {} (Ctrl+C to stop)", root)],
        WatchEvent::Compiled {
            source,
            output: Some(out),
        } => vec![format!(
            "{} → {}",
            display_str(source, base),
            display_str(out, base)
        )],
        WatchEvent::Compiled {
            source,
            output: None,
        } => vec![display_str(source, base)],
        WatchEvent::Failed { source, error } => {
            vec![display_str(source, base), error_line(error)]
        }
        WatchEvent::ConfigReloaded { path } => {
            vec![format!("Config reloaded: {}", display_str(path, base))]
        }
        WatchEvent::ConfigRejected { path, message } => vec![
            format!("Config not reloaded: {}", display_str(path, base)),
            format!("    {}", message),
        ],
        WatchEvent::Shutdown => vec!["Stopped watching".to_string()],
    }
}

pub fn print_watch_event(event: &WatchEvent, base: &Path) {
    for line in format_watch_event(event, base) {
        println!("{}", line);
    }
}
