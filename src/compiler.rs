//! LESS compiler capability.
//!
//! The [`LessCompiler`] trait is the only thing the pipeline knows about
//! compiling: source text in, CSS text or a tagged [`Failure`] out. The
//! production implementation is [`Lessc`], which drives the reference
//! `lessc` executable as a child process:
//!
//! ```text
//! lessc --no-color --include-path=<dir> [extra args] -  < source  > css
//! ```
//!
//! Source is piped through stdin so the compiler sees exactly the text the
//! pipeline read. On failure `lessc` exits non-zero and prints a diagnostic
//! on stderr, which [`parse_diagnostic`] turns into a structured
//! [`Diagnostic`] right here at the boundary.

use crate::config::CompilerConfig;
use crate::error::{Diagnostic, Failure};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

/// Compile LESS source to CSS.
///
/// Implementations must be `Sync`: `build` compiles files in parallel.
pub trait LessCompiler: Sync {
    /// `search_paths` are the directories `@import` resolves against;
    /// `filename` names the source in diagnostics.
    fn compile(
        &self,
        source: &str,
        search_paths: &[PathBuf],
        filename: &str,
    ) -> Result<String, Failure>;
}

/// [`LessCompiler`] that runs the `lessc` executable.
#[derive(Debug, Clone)]
pub struct Lessc {
    program: String,
    args: Vec<String>,
}

impl Lessc {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    fn command(&self, search_paths: &[PathBuf]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-color");
        if !search_paths.is_empty() {
            match std::env::join_paths(search_paths) {
                Ok(joined) => {
                    let mut arg = std::ffi::OsString::from("--include-path=");
                    arg.push(joined);
                    cmd.arg(arg);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot pass include paths to lessc");
                }
            }
        }
        cmd.args(&self.args);
        cmd.arg("-");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for Lessc {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl LessCompiler for Lessc {
    fn compile(
        &self,
        source: &str,
        search_paths: &[PathBuf],
        filename: &str,
    ) -> Result<String, Failure> {
        let mut child = self.command(search_paths).spawn().map_err(|e| {
            Failure::Message(format!("Failed to run {}: {}", self.program, e))
        })?;

        // Write on a separate thread: lessc may fill its stdout pipe before
        // it has consumed all of stdin.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Failure::Message(format!("{} has no stdin", self.program)))?;
        let input = source.to_owned();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| Failure::Message(format!("{} did not finish: {}", self.program, e)))?;
        if let Ok(Err(e)) = writer.join() {
            tracing::debug!(error = %e, "lessc closed stdin early");
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            tracing::debug!(status = %output.status, stderr = %stderr.trim(), "lessc failed");
            return Err(match parse_diagnostic(&stderr, filename) {
                Some(diagnostic) => Failure::Compiler(diagnostic),
                None => Failure::Message(stderr.trim().to_string()),
            });
        }

        if !stderr.trim().is_empty() {
            tracing::warn!(file = filename, "{}", stderr.trim());
        }
        String::from_utf8(output.stdout)
            .map_err(|_| Failure::Message(format!("{} produced non UTF-8 output", self.program)))
    }
}

/// `ParseError: Unrecognised input in - on line 3, column 5:`
static DIAGNOSTIC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<type>[A-Za-z]+)Error: (?P<message>.*?)(?: in (?P<file>\S+))?(?: on line (?P<line>\d+), column (?P<column>\d+))?:?\s*$",
    )
    .expect("valid diagnostic pattern")
});

/// Parse the first diagnostic header in `lessc` stderr.
///
/// The `Error` suffix is dropped from the type (`ParseError` → `Parse`). The
/// stdin marker `-` is reported as `filename`, the name of the request's
/// source; imported files keep their own name.
pub fn parse_diagnostic(stderr: &str, filename: &str) -> Option<Diagnostic> {
    let caps = DIAGNOSTIC_HEADER.captures(stderr)?;
    let file = caps.name("file").map(|m| match m.as_str() {
        "-" => filename.to_string(),
        other => other.to_string(),
    });
    Some(Diagnostic {
        error_type: caps["type"].to_string(),
        message: caps["message"].trim().to_string(),
        line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
        column: caps.name("column").and_then(|m| m.as_str().parse().ok()),
        filename: file,
    })
}
