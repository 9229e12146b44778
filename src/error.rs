//! Compile failure classification.
//!
//! Every stage of a compile request (source read, compiler invocation, output
//! write) reports its failure as a [`Failure`], a tagged value built right at
//! the boundary where the collaborator produced it. [`classify`] turns any
//! `Failure` into a [`CompileError`]: one of four kinds plus a message that is
//! already fit to show to a user.
//!
//! ```text
//! Failure::Compiler(diagnostic)  →  CompilerSyntax  "[Name]: Variable @x is undefined on line 3 in site.less"
//! Failure::Io { path, source }   →  FileSystem      "The file could not be found (less/site.less)"
//! Failure::Message("boom")       →  Unknown         "boom"
//! Failure::Unknown               →  Unknown         "An unknown error occurred."
//! ```
//!
//! `InvalidInput` is never classified from a failure. The pipeline raises it
//! itself before touching the filesystem.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Message used whenever a failure carries nothing presentable.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Diagnostic type the LESS compiler uses for plain syntax errors. Its line
/// number points at the parser's resync position, not the mistake, so it is
/// left out of the message.
const PARSE_ERROR_TYPE: &str = "Parse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The file is not a `.less` source.
    InvalidInput,
    /// Reading the source or writing the output failed.
    FileSystem,
    /// The compiler rejected the source.
    CompilerSyntax,
    /// Anything that could not be classified further.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::FileSystem => "file system",
            ErrorKind::CompilerSyntax => "LESS",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// The single error type a compile request can end in.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Rejection for a file that does not carry the `.less` extension.
    pub fn invalid_input(file_name: &str) -> Self {
        Self::new(
            ErrorKind::InvalidInput,
            format!("{file_name} is missing the LESS file extension (.less)"),
        )
    }

    fn unknown() -> Self {
        Self::new(ErrorKind::Unknown, UNKNOWN_ERROR_MESSAGE)
    }
}

/// Structured error reported by the LESS compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error category without the `Error` suffix: `Parse`, `Name`, `Syntax`, `File`...
    pub error_type: String,
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub filename: Option<String>,
}

/// A raw failure, tagged by the boundary that produced it.
#[derive(Debug)]
pub enum Failure {
    /// The compiler ran and rejected the source.
    Compiler(Diagnostic),
    /// A filesystem operation on `path` failed.
    Io { path: PathBuf, source: io::Error },
    /// Free-form failure text (a panic payload, unparseable compiler output).
    Message(String),
    /// Nothing usable was reported.
    Unknown,
}

impl Failure {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Failure::Io {
            path: path.into(),
            source,
        }
    }
}

/// Translate any failure into a [`CompileError`]. Total: never panics.
pub fn classify(failure: Failure) -> CompileError {
    match failure {
        Failure::Compiler(diagnostic) => classify_diagnostic(&diagnostic),
        Failure::Io { path, source } => CompileError::new(
            ErrorKind::FileSystem,
            format!("{} ({})", file_error_string(source.kind()), path.display()),
        ),
        Failure::Message(text) if !text.trim().is_empty() => {
            CompileError::new(ErrorKind::Unknown, text)
        }
        Failure::Message(_) | Failure::Unknown => CompileError::unknown(),
    }
}

fn classify_diagnostic(diagnostic: &Diagnostic) -> CompileError {
    if diagnostic.message.trim().is_empty() {
        return CompileError::unknown();
    }

    let mut message = format!(
        "[{}]: {}",
        diagnostic.error_type,
        capitalize_first(&diagnostic.message)
    );
    if diagnostic.error_type != PARSE_ERROR_TYPE {
        if let Some(line) = diagnostic.line {
            message.push_str(&format!(" on line {line}"));
        }
    }
    if let Some(filename) = diagnostic.filename.as_deref().filter(|f| !f.is_empty()) {
        message.push_str(&format!(" in {filename}"));
    }
    CompileError::new(ErrorKind::CompilerSyntax, message)
}

/// Human-readable description of a filesystem error kind.
pub fn file_error_string(kind: io::ErrorKind) -> &'static str {
    match kind {
        io::ErrorKind::NotFound => "The file could not be found",
        io::ErrorKind::PermissionDenied => "Permission denied while accessing the file",
        io::ErrorKind::AlreadyExists => "The file already exists",
        io::ErrorKind::InvalidData => "The file is not valid UTF-8 text",
        io::ErrorKind::IsADirectory => "Expected a file but found a directory",
        io::ErrorKind::NotADirectory => "A parent of the path is not a directory",
        io::ErrorKind::ReadOnlyFilesystem => "The target location is read-only",
        io::ErrorKind::StorageFull => "There is no space left on the device",
        _ => "An error occurred while accessing the file",
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(error_type: &str, message: &str) -> Diagnostic {
        Diagnostic {
            error_type: error_type.to_string(),
            message: message.to_string(),
            ..Diagnostic::default()
        }
    }

    // =========================================================================
    // Compiler diagnostics
    // =========================================================================

    #[test]
    fn parse_error_is_compiler_syntax_and_capitalized() {
        let err = classify(Failure::Compiler(diagnostic("Parse", "missing bracket")));
        assert_eq!(err.kind, ErrorKind::CompilerSyntax);
        assert!(err.message.contains("[Parse]:"));
        assert!(err.message.contains("Missing bracket"));
    }

    #[test]
    fn parse_error_never_reports_line() {
        let err = classify(Failure::Compiler(Diagnostic {
            line: Some(12),
            ..diagnostic("Parse", "missing bracket")
        }));
        assert!(!err.message.contains("on line"));
        assert_eq!(err.message, "[Parse]: Missing bracket");
    }

    #[test]
    fn other_error_types_report_line_and_file() {
        let err = classify(Failure::Compiler(Diagnostic {
            line: Some(3),
            filename: Some("site.less".to_string()),
            ..diagnostic("Name", "variable @accent is undefined")
        }));
        assert_eq!(
            err.message,
            "[Name]: Variable @accent is undefined on line 3 in site.less"
        );
    }

    #[test]
    fn parse_error_still_reports_file() {
        let err = classify(Failure::Compiler(Diagnostic {
            line: Some(3),
            filename: Some("site.less".to_string()),
            ..diagnostic("Parse", "unrecognised input")
        }));
        assert_eq!(err.message, "[Parse]: Unrecognised input in site.less");
    }

    #[test]
    fn empty_diagnostic_message_falls_back_to_unknown() {
        let err = classify(Failure::Compiler(diagnostic("Syntax", "  ")));
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn capitalize_handles_multibyte_first_char() {
        assert_eq!(capitalize_first("éclair"), "Éclair");
        assert_eq!(capitalize_first(""), "");
    }

    // =========================================================================
    // Filesystem failures
    // =========================================================================

    #[test]
    fn io_failure_is_file_system() {
        let err = classify(Failure::io(
            "less/site.less",
            io::Error::from(io::ErrorKind::NotFound),
        ));
        assert_eq!(err.kind, ErrorKind::FileSystem);
        assert_eq!(err.message, "The file could not be found (less/site.less)");
    }

    #[test]
    fn unmapped_io_kind_gets_generic_text() {
        let err = classify(Failure::io(
            "out.css",
            io::Error::other("disk on fire"),
        ));
        assert_eq!(err.kind, ErrorKind::FileSystem);
        assert!(err.message.starts_with("An error occurred while accessing the file"));
    }

    // =========================================================================
    // Strings and unknowns
    // =========================================================================

    #[test]
    fn plain_message_is_unknown_verbatim() {
        let err = classify(Failure::Message("boom".to_string()));
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn empty_message_uses_fallback() {
        let err = classify(Failure::Message(String::new()));
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn unknown_uses_fallback() {
        let err = classify(Failure::Unknown);
        assert_eq!(err, CompileError::new(ErrorKind::Unknown, UNKNOWN_ERROR_MESSAGE));
    }

    #[test]
    fn invalid_input_names_the_file() {
        let err = CompileError::invalid_input("styles.txt");
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.to_string().contains("styles.txt"));
    }

    #[test]
    fn error_serializes_with_snake_case_kind() {
        let err = CompileError::new(ErrorKind::CompilerSyntax, "[Parse]: Oops");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"kind":"compiler_syntax","message":"[Parse]: Oops"}"#);
    }
}
