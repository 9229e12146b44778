//! Text transforms applied to compiled CSS.
//!
//! All functions are pure string-to-string transforms. [`apply`] runs the
//! enabled ones in a fixed order regardless of how the options were set:
//!
//! ```text
//! strip_line_endings → strip_comments → collapse_whitespace
//! ```
//!
//! Line endings go first so a removed newline never survives as a collapsed
//! space. The banner is not part of [`apply`]: it only exists in written
//! files and is added by the pipeline at write time via [`prepend_banner`].

use crate::config::CompileOptions;
use regex::Regex;
use std::sync::LazyLock;

static LINE_ENDINGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("valid line ending pattern"));

static BLOCK_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment pattern"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Remove every CRLF, lone CR, and lone LF.
pub fn strip_line_endings(css: &str) -> String {
    LINE_ENDINGS.replace_all(css, "").into_owned()
}

/// Replace every maximal run of whitespace with a single space.
pub fn collapse_whitespace(css: &str) -> String {
    WHITESPACE_RUNS.replace_all(css, " ").into_owned()
}

/// Remove every well-formed `/* ... */` block comment.
///
/// Matching is non-greedy, so `/* a */ b /* c */` keeps `b`. CSS comments do
/// not nest. An unterminated `/*` is left in place.
pub fn strip_comments(css: &str) -> String {
    BLOCK_COMMENTS.replace_all(css, "").into_owned()
}

pub fn prepend_banner(css: &str, banner: &str, line_terminator: &str) -> String {
    let mut out = String::with_capacity(banner.len() + line_terminator.len() + css.len());
    out.push_str(banner);
    out.push_str(line_terminator);
    out.push_str(css);
    out
}

/// Run the enabled transforms in their fixed order.
pub fn apply(css: String, options: &CompileOptions) -> String {
    let mut css = css;
    if options.remove_line_endings {
        css = strip_line_endings(&css);
    }
    if options.remove_css_comments {
        css = strip_comments(&css);
    }
    if options.remove_excess_whitespace {
        css = collapse_whitespace(&css);
    }
    css
}
