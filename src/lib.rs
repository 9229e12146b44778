//! # bracketless
//!
//! Compile LESS stylesheets to CSS on demand, on every save, or for a whole
//! project tree. The LESS language itself is handled by an external compiler
//! (`lessc`); bracketless is everything around it: deciding where the CSS
//! goes, shrinking it, stamping it, and turning whatever went wrong into one
//! message a person can act on.
//!
//! # Architecture: One Request, Six Steps
//!
//! Every compile, whether it comes from `bracketless compile`, a file found by
//! `bracketless build` or a save seen by `bracketless watch`, is one request
//! through [`pipeline::compile_file`]:
//!
//! ```text
//! site.less ─ check ─ read ─ compile ─ process ─ resolve ─ write ─▶ css/site.css
//!               │       │       │                             │
//!               └───────┴───────┴──────── CompileError ◀──────┘
//! ```
//!
//! A request ends in exactly one `Result<Compiled, CompileError>`, writes at
//! most one file, and writes nothing when it fails.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The compile request: validation, stage ordering, batches |
//! | [`postprocess`] | Pure CSS text transforms and the banner |
//! | [`error`] | `Failure` → `CompileError` classification |
//! | [`output_path`] | Sibling `less/` → `css/` output path convention |
//! | [`compiler`] | `LessCompiler` trait and the `lessc` process driver |
//! | [`fs`] | `Filesystem` trait and the local implementation |
//! | [`config`] | `bracketless.toml` loading, merging, validation, stock config |
//! | [`scan`] | `.less` discovery for `build` and `watch` |
//! | [`watch`] | Debounced compile-on-save with config reload |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Capabilities as Traits
//!
//! The pipeline never touches `std::fs` or spawns a process directly. It is
//! handed a [`fs::Filesystem`] and a [`compiler::LessCompiler`], so tests can
//! prove that a rejected file causes no I/O at all, that failures write
//! nothing, and that a compiler which panics still ends the request with a
//! normal error.
//!
//! ## Options Are a Snapshot
//!
//! There is no global settings object. Each request receives a
//! [`pipeline::Settings`] value captured when it starts. Watch mode reloads
//! `bracketless.toml` between requests, never during one.
//!
//! ## Sibling `css/` Convention
//!
//! Projects commonly keep sources in `less/` and serve `css/` next to it. When
//! a source sits in a directory named `less` and a sibling `css` directory
//! exists, output goes there; otherwise it lands next to the source. See
//! [`output_path::resolve`].

pub mod compiler;
pub mod config;
pub mod error;
pub mod fs;
pub mod output;
pub mod output_path;
pub mod pipeline;
pub mod postprocess;
pub mod scan;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
