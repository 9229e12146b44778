//! The compile pipeline: one `.less` source in, one `.css` file out.
//!
//! A request runs these steps in order and stops at the first failure:
//!
//! ```text
//! 1. check     name ends in .less          else InvalidInput (no I/O at all)
//! 2. read      Filesystem::read_to_string  else FileSystem
//! 3. compile   LessCompiler::compile       else CompilerSyntax / Unknown
//! 4. process   postprocess::apply          (pure)
//! 5. resolve   explicit path or output_path::resolve
//! 6. write     banner + Filesystem::write  else FileSystem
//! ```
//!
//! Every failure is converted into a [`CompileError`] where it happens, via
//! [`classify`]. The compiler call runs behind a panic boundary so a
//! misbehaving compiler implementation ends the request with an `Unknown`
//! error instead of unwinding into the caller.
//!
//! A request writes at most one file, and nothing at all when it fails.
//! Output directories it had to create are removed again if the write then
//! fails, as long as they are still empty.
//! Requests share no state; [`compile_all`] runs independent requests on the
//! rayon pool and two requests targeting the same output path simply race,
//! with the last write winning.

use crate::compiler::LessCompiler;
use crate::config::{CompileOptions, Config, OutputOptions};
use crate::error::{CompileError, Failure, classify};
use crate::fs::Filesystem;
use crate::output_path;
use crate::postprocess;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Extension (last dot-delimited segment) a source must carry.
const LESS_EXTENSION: &str = "less";

/// A stylesheet to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, lossily decoded.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Text after the last `.` of the name, if there is one.
    ///
    /// Unlike [`Path::extension`], a dot-file such as `.less` has extension
    /// `less`.
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        name.rsplit_once('.').map(|(_, ext)| ext.to_string())
    }

    /// Directory containing the file; `.` for a bare file name.
    pub fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn is_less(&self) -> bool {
        self.extension().as_deref() == Some(LESS_EXTENSION)
    }
}

/// Where a request should write its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Pick the path with [`output_path::resolve`].
    #[default]
    Resolve,
    /// Write to exactly this path.
    Path(PathBuf),
    /// Compile only; write nothing.
    Discard,
}

/// Everything a request reads from configuration, captured when it starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub options: CompileOptions,
    pub output: OutputOptions,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            options: config.options,
            output: config.output.clone(),
        }
    }
}

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    /// Post-processed CSS. The banner, when enabled, is only in the file.
    pub css: String,
    /// Path that was written, if any.
    pub output_file: Option<PathBuf>,
}

/// Compile one source file.
///
/// `settings` is a snapshot; changing configuration afterwards does not
/// affect a request already running.
pub fn compile_file(
    fs: &dyn Filesystem,
    compiler: &dyn LessCompiler,
    file: &SourceFile,
    target: &OutputTarget,
    settings: &Settings,
) -> Result<Compiled, CompileError> {
    let span = tracing::info_span!("compile", source = %file.path().display());
    let _enter = span.enter();

    check_extension(file)?;
    let source = read_source(fs, file)?;
    let css = run_compiler(compiler, &source, file)?;
    let css = postprocess::apply(css, &settings.options);

    let output_file = match target {
        OutputTarget::Resolve => Some(output_path::resolve(fs, file.path())),
        OutputTarget::Path(path) => Some(path.clone()),
        OutputTarget::Discard => None,
    };

    if let Some(path) = &output_file {
        write_output(fs, path, &css, settings)?;
        tracing::info!(output = %path.display(), bytes = css.len(), "compiled");
    } else {
        tracing::debug!(bytes = css.len(), "compiled without writing");
    }

    Ok(Compiled { css, output_file })
}

fn check_extension(file: &SourceFile) -> Result<(), CompileError> {
    if file.is_less() {
        Ok(())
    } else {
        tracing::debug!("not a .less file, skipping");
        Err(CompileError::invalid_input(&file.name()))
    }
}

fn read_source(fs: &dyn Filesystem, file: &SourceFile) -> Result<String, CompileError> {
    fs.read_to_string(file.path())
        .map_err(|e| classify(Failure::io(file.path(), e)))
}

fn run_compiler(
    compiler: &dyn LessCompiler,
    source: &str,
    file: &SourceFile,
) -> Result<String, CompileError> {
    let search_paths = [file.directory()];
    let filename = file.name();
    tracing::debug!(include = %search_paths[0].display(), "invoking compiler");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        compiler.compile(source, &search_paths, &filename)
    }));

    match outcome {
        Ok(Ok(css)) => Ok(css),
        Ok(Err(failure)) => Err(classify(failure)),
        Err(payload) => {
            let failure = panic_message(payload.as_ref())
                .map(Failure::Message)
                .unwrap_or(Failure::Unknown);
            tracing::error!(?failure, "compiler panicked");
            Err(classify(failure))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&str>() {
        Some((*s).to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}

fn write_output(
    fs: &dyn Filesystem,
    path: &Path,
    css: &str,
    settings: &Settings,
) -> Result<(), CompileError> {
    let contents = if settings.options.insert_banner {
        postprocess::prepend_banner(
            css,
            settings.output.banner.trim(),
            settings.output.line_ending.as_str(),
        )
    } else {
        css.to_string()
    };

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
    let created = match dir {
        Some(dir) => create_missing_dirs(fs, dir)?,
        None => None,
    };

    fs.write(path, &contents).map_err(|e| {
        if let (Some(dir), Some(top)) = (dir, &created) {
            remove_created_dirs(fs, dir, top);
        }
        classify(Failure::io(path, e))
    })
}

/// Create `dir` if it is missing. Returns the topmost directory that did
/// not exist before, so a failed write can undo the creation.
fn create_missing_dirs(fs: &dyn Filesystem, dir: &Path) -> Result<Option<PathBuf>, CompileError> {
    let mut topmost = None;
    let mut current = Some(dir);
    while let Some(d) = current.filter(|d| !d.as_os_str().is_empty()) {
        match fs.is_dir(d) {
            Ok(false) => {
                topmost = Some(d.to_path_buf());
                current = d.parent();
            }
            Ok(true) => break,
            Err(e) => {
                tracing::debug!(dir = %d.display(), error = %e, "directory probe failed");
                break;
            }
        }
    }

    if topmost.is_some() {
        fs.create_dir_all(dir)
            .map_err(|e| classify(Failure::io(dir, e)))?;
    }
    Ok(topmost)
}

/// Remove `dir` and its parents up to `topmost`, stopping at the first one
/// that is not empty (another request may have written into it).
fn remove_created_dirs(fs: &dyn Filesystem, dir: &Path, topmost: &Path) {
    for d in dir.ancestors() {
        if let Err(e) = fs.remove_dir(d) {
            tracing::debug!(dir = %d.display(), error = %e, "left output directory in place");
            return;
        }
        if d == topmost {
            return;
        }
    }
}

/// Outcome of one source in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub source: SourceFile,
    pub result: Result<Compiled, CompileError>,
}

/// Results of [`compile_all`], in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Compile every source with implicit output paths, in parallel.
pub fn compile_all(
    fs: &dyn Filesystem,
    compiler: &dyn LessCompiler,
    sources: Vec<SourceFile>,
    settings: &Settings,
) -> BatchReport {
    let entries = sources
        .into_par_iter()
        .map(|source| {
            let result = compile_file(fs, compiler, &source, &OutputTarget::Resolve, settings);
            BatchEntry { source, result }
        })
        .collect();
    BatchReport { entries }
}
