//! Compile-on-save.
//!
//! `bracketless watch` turns filesystem save events into compile requests:
//!
//! - Events for `.less` files under the watched root (outside hidden
//!   directories and `node_modules`) are collected and debounced, so an
//!   editor's write-rename-touch sequence compiles once.
//! - Each changed file is compiled on its own, one after another, with the
//!   settings in effect when that request starts.
//! - A change to the config file reloads it before the next request. An
//!   invalid config is reported and the previous one stays in effect.
//! - Ctrl+C clears the `running` flag; the loop finishes the request in
//!   progress and returns.
//!
//! Progress is reported through a callback as [`WatchEvent`]s, which the CLI
//! prints as text or NDJSON.

use crate::compiler::{LessCompiler, Lessc};
use crate::config::{self, Config, ConfigError};
use crate::error::CompileError;
use crate::fs::Filesystem;
use crate::pipeline::{self, OutputTarget, Settings, SourceFile};
use crate::scan::{self, ScanError};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often the loop wakes up to check the running flag and the debounce.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory (or single file) to watch.
    pub root: PathBuf,
    /// Config file to reload on change. It need not exist.
    pub config_path: PathBuf,
    /// Compile every discovered source once before waiting for changes.
    pub initial_build: bool,
}

/// Progress reported by [`watch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    Started {
        root: String,
    },
    Compiled {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Failed {
        source: String,
        error: CompileError,
    },
    ConfigReloaded {
        path: String,
    },
    ConfigRejected {
        path: String,
        message: String,
    },
    Shutdown,
}

impl WatchEvent {
    /// One NDJSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Changes seen since the last flush.
#[derive(Debug)]
struct PendingChanges {
    sources: BTreeSet<PathBuf>,
    config_changed: bool,
    last_event: Option<Instant>,
    debounce: Duration,
}

/// A flushed set of changes, ready to act on.
#[derive(Debug, Default, PartialEq)]
struct ChangeBatch {
    sources: Vec<PathBuf>,
    config_changed: bool,
}

impl PendingChanges {
    fn new(debounce: Duration) -> Self {
        Self {
            sources: BTreeSet::new(),
            config_changed: false,
            last_event: None,
            debounce,
        }
    }

    fn record_source(&mut self, path: PathBuf, at: Instant) {
        self.sources.insert(path);
        self.last_event = Some(at);
    }

    fn record_config(&mut self, at: Instant) {
        self.config_changed = true;
        self.last_event = Some(at);
    }

    /// Something is pending and no event arrived within the debounce window.
    fn is_due(&self, now: Instant) -> bool {
        match self.last_event {
            Some(last) => now.saturating_duration_since(last) >= self.debounce,
            None => false,
        }
    }

    fn take(&mut self) -> ChangeBatch {
        self.last_event = None;
        ChangeBatch {
            sources: std::mem::take(&mut self.sources).into_iter().collect(),
            config_changed: std::mem::replace(&mut self.config_changed, false),
        }
    }
}

/// Watch `options.root` and compile saved sources until `running` is cleared.
///
/// `config` is the configuration already loaded by the caller.
pub fn watch(
    fs: &dyn Filesystem,
    options: &WatchOptions,
    mut config: Config,
    running: Arc<AtomicBool>,
    event_callback: impl Fn(WatchEvent),
) -> Result<(), WatchError> {
    let root = canonical(&options.root);
    let config_path = canonical_file(&options.config_path);

    event_callback(WatchEvent::Started {
        root: root.display().to_string(),
    });

    if options.initial_build {
        let compiler = Lessc::from_config(&config.compiler);
        let settings = Settings::from_config(&config);
        for source in scan::discover_sources(&root)? {
            compile_one(fs, &compiler, &source, &settings, &event_callback);
        }
    }

    let (tx, rx) = channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        },
        NotifyConfig::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    if let Some(dir) = config_path.parent().filter(|d| d.is_dir() && !d.starts_with(&root)) {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    tracing::info!(root = %root.display(), "watching for changes");

    let mut pending = PendingChanges::new(Duration::from_millis(config.watch.debounce_ms));

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => {
                if event.kind.is_create() || event.kind.is_modify() {
                    let now = Instant::now();
                    for path in event.paths {
                        if path == config_path {
                            pending.record_config(now);
                        } else if is_relevant(&root, &path) {
                            tracing::debug!(path = %path.display(), "source changed");
                            pending.record_source(path, now);
                        }
                    }
                }
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "file watcher reported an error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if !pending.is_due(Instant::now()) {
            continue;
        }
        let batch = pending.take();

        if batch.config_changed {
            match config::load_config(&config_path) {
                Ok(reloaded) => {
                    pending.debounce = Duration::from_millis(reloaded.watch.debounce_ms);
                    config = reloaded;
                    event_callback(WatchEvent::ConfigReloaded {
                        path: config_path.display().to_string(),
                    });
                }
                Err(e) => event_callback(WatchEvent::ConfigRejected {
                    path: config_path.display().to_string(),
                    message: e.to_string(),
                }),
            }
        }

        if batch.sources.is_empty() {
            continue;
        }
        let compiler = Lessc::from_config(&config.compiler);
        for path in batch.sources {
            // Snapshot per request: a reload can only land between requests.
            let settings = Settings::from_config(&config);
            compile_one(fs, &compiler, &SourceFile::new(path), &settings, &event_callback);
        }
    }

    event_callback(WatchEvent::Shutdown);
    Ok(())
}

/// Compile one changed source and report the outcome.
fn compile_one(
    fs: &dyn Filesystem,
    compiler: &dyn LessCompiler,
    source: &SourceFile,
    settings: &Settings,
    event_callback: &impl Fn(WatchEvent),
) {
    let source_name = source.path().display().to_string();
    match pipeline::compile_file(fs, compiler, source, &OutputTarget::Resolve, settings) {
        Ok(compiled) => event_callback(WatchEvent::Compiled {
            source: source_name,
            output: compiled.output_file.map(|p| p.display().to_string()),
        }),
        Err(error) => {
            tracing::warn!(source = %source_name, %error, "compile failed");
            event_callback(WatchEvent::Failed {
                source: source_name,
                error,
            });
        }
    }
}

/// A watched `.less` source, judged by its path below the root so a hidden
/// directory above the root does not hide everything. A single-file root is
/// judged by its own name.
fn is_relevant(root: &Path, path: &Path) -> bool {
    let relative = match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path.file_name().map(Path::new).unwrap_or(path),
    };
    scan::is_watched_source(relative)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Like [`canonical`], but still absolute when the file does not exist yet,
/// so a config file created during the session is recognized.
fn canonical_file(path: &Path) -> PathBuf {
    if let Ok(path) = std::fs::canonicalize(path) {
        return path;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            canonical(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}
