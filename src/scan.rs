//! Source discovery for `bracketless build` and `bracketless watch`.
//!
//! Walks a directory tree and collects every `.less` file, sorted by path.
//! Hidden entries (names starting with `.`) and `node_modules` are skipped
//! entirely, including everything below them. That covers hidden files too:
//! a dotfile such as `.less` is never discovered, although
//! `bracketless compile .less` accepts it when named explicitly.

use crate::pipeline::SourceFile;
use std::path::Path;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot walk {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Every `.less` source below `root`, sorted by path.
///
/// `root` itself may be a single `.less` file.
pub fn discover_sources(root: &Path) -> Result<Vec<SourceFile>, ScanError> {
    let mut sources = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: e.path().unwrap_or(root).display().to_string(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let source = SourceFile::new(entry.path());
        if source.is_less() {
            sources.push(source);
        }
    }

    tracing::debug!(root = %root.display(), count = sources.len(), "discovered sources");
    Ok(sources)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&&*name))
}

/// Whether a path reported by the watcher should trigger a compile.
///
/// Mirrors [`discover_sources`]: `.less` files outside hidden directories
/// and `node_modules`.
pub fn is_watched_source(path: &Path) -> bool {
    let in_skipped_dir = path.components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        (part.starts_with('.') && part != "." && part != "..")
            || SKIPPED_DIRS.contains(&&*part)
    });
    !in_skipped_dir && SourceFile::new(path).is_less()
}
