//! Filesystem capability used by the compile pipeline.
//!
//! The pipeline never calls `std::fs` directly. It goes through
//! [`Filesystem`] so tests can observe exactly which operations a request
//! performed (or that it performed none). [`LocalFs`] is the production
//! implementation.

use std::io;
use std::path::Path;

/// The filesystem operations a compile request can perform.
pub trait Filesystem: Sync {
    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create or truncate `path` and write `contents` to it.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Probe whether `path` is an existing directory.
    ///
    /// `Ok(false)` means the path does not exist or is not a directory.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Create `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove `path` if it is an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }
}
