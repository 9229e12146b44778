//! Shared test utilities for the bracketless test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_project();
//! let sources = discover_sources(tmp.path()).unwrap();
//! assert_eq!(relative_names(tmp.path(), &sources)[0], "less/buttons.less");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::pipeline::SourceFile;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// The fixture has the sibling layout: `less/` sources, an empty `css/`
/// output directory, and a flat `styles/` directory.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

// =========================================================================
// Extractors
// =========================================================================

/// Source paths relative to `root`, with `/` separators.
pub fn relative_names(root: &Path, sources: &[SourceFile]) -> Vec<String> {
    sources
        .iter()
        .map(|s| {
            s.path()
                .strip_prefix(root)
                .unwrap_or_else(|_| panic!("{} is not under {}", s.path().display(), root.display()))
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}
