//! Output path resolution for compiled stylesheets.
//!
//! Projects commonly keep sources and output in sibling trees:
//!
//! ```text
//! project/
//! ├── less/
//! │   └── button.less   →  project/css/button.css
//! └── css/
//! ```
//!
//! When a source lives in a directory named exactly `less` and a sibling
//! `css` directory exists, output goes there. In every other case the `.css`
//! file is written next to its source. The sibling directory is never
//! created; its existence is what opts a project in.

use crate::fs::Filesystem;
use std::path::{Path, PathBuf};

/// Directory name that marks a LESS source tree.
const SOURCE_DIR_NAME: &str = "less";
/// Sibling directory that receives output when it exists.
const OUTPUT_DIR_NAME: &str = "css";

/// Decide where the CSS compiled from `source` should be written.
///
/// A failed directory probe is treated the same as a missing directory.
pub fn resolve(fs: &dyn Filesystem, source: &Path) -> PathBuf {
    let file_name = css_file_name(source);

    if let Some(sibling) = sibling_css_dir(source) {
        match fs.is_dir(&sibling) {
            Ok(true) => return sibling.join(file_name),
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(
                    dir = %sibling.display(),
                    error = %e,
                    "css directory probe failed, writing next to source"
                );
            }
        }
    }

    source.with_file_name(file_name)
}

/// `.../X/less/name.less` → `.../X/css`. `None` when the containing
/// directory is not called `less`.
fn sibling_css_dir(source: &Path) -> Option<PathBuf> {
    let dir = source.parent()?;
    if dir.file_name()? != SOURCE_DIR_NAME {
        return None;
    }
    Some(dir.with_file_name(OUTPUT_DIR_NAME))
}

/// `name.less` → `name.css`. Only the final `.less` suffix is replaced, so
/// `theme.dark.less` becomes `theme.dark.css`.
fn css_file_name(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".less").unwrap_or(&name);
    format!("{stem}.css")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::tests::{MockFs, RecordedOp};

    #[test]
    fn less_dir_with_css_sibling_goes_to_sibling() {
        let fs = MockFs::new().with_dir("project/css");
        let out = resolve(&fs, Path::new("project/less/button.less"));
        assert_eq!(out, PathBuf::from("project/css/button.css"));
    }

    #[test]
    fn less_dir_without_css_sibling_stays_alongside() {
        let fs = MockFs::new();
        let out = resolve(&fs, Path::new("project/less/button.less"));
        assert_eq!(out, PathBuf::from("project/less/button.css"));
    }

    #[test]
    fn other_dir_names_never_probe() {
        let fs = MockFs::new().with_dir("project/css");
        let out = resolve(&fs, Path::new("project/styles/button.less"));
        assert_eq!(out, PathBuf::from("project/styles/button.css"));
        assert!(fs.get_operations().is_empty());
    }

    #[test]
    fn probe_targets_the_sibling() {
        let fs = MockFs::new();
        resolve(&fs, Path::new("/site/less/main.less"));
        assert_eq!(
            fs.get_operations(),
            vec![RecordedOp::IsDir("/site/css".to_string())]
        );
    }

    #[test]
    fn dir_name_match_is_exact() {
        let fs = MockFs::new().with_dir("project/css").with_dir("project/CSS");
        let out = resolve(&fs, Path::new("project/LESS/button.less"));
        assert_eq!(out, PathBuf::from("project/LESS/button.css"));
        let out = resolve(&fs, Path::new("project/less-src/button.less"));
        assert_eq!(out, PathBuf::from("project/less-src/button.css"));
    }

    #[test]
    fn probe_error_falls_back_to_alongside() {
        let fs = MockFs::new().with_broken_probe("project/css");
        let out = resolve(&fs, Path::new("project/less/button.less"));
        assert_eq!(out, PathBuf::from("project/less/button.css"));
    }

    #[test]
    fn nested_less_dir_uses_nearest_parent_only() {
        let fs = MockFs::new().with_dir("app/less/css");
        let out = resolve(&fs, Path::new("app/less/less/grid.less"));
        assert_eq!(out, PathBuf::from("app/less/css/grid.css"));
    }

    #[test]
    fn only_last_less_suffix_is_replaced() {
        let fs = MockFs::new();
        let out = resolve(&fs, Path::new("styles/theme.less.dark.less"));
        assert_eq!(out, PathBuf::from("styles/theme.less.dark.css"));
    }

    #[test]
    fn bare_less_dir_at_root() {
        let fs = MockFs::new().with_dir("css");
        let out = resolve(&fs, Path::new("less/a.less"));
        assert_eq!(out, PathBuf::from("css/a.css"));
    }

    #[test]
    fn real_filesystem_sibling_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("less")).unwrap();
        let source = tmp.path().join("less/button.less");

        let before = resolve(&crate::fs::LocalFs, &source);
        assert_eq!(before, tmp.path().join("less/button.css"));

        std::fs::create_dir_all(tmp.path().join("css")).unwrap();
        let after = resolve(&crate::fs::LocalFs, &source);
        assert_eq!(after, tmp.path().join("css/button.css"));
    }
}
