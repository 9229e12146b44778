//! End-to-end compiles against a real project tree on disk.
//!
//! `lessc` is not required: [`FakeLess`] stands in for it and returns the
//! source unchanged, which is valid CSS for the fixtures used here.

use bracketless::compiler::LessCompiler;
use bracketless::config::{self, CompileOptions, Config, LineEnding};
use bracketless::error::{Diagnostic, ErrorKind, Failure};
use bracketless::fs::LocalFs;
use bracketless::pipeline::{self, OutputTarget, Settings, SourceFile};
use bracketless::scan;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Echoes the source, or fails like `lessc` would on an unclosed block.
struct FakeLess;

impl LessCompiler for FakeLess {
    fn compile(
        &self,
        source: &str,
        _search_paths: &[PathBuf],
        filename: &str,
    ) -> Result<String, Failure> {
        if source.matches('{').count() != source.matches('}').count() {
            return Err(Failure::Compiler(Diagnostic {
                error_type: "Parse".to_string(),
                message: "missing closing `}`".to_string(),
                line: Some(1),
                column: None,
                filename: Some(filename.to_string()),
            }));
        }
        Ok(source.to_string())
    }
}

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn lf_settings(options: CompileOptions) -> Settings {
    let mut settings = Settings::from_config(&Config::default());
    settings.options = options;
    settings.output.line_ending = LineEnding::Lf;
    settings
}

#[test]
fn less_dir_with_sibling_css_dir() {
    let tmp = TempDir::new().unwrap();
    let source = write(tmp.path(), "project/less/button.less", ".btn { color: red; }");
    fs::create_dir_all(tmp.path().join("project/css")).unwrap();

    let compiled = pipeline::compile_file(
        &LocalFs,
        &FakeLess,
        &SourceFile::new(&source),
        &OutputTarget::Resolve,
        &lf_settings(CompileOptions::verbatim()),
    )
    .unwrap();

    let expected = tmp.path().join("project/css/button.css");
    assert_eq!(compiled.output_file, Some(expected.clone()));
    assert_eq!(fs::read_to_string(expected).unwrap(), ".btn { color: red; }");
}

#[test]
fn flat_layout_writes_next_to_source() {
    let tmp = TempDir::new().unwrap();
    let source = write(tmp.path(), "project/styles/button.less", "a {}");

    let compiled = pipeline::compile_file(
        &LocalFs,
        &FakeLess,
        &SourceFile::new(&source),
        &OutputTarget::Resolve,
        &lf_settings(CompileOptions::verbatim()),
    )
    .unwrap();

    assert_eq!(
        compiled.output_file,
        Some(tmp.path().join("project/styles/button.css"))
    );
}

#[test]
fn stock_options_write_banner_then_minified_css() {
    let tmp = TempDir::new().unwrap();
    let source = write(
        tmp.path(),
        "site.less",
        "/* header */\nbody {\n    margin: 0;\n}\n\n\na  {  color: blue;  }\n",
    );
    let settings = lf_settings(CompileOptions::default());

    pipeline::compile_file(
        &LocalFs,
        &FakeLess,
        &SourceFile::new(&source),
        &OutputTarget::Resolve,
        &settings,
    )
    .unwrap();

    let written = fs::read_to_string(tmp.path().join("site.css")).unwrap();
    let (first, rest) = written.split_once('\n').unwrap();
    assert_eq!(first, settings.output.banner);
    assert!(!rest.contains("  "));
    assert!(!rest.contains('\n'));
    assert!(!rest.contains("header"));
}

#[test]
fn wrong_extension_touches_nothing() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("styles.txt");

    let err = pipeline::compile_file(
        &LocalFs,
        &FakeLess,
        &SourceFile::new(&missing),
        &OutputTarget::Resolve,
        &lf_settings(CompileOptions::default()),
    )
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn missing_source_is_file_system_error() {
    let tmp = TempDir::new().unwrap();

    let err = pipeline::compile_file(
        &LocalFs,
        &FakeLess,
        &SourceFile::new(tmp.path().join("gone.less")),
        &OutputTarget::Resolve,
        &lf_settings(CompileOptions::default()),
    )
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileSystem);
    assert!(err.message.starts_with("The file could not be found"));
}

#[test]
fn build_compiles_discovered_sources_and_reports_failures() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "less/ok.less", "a { }");
    write(tmp.path(), "less/broken.less", "a {");
    write(tmp.path(), "node_modules/pkg/vendor.less", "b { }");
    fs::create_dir_all(tmp.path().join("css")).unwrap();

    let sources = scan::discover_sources(tmp.path()).unwrap();
    let report = pipeline::compile_all(
        &LocalFs,
        &FakeLess,
        sources,
        &lf_settings(CompileOptions::verbatim()),
    );

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let broken = report
        .entries
        .iter()
        .find(|e| e.source.name() == "broken.less")
        .unwrap();
    let err = broken.result.as_ref().unwrap_err();
    assert_eq!(err.kind, ErrorKind::CompilerSyntax);
    assert_eq!(err.message, "[Parse]: Missing closing `}` in broken.less");

    assert!(tmp.path().join("css/ok.css").exists());
    assert!(!tmp.path().join("css/broken.css").exists());
    assert!(!tmp.path().join("node_modules/pkg/vendor.css").exists());
}

#[test]
fn project_config_turns_off_banner() {
    let tmp = TempDir::new().unwrap();
    let config_path = write(
        tmp.path(),
        config::CONFIG_FILENAME,
        "[options]\ninsert_banner = false\nremove_line_endings = false\n",
    );
    let source = write(tmp.path(), "a.less", "a {}\n");

    let config = config::load_config(&config_path).unwrap();
    pipeline::compile_file(
        &LocalFs,
        &FakeLess,
        &SourceFile::new(&source),
        &OutputTarget::Resolve,
        &Settings::from_config(&config),
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(tmp.path().join("a.css")).unwrap(),
        "a {} "
    );
}
