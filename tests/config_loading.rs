// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use packwatch::config::{load_and_validate, load_or_default};
use packwatch::errors::PackwatchError;
use packwatch::fs::RealFileSystem;
use packwatch::watch::WatchSource;

type TestResult = Result<(), Box<dyn Error>>;

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos")
}

fn write_config(dir: &TempDir, contents: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.path().join("Packwatch.toml");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn demo_config_loads() -> TestResult {
    let cfg = load_and_validate(demos_dir().join("Packwatch.toml"))?;

    assert_eq!(cfg.base_dir, demos_dir());
    assert_eq!(cfg.project_root(), demos_dir().join("."));
    assert_eq!(cfg.watch.source, vec!["src-rust/**/*.rs".to_string()]);
    assert_eq!(cfg.watch.manifest, vec!["Cargo.*".to_string()]);
    assert_eq!(cfg.build.command_line(), "wasm-pack build --target web --release");
    Ok(())
}

#[test]
fn omitted_sections_fall_back_to_defaults() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        r#"
[watch]
source = ["crate/src/**/*.rs"]
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.base_dir, dir.path());
    assert_eq!(cfg.watch.paths, vec![PathBuf::from(".")]);
    assert_eq!(
        cfg.watch.manifest,
        vec!["Cargo.toml".to_string(), "Cargo.lock".to_string()]
    );
    assert_eq!(cfg.build.program, "wasm-pack");
    Ok(())
}

#[test]
fn relative_root_resolves_next_to_the_config() -> TestResult {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("web/src"))?;
    let path = write_config(
        &dir,
        r#"
[watch]
root = "web"
paths = ["src", "."]
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    let source = WatchSource::configure(cfg.watch_rule(), Arc::new(RealFileSystem))?;

    let root = dir.path().join("web").canonicalize()?;
    assert_eq!(source.root(), root);
    assert_eq!(source.watch_dirs(), [root.join("src"), root.clone()]);
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[watch\nsource = 3")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, PackwatchError::TomlError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn mistyped_fields_are_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[build]\nargs = \"build\"\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, PackwatchError::TomlError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn semantic_errors_are_config_errors() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[watch]\nsource = [\"src/[\"]\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, PackwatchError::ConfigError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn explicit_missing_config_is_an_io_error() -> TestResult {
    let dir = TempDir::new()?;
    let missing = dir.path().join("nope.toml");

    let err = load_or_default(Some(&missing)).unwrap_err();
    assert!(matches!(err, PackwatchError::IoError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn missing_project_root_is_fatal() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[watch]\nroot = \"does-not-exist\"\n")?;

    let cfg = load_and_validate(&path)?;
    let err = WatchSource::configure(cfg.watch_rule(), Arc::new(RealFileSystem)).unwrap_err();
    assert!(matches!(err, PackwatchError::ConfigError(_)), "got {err:?}");
    Ok(())
}
