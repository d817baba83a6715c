use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use flowconfig::FlowConfig;
use tempfile::TempDir;

fn flowpaper(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowpaper"))
        .args(args)
        .env("FLOWPAPER_CONFIG_DIR", config_dir)
        .env_remove("FLOWPAPER_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch flowpaper")
}

#[test]
fn config_init_writes_parseable_defaults() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("flowpaper");

    let output = flowpaper(&config_dir, &["config", "init"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(config_dir.join("flowpaper.toml")).unwrap();
    let parsed = FlowConfig::from_toml_str(&written).unwrap();
    assert_eq!(parsed, FlowConfig::default());
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("flowpaper");
    fs::create_dir_all(&config_dir).unwrap();
    let target = config_dir.join("flowpaper.toml");
    fs::write(&target, "version = 1\n").unwrap();

    let refused = flowpaper(&config_dir, &["config", "init"]);
    assert!(!refused.status.success());
    assert!(String::from_utf8_lossy(&refused.stderr).contains("--force"));
    assert_eq!(fs::read_to_string(&target).unwrap(), "version = 1\n");

    let forced = flowpaper(&config_dir, &["config", "init", "--force"]);
    assert!(forced.status.success());
    assert_ne!(fs::read_to_string(&target).unwrap(), "version = 1\n");
}

#[test]
fn config_where_prints_resolved_file() {
    let root = TempDir::new().unwrap();
    let output = flowpaper(root.path(), &["config", "where"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        root.path().join("flowpaper.toml").display().to_string()
    );
}

#[test]
fn still_export_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("frames/still.png");

    let output = flowpaper(
        root.path(),
        &[
            "--still-export",
            out.to_str().unwrap(),
            "--size",
            "16x9",
            "--still-time",
            "2.5",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    // IHDR width and height, big-endian.
    assert_eq!(u32::from_be_bytes(bytes[16..20].try_into().unwrap()), 16);
    assert_eq!(u32::from_be_bytes(bytes[20..24].try_into().unwrap()), 9);
}

#[test]
fn invalid_config_file_is_reported() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("flowpaper.toml"), "[palette]\nbackground = \"nope\"\n").unwrap();
    let out = root.path().join("still.png");

    let output = flowpaper(
        root.path(),
        &["--still-export", out.to_str().unwrap(), "--size", "4x4"],
    );
    assert!(!output.status.success());
    assert!(!out.exists());
}
