//! Integration tests driving the `apidoc` binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn apidoc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_apidoc"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A fresh repo holding the fixture config and model.
fn temp_repo(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("apidoc-build-test").join(name);
    // Clean up from previous runs
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::copy(fixture("apidoc.json"), dir.join("apidoc.json")).unwrap();
    fs::copy(fixture("api.json"), dir.join("api.json")).unwrap();
    dir
}

fn run_in(dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(apidoc_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run apidoc")
}

#[test]
fn build_writes_every_page() {
    let repo = temp_repo("pages");
    let output = run_in(&repo, &["build", "--quiet"]);
    assert!(output.status.success(), "apidoc build should succeed");

    let index = fs::read_to_string(repo.join("out/index.md")).expect("index.md should exist");
    assert!(index.starts_with("<!-- Do not edit this file."));
    assert!(index.contains("\n# Widgets API\n"));
    assert!(index.contains("## <a name=\"functions\"></a>Functions\n"));
    assert!(index.contains("### <a name=\"createwidget\"></a>createWidget\n"));
    assert!(index.contains("<a href=\"types/widget.md#widgetoptions\">WidgetOptions</a>"));
    assert!(index.contains("<a href=\"types/widget.md#widget\">Widget</a>"));
    assert!(index.contains("Creates a widget. Call `widget.dispose()` when done."));
    assert!(index.contains("(https://github.com/acme/widgets/blob/main/src/create.ts#L12)"));

    let types = fs::read_to_string(repo.join("out/types/widget.md"))
        .expect("types/widget.md should exist");
    assert!(types.contains("1. [Widget](#widget)\n"));
    assert!(types.contains("```typescript\nexport declare class Widget {}\n```"));
    assert!(types.contains("Options for a widget."));

    let _ = fs::remove_dir_all(&repo);
}

#[test]
fn rebuild_leaves_unchanged_pages_alone() {
    let repo = temp_repo("unchanged");
    assert!(run_in(&repo, &["build", "--quiet"]).status.success());

    let output = run_in(&repo, &["build"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pages: 2 unchanged"), "got: {stdout}");

    let _ = fs::remove_dir_all(&repo);
}

#[test]
fn prune_removes_stale_pages() {
    let repo = temp_repo("prune");
    fs::create_dir_all(repo.join("out/old")).unwrap();
    fs::write(repo.join("out/old/gone.md"), "stale").unwrap();
    fs::write(repo.join("out/notes.txt"), "kept").unwrap();

    let output = run_in(&repo, &["build", "--prune", "--quiet"]);
    assert!(output.status.success());
    assert!(!repo.join("out/old/gone.md").exists());
    assert!(repo.join("out/notes.txt").exists());
    assert!(repo.join("out/index.md").exists());

    let _ = fs::remove_dir_all(&repo);
}

#[test]
fn dry_run_writes_nothing() {
    let repo = temp_repo("dry-run");
    let output = run_in(&repo, &["build", "--dry-run"]);
    assert!(output.status.success());
    assert!(!repo.join("out").exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pages: 2 created"), "got: {stdout}");

    let _ = fs::remove_dir_all(&repo);
}

#[test]
fn build_fails_without_model() {
    let repo = temp_repo("no-model");
    fs::remove_file(repo.join("api.json")).unwrap();

    let output = run_in(&repo, &["build", "--quiet"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("api.json"));

    let _ = fs::remove_dir_all(&repo);
}

#[test]
fn build_rejects_page_outside_out_dir() {
    let repo = temp_repo("escape");
    let config = fs::read_to_string(repo.join("apidoc.json"))
        .unwrap()
        .replace("types/widget.md", "../escaped.md");
    fs::write(repo.join("apidoc.json"), config).unwrap();

    let output = run_in(&repo, &["build", "--quiet"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'../escaped.md' escapes outDir"), "got: {stderr}");
    assert!(!repo.join("escaped.md").exists());

    let _ = fs::remove_dir_all(&repo);
}

#[test]
fn render_json_and_yaml_trees() {
    let output = Command::new(apidoc_bin())
        .args(["render", fixture("node.json").to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("## <a name=\"usage\"></a>Usage\n"));
    assert!(stdout.contains("Call it \\*once\\*."));

    let output = Command::new(apidoc_bin())
        .args(["render", fixture("node.yaml").to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("From YAML."));
}

#[test]
fn render_html_preview() {
    let output = Command::new(apidoc_bin())
        .args(["render", fixture("node.json").to_str().unwrap(), "--format", "html"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<!DOCTYPE html>"));
    assert!(stdout.contains("<a name=\"usage\"></a>Usage</h2>"));
}

#[test]
fn validate_reports_ok_and_errors() {
    let output = Command::new(apidoc_bin())
        .args(["validate", fixture("node.json").to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("OK"));

    let output = Command::new(apidoc_bin())
        .args(["validate", fixture("invalid.json").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("[V001]"));
}
