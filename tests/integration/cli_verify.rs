#![allow(missing_docs)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use ftree::{
    storage::ftree::{ChildBuffer, TreeBuilder},
    types::Msn,
};
use serde_json::Value;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = dir.path().join("cli.toml");
        fs::write(&config, "").expect("write config");
        Self { dir, config }
    }

    fn image(&self, name: &str, right: &[&str]) -> PathBuf {
        let mut builder = TreeBuilder::new();
        let left = builder.leaf_keys(Msn(3), ["a", "b", "c"]);
        let right = builder.leaf_keys(Msn(3), right.iter().copied());
        let root = builder.internal(
            1,
            Msn(9),
            vec!["m".into()],
            vec![ChildBuffer::empty(left), ChildBuffer::empty(right)],
        );
        let path = self.dir.path().join(format!("{name}.json"));
        let file = File::create(&path).expect("create image");
        builder.into_image(root).write_to(file).expect("write image");
        path
    }
}

#[test]
fn verify_clean_image_exits_zero() {
    let fixture = Fixture::new();
    let image = fixture.image("clean", &["n", "z"]);
    let output = cargo_bin_cmd!("ftree")
        .env("FTREE_CONFIG", &fixture.config)
        .args(["--format", "json", "verify"])
        .arg(&image)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(json["status"]["status"], "clean");
    assert_eq!(json["counts"]["nodes_visited"], 3);
    assert_eq!(json["pinned_before"], json["pinned_after"]);
}

#[test]
fn verify_corrupt_image_exits_two() {
    let fixture = Fixture::new();
    let image = fixture.image("corrupt", &["k", "z"]);
    let output = cargo_bin_cmd!("ftree")
        .env("FTREE_CONFIG", &fixture.config)
        .args(["--format", "json", "verify", "--keep-going"])
        .arg(&image)
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(json["status"]["status"], "needs_repair");
    assert_eq!(json["findings"][0]["check"], "leaf_bounds");
}

#[test]
fn verify_text_lists_findings() {
    let fixture = Fixture::new();
    let image = fixture.image("text", &["k", "z"]);
    let output = cargo_bin_cmd!("ftree")
        .env("FTREE_CONFIG", &fixture.config)
        .args(["--color", "never", "verify"])
        .arg(&image)
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("needs repair"), "{text}");
    assert!(text.contains("leaf entry is outside the inherited bounds"), "{text}");
    assert!(text.contains("[leaf] block"), "{text}");
    assert!(!text.contains('\u{1b}'), "{text}");
}

fn two_bad_leaves(fixture: &Fixture) -> PathBuf {
    let mut builder = TreeBuilder::new();
    let left = builder.leaf_keys(Msn(1), ["b", "a"]);
    let right = builder.leaf_keys(Msn(1), ["z", "n"]);
    let root = builder.internal(
        1,
        Msn(2),
        vec!["m".into()],
        vec![ChildBuffer::empty(left), ChildBuffer::empty(right)],
    );
    let image = fixture.dir.path().join("two.json");
    builder
        .into_image(root)
        .write_to(File::create(&image).expect("create image"))
        .expect("write image");
    image
}

fn finding_count(fixture: &Fixture, image: &Path, extra: &[&str]) -> usize {
    let output = cargo_bin_cmd!("ftree")
        .env("FTREE_CONFIG", &fixture.config)
        .args(["--format", "json", "verify"])
        .args(extra)
        .arg(image)
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    json["findings"].as_array().map(Vec::len).unwrap_or(0)
}

#[test]
fn config_file_enables_keep_going() {
    let fixture = Fixture::new();
    fs::write(&fixture.config, "[verify]\nkeep_going = true\n").expect("write config");
    let image = two_bad_leaves(&fixture);
    assert_eq!(finding_count(&fixture, &image, &[]), 2);
}

#[test]
fn no_keep_going_overrides_config_file() {
    let fixture = Fixture::new();
    fs::write(&fixture.config, "[verify]\nkeep_going = true\nverbose = true\n")
        .expect("write config");
    let image = two_bad_leaves(&fixture);
    assert_eq!(
        finding_count(&fixture, &image, &["--no-keep-going", "--no-verbose"]),
        1
    );
    assert_eq!(
        finding_count(&fixture, &image, &["--no-keep-going", "--keep-going"]),
        2
    );
}

#[test]
fn missing_image_exits_one() {
    let fixture = Fixture::new();
    cargo_bin_cmd!("ftree")
        .env("FTREE_CONFIG", &fixture.config)
        .arg("verify")
        .arg(fixture.dir.path().join("nope.json"))
        .assert()
        .code(1);
}

#[test]
fn inspect_reports_shape() {
    let fixture = Fixture::new();
    let image = fixture.image("inspect", &["n", "z"]);
    let output = cargo_bin_cmd!("ftree")
        .env("FTREE_CONFIG", &fixture.config)
        .args(["--format", "json", "inspect"])
        .arg(&image)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(json["root_height"], 1);
    assert_eq!(json["leaf_entries"], 5);
    assert_eq!(json["nodes_per_height"]["0"], 2);
}
