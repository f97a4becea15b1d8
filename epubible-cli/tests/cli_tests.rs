//! Integration tests for the epubible CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Default template set shipped with the CLI
fn templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Write a saved /values response for offline builds
fn create_values_file(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("values.json");
    fs::write(&path, content).expect("Failed to write values file");
    path
}

const GENESIS: &str = r#"{
  "results": {
    "id": {
      "0a1b": {
        "fluiddb/about": {"value": "Genesis:1:2"},
        "kingjamesbible/text": {"value": "And the earth was without form,&nbsp;and void"}
      },
      "0a1a": {
        "fluiddb/about": {"value": "Genesis:1:1"},
        "kingjamesbible/text": {"value": "In the beginning God created the heaven and the earth."}
      },
      "0a1c": {
        "fluiddb/about": {"value": "Genesis:2:1"},
        "kingjamesbible/text": {"value": "Thus the heavens and the earth were finished"},
        "ntoll/notes": {"value": ["https://example.invalid/notes.pdf"]}
      },
      "bad": {
        "fluiddb/about": {"value": "not a verse"}
      }
    }
  }
}"#;

fn epubible() -> Command {
    let mut cmd = Command::cargo_bin("epubible").unwrap();
    cmd.env_remove("EPUBIBLE_USERNAME")
        .env_remove("EPUBIBLE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn read_zip(path: &Path) -> zip::ZipArchive<fs::File> {
    zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap()
}

#[test]
fn test_help() {
    epubible()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_version() {
    epubible()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("epubible"));
}

#[test]
fn test_build_help() {
    epubible()
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Build a customised EPUB"))
        .stdout(predicate::str::contains("--tags"))
        .stdout(predicate::str::contains("--query"))
        .stdout(predicate::str::contains("--no-mark-read"));
}

#[test]
fn test_build_requires_username() {
    epubible()
        .args(["build", "--query", "has kingjamesbible/text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--username"));
}

#[test]
fn test_build_live_requires_password() {
    let out = TempDir::new().unwrap();
    epubible()
        .args(["build", "-u", "ntoll", "-q", "has kingjamesbible/text", "-o"])
        .arg(out.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("password"));
}

#[test]
fn test_build_from_saved_values() {
    let dir = TempDir::new().unwrap();
    let values = create_values_file(&dir, GENESIS);
    let out = dir.path().join("out");
    let log = dir.path().join("epubible.log");

    epubible()
        .args(["--log-file"])
        .arg(&log)
        .args(["build", "-u", "ntoll", "--tags", "kingjamesbible/text, ntoll/notes"])
        .arg("--source-file")
        .arg(&values)
        .arg("--template-dir")
        .arg(templates())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 malformed records"));

    let archive = out.join("bible.epub");
    assert!(archive.exists());
    let leftovers: Vec<_> = fs::read_dir(&out).unwrap().collect();
    assert_eq!(leftovers.len(), 1, "working tree should be removed");

    let mut zip = read_zip(&archive);
    {
        let first = zip.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), zip::CompressionMethod::Stored);
    }
    let mut html = String::new();
    std::io::Read::read_to_string(&mut zip.by_name("OEBPS/bible.html").unwrap(), &mut html)
        .unwrap();
    let first = html.find("In the beginning").unwrap();
    let second = html.find("And the earth was without form,and void").unwrap();
    let third = html.find("<br/><br/>Thus the heavens").unwrap();
    assert!(first < second && second < third);
    assert!(!html.contains("&nbsp;"));
    assert!(!html.contains("notes.pdf"));
    assert!(zip.by_name("OEBPS/images/cover.png").is_ok());

    let log = fs::read_to_string(&log).unwrap();
    assert!(log.contains("Not a valid image"));
}

#[test]
fn test_missing_source_file_builds_empty_book() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    epubible()
        .args(["build", "-u", "ntoll", "--no-mark-read"])
        .arg("--source-file")
        .arg(dir.path().join("absent.json"))
        .arg("--template-dir")
        .arg(templates())
        .arg("-o")
        .arg(&out)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("0 verses"));

    let mut zip = read_zip(&out.join("bible.epub"));
    assert_eq!(zip.by_index(0).unwrap().name(), "mimetype");
}

#[test]
fn test_broken_template_set_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let values = create_values_file(&dir, GENESIS);
    let broken = dir.path().join("templates");
    fs::create_dir_all(broken.join("OEBPS")).unwrap();
    fs::write(broken.join("OEBPS/bible.html"), "{% for item in items %}").unwrap();
    let out = dir.path().join("out");

    epubible()
        .args(["build", "-u", "ntoll"])
        .arg("--source-file")
        .arg(&values)
        .arg("--template-dir")
        .arg(&broken)
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to assemble EPUB"));

    assert!(!out.join("bible.epub").exists());
    let leftovers = fs::read_dir(&out).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[test]
fn test_bad_mimetype_is_packaging_failure() {
    let dir = TempDir::new().unwrap();
    let values = create_values_file(&dir, GENESIS);
    let templates_copy = dir.path().join("templates");
    fs::create_dir_all(&templates_copy).unwrap();
    fs::write(templates_copy.join("mimetype"), "application/zip").unwrap();
    let out = dir.path().join("out");

    epubible()
        .args(["build", "-u", "ntoll"])
        .arg("--source-file")
        .arg(&values)
        .arg("--template-dir")
        .arg(&templates_copy)
        .arg("-o")
        .arg(&out)
        .assert()
        .code(3);

    assert!(!out.join("bible.epub").exists());
}

#[test]
fn test_config_file_sets_title_and_archive_name() {
    let dir = TempDir::new().unwrap();
    let values = create_values_file(&dir, GENESIS);
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        r#"{"title": "Genesis for Nicholas", "archive_name": "genesis.epub"}"#,
    )
    .unwrap();
    let out = dir.path().join("out");

    epubible()
        .args(["build", "-u", "ntoll", "-c"])
        .arg(&config)
        .arg("--source-file")
        .arg(&values)
        .arg("--template-dir")
        .arg(templates())
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let mut zip = read_zip(&out.join("genesis.epub"));
    let mut opf = String::new();
    std::io::Read::read_to_string(&mut zip.by_name("OEBPS/content.opf").unwrap(), &mut opf)
        .unwrap();
    assert!(opf.contains("<dc:title>Genesis for Nicholas</dc:title>"));
    assert!(opf.contains("<dc:contributor opf:role=\"edt\">ntoll</dc:contributor>"));
}

#[test]
fn test_inspect_built_archive() {
    let dir = TempDir::new().unwrap();
    let values = create_values_file(&dir, GENESIS);
    let out = dir.path().join("out");

    epubible()
        .args(["build", "-u", "ntoll"])
        .arg("--source-file")
        .arg(&values)
        .arg("--template-dir")
        .arg(templates())
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let output = epubible()
        .args(["inspect", "--json"])
        .arg(out.join("bible.epub"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let members: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(members[0]["name"], "mimetype");
    assert_eq!(members[0]["compressed"], false);
    assert_eq!(members[1]["compressed"], true);
}

#[test]
fn test_inspect_rejects_plain_zip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.epub");
    {
        let mut zip = zip::ZipWriter::new(fs::File::create(&path).unwrap());
        zip.start_file("content.opf", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut zip, b"<package/>").unwrap();
        zip.finish().unwrap();
    }

    epubible()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid EPUB container"));
}
