mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use support::fake_ftp::FakeFtpServer;
use tempfile::TempDir;

// Nothing listens here; runs that reach the network fail fast.
const UNREACHABLE_PREFIX: &str = "ftp://127.0.0.1:1/pub/";

fn setup(manifest: &str, present: &[&str]) -> TempDir {
    let root = TempDir::new().unwrap();
    let store = root.path().join("store");
    fs::create_dir(&store).unwrap();
    for name in present {
        fs::write(store.join(name), b"already here").unwrap();
    }
    fs::write(root.path().join("data.txt"), manifest).unwrap();
    root
}

fn climafetch(root: &Path) -> Command {
    climafetch_from(root, UNREACHABLE_PREFIX)
}

fn climafetch_from(root: &Path, url_prefix: &str) -> Command {
    let mut cmd = Command::cargo_bin("climafetch").unwrap();
    cmd.current_dir(root)
        .env_remove("RUST_LOG")
        .env_remove("CLIMAFETCH_DIRECTORY")
        .env_remove("CLIMAFETCH_MANIFEST")
        .args(["--directory", "store", "--manifest", "data.txt"])
        .args(["--url-prefix", url_prefix]);
    cmd
}

#[test]
fn generate_config_writes_sample() {
    let root = TempDir::new().unwrap();

    Command::cargo_bin("climafetch")
        .unwrap()
        .current_dir(root.path())
        .arg("--generate-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("climafetch.toml"));

    let content = fs::read_to_string(root.path().join("climafetch.toml")).unwrap();
    assert!(content.contains("[source]"));
    assert!(content.contains("ftp-cdc.dwd.de"));
}

#[test]
fn dry_run_lists_missing_entries_with_manifest_position() {
    let root = setup("x 1 a.txt\ny 2 b.txt\nz 3 c.txt\n", &["a.txt", "c.txt"]);

    climafetch(root.path())
        .args(["--dry-run", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2] b.txt <- ftp://127.0.0.1:1/pub/b.txt"))
        .stdout(predicate::str::contains("a.txt <-").not())
        .stdout(predicate::str::contains("Saved file").not());

    assert!(!root.path().join("store").join("b.txt").exists());
}

#[test]
fn all_present_needs_no_connection() {
    let root = setup("a.txt\nb.txt\n", &["a.txt", "b.txt"]);

    climafetch(root.path()).assert().success().stdout("");
}

#[test]
fn default_run_prints_only_saved_lines() {
    let server = FakeFtpServer::start(&[("b.txt", b"hourly air temperature")]);
    let root = setup("x 1 a.txt\ny 2 b.txt\nz 3 c.txt\n", &["a.txt", "c.txt"]);

    climafetch_from(root.path(), &server.prefix("/pub/"))
        .assert()
        .success()
        .stdout("Saved file 2\n");

    assert_eq!(
        fs::read(root.path().join("store").join("b.txt")).unwrap(),
        b"hourly air temperature"
    );
    assert_eq!(server.commands().last().map(String::as_str), Some("QUIT"));
}

#[test]
fn verbose_run_adds_summary() {
    let server = FakeFtpServer::start(&[("b.txt", b"data")]);
    let root = setup("a.txt\nb.txt\n", &["a.txt"]);

    climafetch_from(root.path(), &server.prefix("/pub/"))
        .args(["-v", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved file 2"))
        .stdout(predicate::str::contains("Files saved: 1"));
}

#[test]
fn missing_remote_file_aborts_after_saving_earlier_ones() {
    let server = FakeFtpServer::start(&[("a.txt", b"first")]);
    let root = setup("a.txt\ngone.txt\nc.txt\n", &[]);

    climafetch_from(root.path(), &server.prefix("/pub/"))
        .assert()
        .code(5)
        .stdout("Saved file 1\n");

    let store = root.path().join("store");
    assert!(store.join("a.txt").exists());
    assert!(!store.join("gone.txt").exists());
    assert!(!store.join("c.txt").exists());
    assert_eq!(server.commands().last().map(String::as_str), Some("QUIT"));
}

#[test]
fn missing_storage_directory_is_an_io_error() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("data.txt"), "a.txt\n").unwrap();

    climafetch(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("store is not a directory"))
        .stderr(predicate::str::contains("--directory"));
}

#[test]
fn unreachable_server_aborts_with_network_code() {
    let root = setup("a.txt\nb.txt\n", &["a.txt"]);

    climafetch(root.path())
        .args(["--quiet", "--timeout", "2"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("Saved file").not());

    assert!(!root.path().join("store").join("b.txt").exists());
}

#[test]
fn blank_manifest_line_is_rejected() {
    let root = setup("a.txt\n\nb.txt\n", &["a.txt", "b.txt"]);

    climafetch(root.path())
        .arg("--quiet")
        .assert()
        .code(6)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn non_ftp_prefix_is_rejected_by_argument_parser() {
    let root = setup("a.txt\n", &[]);

    Command::cargo_bin("climafetch")
        .unwrap()
        .current_dir(root.path())
        .args(["--url-prefix", "https://example.com/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ftp://"));
}
