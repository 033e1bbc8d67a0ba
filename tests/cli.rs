//! End-to-end checks of the `phrasebook` binary.
//!
//! Every test points `PHRASEBOOK_CONFIG` at a temporary file so the user's
//! real configuration and keyring are never touched.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn phrasebook(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("phrasebook").unwrap();
    cmd.env("PHRASEBOOK_CONFIG", config)
        .env_remove("PHRASEBOOK_MODE")
        .env_remove("PHRASEBOOK_TOKEN")
        .env("RUST_LOG", "off");
    cmd
}

/// Config file in test mode whose base refuses connections
fn unreachable_config(dir: &TempDir) -> std::path::PathBuf {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!("mode = \"test\"\nbase_override = \"127.0.0.1:{}/p\"\n", port),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    phrasebook(&dir.path().join("config.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("phrase"))
        .stdout(predicate::str::contains("track"));
}

#[test]
fn config_path_honors_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    phrasebook(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn set_mode_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    phrasebook(&path)
        .args(["config", "set-mode", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode set to: test"));

    phrasebook(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8080/p"))
        .stdout(predicate::str::contains("ws://localhost:8080/p/user/login_qr"));
}

#[test]
fn mode_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    phrasebook(&path)
        .env("PHRASEBOOK_MODE", "test")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8080/p"));
}

#[test]
fn set_base_then_clear() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    phrasebook(&path)
        .args(["config", "set-base", "127.0.0.1:9000/p/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Base set to: 127.0.0.1:9000/p"));

    phrasebook(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://127.0.0.1:9000/p"));

    phrasebook(&path)
        .args(["config", "set-base", "--clear"])
        .assert()
        .success();

    phrasebook(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://www.fishfit.fun:8080/p"));
}

#[test]
fn set_base_rejects_scheme() {
    let dir = TempDir::new().unwrap();
    phrasebook(&dir.path().join("config.toml"))
        .args(["config", "set-base", "https://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not include a scheme"));
}

#[test]
fn invalid_mode_fails() {
    let dir = TempDir::new().unwrap();
    phrasebook(&dir.path().join("config.toml"))
        .args(["config", "set-mode", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid mode 'staging'"));
}

#[test]
fn collect_rejects_bad_json() {
    let dir = TempDir::new().unwrap();
    phrasebook(&dir.path().join("config.toml"))
        .args(["phrase", "collect", "--data", "{oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data is not valid JSON"));
}

#[test]
fn track_never_fails_when_unreachable() {
    let dir = TempDir::new().unwrap();
    let path = unreachable_config(&dir);

    phrasebook(&path)
        .args(["track", "--data", r#"{"kind":"open"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("fetchReq_/phrase_err"));
}

#[test]
fn collect_reports_unreachable_server() {
    let dir = TempDir::new().unwrap();
    let path = unreachable_config(&dir);

    phrasebook(&path)
        .env("PHRASEBOOK_TOKEN", "tok-abc")
        .args(["phrase", "collect", "--data", r#"{"phrase":"x"}"#])
        .assert()
        .failure()
        .stdout(predicate::str::contains("fetchReq_/phrase_err"))
        .stderr(predicate::str::contains("网络开小差了!"))
        .stderr(predicate::str::contains("Request failed"));
}
