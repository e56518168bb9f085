//! Runs the `character-get` and `test-api-key` binaries end to end.

mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::character_server;

// Isolate from the user's environment and config files.
fn command(bin: &str, cwd: &Path) -> Command {
    let mut cmd = Command::new(bin);
    cmd.current_dir(cwd)
        .env_remove("CONVAI_API_KEY")
        .env_remove("CONVAI_CHARACTER_ID")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", cwd.join("xdg"))
        .env("XDG_CONFIG_DIRS", cwd.join("xdg-dirs"));
    cmd
}

fn character_get(cwd: &Path) -> Command {
    command(env!("CARGO_BIN_EXE_character-get"), cwd)
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn prints_body_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let server = character_server::start(200, r#"{"ok":true}"#);

    let out = character_get(dir.path())
        .env("CONVAI_API_KEY", "cli-test-key")
        .args(["--endpoint", server.url.as_str()])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout(&out), "{\"ok\":true}\n");
}

#[test]
fn server_error_exits_nonzero_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let server = character_server::start(500, r#"{"ok":false}"#);

    let out = character_get(dir.path())
        .env("CONVAI_API_KEY", "cli-test-key")
        .args(["--endpoint", server.url.as_str()])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("HTTP 500"));
}

#[test]
fn positional_id_and_key_file_are_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("CONVAI_API_KEY"), "key-from-file\n").unwrap();
    let server = character_server::start(200, "[]");

    let out = character_get(dir.path())
        .args(["my-char", "--endpoint", server.url.as_str()])
        .output()
        .unwrap();
    assert!(out.status.success());

    let req = server.next_request();
    assert_eq!(req.header("CONVAI-API-KEY"), Some("key-from-file"));
    assert_eq!(req.body, r#"{"charID":"my-char"}"#);
}

#[test]
fn config_file_supplies_settings() {
    let dir = tempfile::tempdir().unwrap();
    let server = character_server::start(200, "{}");
    let config = dir.path().join("convai.toml");
    std::fs::write(
        &config,
        format!("api_key = \"toml-key\"\ncharacter_id = \"toml-char\"\nendpoint = \"{}\"\n", server.url),
    )
    .unwrap();

    let out = character_get(dir.path())
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success());

    let req = server.next_request();
    assert_eq!(req.header("CONVAI-API-KEY"), Some("toml-key"));
    assert_eq!(req.body, r#"{"charID":"toml-char"}"#);
}

#[test]
fn missing_key_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let server = character_server::start(200, "{}");

    let out = character_get(dir.path())
        .args(["--endpoint", server.url.as_str()])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no API key found"));
    assert!(server.no_more_requests());
}

#[test]
fn dry_run_masks_key_and_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();

    let out = character_get(dir.path())
        .env("CONVAI_API_KEY", "abcdefgh12345678")
        .args(["--dry-run", "some-char"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.starts_with("POST https://api.convai.com/character/get\n"));
    assert!(text.contains("CONVAI-API-KEY: ****5678"));
    assert!(!text.contains("abcdefgh"));
    assert!(text.contains(r#"{"charID":"some-char"}"#));
}

#[test]
fn test_api_key_reports_masked_key() {
    let dir = tempfile::tempdir().unwrap();

    let out = command(env!("CARGO_BIN_EXE_test-api-key"), dir.path())
        .env("CONVAI_API_KEY", "abcdefgh12345678")
        .output()
        .unwrap();

    assert!(out.status.success());
    assert_eq!(stdout(&out), "api key: ****5678 (from $CONVAI_API_KEY)\n");
}
