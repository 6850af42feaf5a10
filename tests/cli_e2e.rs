//! End-to-end CLI tests for the mml-sync binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::{
    API_KEY, FeedItem, atom_page, mount_file, mount_first_page, scope, valid_archive,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command with an isolated config environment.
fn mml_sync(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mml-sync").unwrap();
    cmd.current_dir(config_home.path())
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("MML_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// Writes `./mml-sync.toml` pointing at the mock server.
fn write_local_config(dir: &TempDir, server: &MockServer) {
    std::fs::write(
        dir.path().join("mml-sync.toml"),
        format!(
            "api_key = \"{API_KEY}\"\natom_url = \"{}/feed\"\nnum_workers = 2\n",
            server.uri()
        ),
    )
    .unwrap();
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("mml-sync").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("list"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("mml-sync").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mml-sync"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("mml-sync").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_load_without_product_fails_before_network() {
    let home = TempDir::new().unwrap();
    mml_sync(&home)
        .args(["load", "-t", "1", "-f", "gml", "-d", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("product"));
    assert!(!home.path().join("out").exists());
}

#[test]
fn test_load_without_destination_fails() {
    let home = TempDir::new().unwrap();
    mml_sync(&home)
        .args(["load", "-p", "maastotietokanta", "-t", "1", "-f", "gml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("destination"));
}

#[test]
fn test_load_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    mml_sync(&home)
        .args(["load", "-p", "maastotietokanta", "-t", "1", "-f", "gml", "-d", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MML_API_KEY"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("mml-sync.toml"), "num_workers = 0\n").unwrap();
    mml_sync(&home)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("num_workers"));
}

#[tokio::test]
async fn test_list_prints_catalog() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    write_local_config(&home, &server);
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:nls="http://xml.nls.fi/atom">
  <entry>
    <id>urn:product:maastotietokanta</id>
    <title>Maastotietokanta</title>
    <updated>2024-05-01T06:30:00Z</updated>
    <nls:distributionFormat>application/gml+xml</nls:distributionFormat>
  </entry>
</feed>"#,
        ))
        .mount(&server)
        .await;

    let assert = tokio::task::spawn_blocking(move || {
        let assert = mml_sync(&home).arg("list").assert();
        drop(home);
        assert
    })
    .await
    .unwrap();

    assert.success().stdout(
        "2024-05-01T06:30:00Z\tMaastotietokanta\n\
         urn:product:maastotietokanta\n\
         \tapplication/gml+xml\n\
         \n",
    );
}

#[tokio::test]
async fn test_load_syncs_scope_and_prints_product() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    write_local_config(&home, &server);
    let item = FeedItem::new(&server, "a.zip", "2024-01-01T00:00:00Z");
    mount_first_page(&server, atom_page(&[item.clone()], None)).await;
    mount_file(&server, "a.zip", valid_archive()).await;

    let product = scope().product;
    let expected_file = home.path().join("out").join(item.relative_path());
    let state_file = home.path().join("out").join("sync-state.json");

    let assert = tokio::task::spawn_blocking(move || {
        let assert = mml_sync(&home)
            .args(["load", "-p", &product, "-t", "1", "-f", "gml", "-d", "out"])
            .assert();
        (assert, home)
    })
    .await
    .unwrap();
    let (assert, _home) = assert;

    assert
        .success()
        .stdout(predicate::str::contains("maastotietokanta"));
    assert!(expected_file.is_file());
    assert!(state_file.is_file());
}
