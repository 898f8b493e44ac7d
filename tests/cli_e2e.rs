//! End-to-end CLI tests for the openaire binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

mod support;
use support::socket_guard::start_mock_server_or_skip;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_openaire_config(config_home: &std::path::Path, contents: &str) {
    let config_dir = config_home.join("openaire");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), contents).unwrap();
}

/// Command isolated from the caller's config and credentials.
fn openaire_cmd(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("openaire").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("OPENAIRE_API_KEY")
        .env_remove("OPENAIRE_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

async fn mount_products(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/researchProducts"))
        .and(query_param("cursor", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 3, "nextCursor": "c1"},
            "results": [{"id": "r1", "mainTitle": "One"}, {"id": "r2", "mainTitle": "Two, too"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/researchProducts"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 3},
            "results": [{"id": "r3", "mainTitle": "Three"}]
        })))
        .mount(server)
        .await;
}

#[test]
fn test_binary_help_displays_usage() {
    let tempdir = TempDir::new().unwrap();
    openaire_cmd(tempdir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("harvest"))
        .stdout(predicate::str::contains("bibtex"));
}

#[test]
fn test_binary_version_displays_version() {
    let tempdir = TempDir::new().unwrap();
    openaire_cmd(tempdir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_binary_invalid_flag_fails() {
    let tempdir = TempDir::new().unwrap();
    openaire_cmd(tempdir.path())
        .args(["search", "--invalid-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--invalid-flag"));
}

#[test]
fn test_config_show_defaults_without_file() {
    let tempdir = TempDir::new().unwrap();
    openaire_cmd(tempdir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = not found (using defaults)"))
        .stdout(predicate::str::contains(
            "base_url = https://api.openaire.eu/graph/v1/",
        ))
        .stdout(predicate::str::contains("api_key = <none>"))
        .stdout(predicate::str::contains("page_size = 10"));
}

#[test]
fn test_config_show_layers_file_then_flags_and_redacts_key() {
    let tempdir = TempDir::new().unwrap();
    write_openaire_config(
        tempdir.path(),
        r#"
page_size = 25
api_key = "file-secret"
base_url = "http://file.example/graph/"
"#,
    );
    openaire_cmd(tempdir.path())
        .args(["config", "show", "-u", "http://flag.example/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = loaded"))
        .stdout(predicate::str::contains("page_size = 25"))
        .stdout(predicate::str::contains("base_url = http://flag.example/"))
        .stdout(predicate::str::contains("api_key = <redacted>"))
        .stdout(predicate::str::contains("file-secret").not());
}

#[test]
fn test_invalid_config_file_fails_with_key_name() {
    let tempdir = TempDir::new().unwrap();
    write_openaire_config(tempdir.path(), "page_size = 500\n");
    openaire_cmd(tempdir.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));
}

#[tokio::test]
async fn test_search_jsonl_respects_max_results() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_products(&mock_server).await;
    let tempdir = TempDir::new().unwrap();

    let assert = openaire_cmd(tempdir.path())
        .args(["-q", "search", "-f", "jsonl", "--max-results", "2"])
        .args(["-u", &mock_server.uri()])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["id"], "r2");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "second page must not be requested");
}

#[tokio::test]
async fn test_search_csv_pages_through_everything() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_products(&mock_server).await;
    let tempdir = TempDir::new().unwrap();

    openaire_cmd(tempdir.path())
        .args(["-q", "search", "-f", "csv", "-s", "anything"])
        .args(["-u", &mock_server.uri()])
        .assert()
        .success()
        .stdout("id,mainTitle\nr1,One\nr2,\"Two, too\"\nr3,Three\n");
}

#[tokio::test]
async fn test_search_server_error_without_output_exits_one() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    let tempdir = TempDir::new().unwrap();

    let assert = openaire_cmd(tempdir.path())
        .args(["-q", "search", "-f", "jsonl", "-u", &mock_server.uri()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[tokio::test]
async fn test_search_server_error_after_output_exits_two() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(query_param("cursor", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"nextCursor": "c1"},
            "results": [{"id": "r1"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    let tempdir = TempDir::new().unwrap();

    let assert = openaire_cmd(tempdir.path())
        .args(["-q", "search", "-f", "jsonl", "-u", &mock_server.uri()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"r1\""));
    assert_eq!(assert.get_output().status.code(), Some(2));
}

#[tokio::test]
async fn test_harvest_writes_pretty_json_file() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_products(&mock_server).await;
    let tempdir = TempDir::new().unwrap();
    let output_dir = tempdir.path().join("out");

    openaire_cmd(tempdir.path())
        .args(["-q", "harvest", "research software metadata", "--match", "two,three"])
        .arg("--output-dir")
        .arg(&output_dir)
        .args(["-u", &mock_server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total results fetched: 3"));

    let written =
        std::fs::read_to_string(output_dir.join("research_software_metadata.json")).unwrap();
    let records: Vec<Value> = serde_json::from_str(&written).unwrap();
    let ids: Vec<&str> = records.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, ["r2", "r3"]);
    assert!(written.starts_with("[\n  {"));
}

#[tokio::test]
async fn test_bibtex_partial_failure_exits_two() {
    let Some(resolver) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/10.1234/good"))
        .respond_with(ResponseTemplate::new(200).set_body_string("@misc{good}"))
        .mount(&resolver)
        .await;
    Mock::given(method("GET"))
        .and(path("/10.1234/bad"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&resolver)
        .await;

    let tempdir = TempDir::new().unwrap();
    let harvest = tempdir.path().join("harvest.json");
    std::fs::write(
        &harvest,
        serde_json::to_string(&json!([
            {"pids": [{"value": "10.1234/good"}]},
            {"doi": "doi:10.1234/bad"},
            {"mainTitle": "no links"}
        ]))
        .unwrap(),
    )
    .unwrap();
    let bib = tempdir.path().join("library.bib");

    let assert = openaire_cmd(tempdir.path())
        .arg("-q")
        .arg("bibtex")
        .arg(&harvest)
        .arg("-o")
        .arg(&bib)
        .args(["--delay-ms", "0", "--doi-resolver", &resolver.uri()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("with 1/2 entries"));
    assert_eq!(assert.get_output().status.code(), Some(2));
    assert_eq!(std::fs::read_to_string(&bib).unwrap(), "@misc{good}");
}
