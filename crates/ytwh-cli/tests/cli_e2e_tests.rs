//! End-to-end tests for the ytwh binary
//!
//! Each test runs against its own SQLite file in a temporary directory; the
//! ingestion tests point the binary at a wiremock server instead of YouTube.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Binary isolated from the caller's environment, working inside `dir`
fn ytwh(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ytwh").unwrap();
    cmd.current_dir(dir.path())
        .env("DATABASE_URL", format!("sqlite:{}", dir.path().join("warehouse.db").display()))
        .env_remove("YOUTUBE_API_KEY")
        .env_remove("YOUTUBE_API_BASE_URL")
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_OUTPUT")
        .env_remove("LOG_FORMAT");
    cmd
}

fn list_response(items: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
}

async fn mock_youtube() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "UC_X"))
        .respond_with(list_response(vec![json!({
            "id": "UC_X",
            "snippet": { "title": "Rust Talks", "description": "" },
            "contentDetails": { "relatedPlaylists": { "uploads": "UU_X" } },
            "statistics": { "viewCount": "10", "subscriberCount": "42" }
        })]))
        .mount(&server)
        .await;

    // any other channel id is unknown
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(list_response(vec![]))
        .with_priority(10)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(list_response(vec![
            json!({ "contentDetails": { "videoId": "vid_A" } }),
            json!({ "contentDetails": { "videoId": "vid_B" } }),
        ]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "vid_A"))
        .respond_with(list_response(vec![json!({
            "id": "vid_A",
            "snippet": { "title": "Ownership" },
            "statistics": { "viewCount": "5" }
        })]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "vid_B"))
        .respond_with(list_response(vec![]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", "vid_A"))
        .respond_with(list_response(vec![json!({
            "id": "c1",
            "snippet": { "topLevelComment": { "snippet": { "textOriginal": "nice", "authorDisplayName": "@a" } } }
        })]))
        .mount(&server)
        .await;

    server
}

// ============================================================================
// Schema and statistics
// ============================================================================

#[test]
fn test_init_db_creates_database_file() {
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .arg("init-db")
        .assert()
        .success()
        .stdout(predicate::str::contains("Warehouse schema ready"));

    assert!(dir.path().join("warehouse.db").exists());

    // running it again keeps working
    ytwh(&dir).arg("init-db").assert().success();
}

#[test]
fn test_stats_on_fresh_database() {
    let dir = TempDir::new().unwrap();

    let output = ytwh(&dir)
        .args(["stats", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let counts: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts, json!({ "channels": 0, "videos": 0, "comments": 0 }));
}

// ============================================================================
// Query command
// ============================================================================

#[test]
fn test_query_rejects_writes() {
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .args(["query", "DROP TABLE channels"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Query not allowed"));
}

#[test]
fn test_query_reports_syntax_errors() {
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .args(["query", "SELEC * FRM channels"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid SQL syntax"));
}

#[test]
fn test_failed_command_flushes_file_log() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");

    ytwh(&dir)
        .env("LOG_OUTPUT", "file")
        .env("LOG_DIR", &log_dir)
        .args(["query", "DROP TABLE channels"])
        .assert()
        .failure()
        .code(1);

    let logged: String = std::fs::read_dir(&log_dir)
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    assert!(logged.contains("Command failed"), "log files: {:?}", logged);
}

/// Ctrl-C must keep its default meaning outside of `ingest`
#[cfg(unix)]
#[test]
fn test_interrupt_stops_running_query() {
    let dir = TempDir::new().unwrap();
    ytwh(&dir).arg("init-db").assert().success();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("ytwh"))
        .current_dir(dir.path())
        .env("DATABASE_URL", format!("sqlite:{}", dir.path().join("warehouse.db").display()))
        .env_remove("LOG_OUTPUT")
        .args([
            "query",
            "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n) SELECT COUNT(*) FROM n",
        ])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(500));
    let sent = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break Some(status);
        }
        if Instant::now() > deadline {
            break None;
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    if status.is_none() {
        child.kill().unwrap();
        panic!("query kept running after SIGINT");
    }
    assert!(!status.unwrap().success());
}

#[test]
fn test_query_empty_table_as_csv() {
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .args(["query", "SELECT name FROM channels", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Ingest command
// ============================================================================

#[test]
fn test_ingest_requires_api_key_for_youtube() {
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .args(["ingest", "UC_X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YOUTUBE_API_KEY"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ingest_then_query() {
    let server = mock_youtube().await;
    let dir = TempDir::new().unwrap();

    let output = ytwh(&dir)
        .args(["ingest", "UC_X", "--format", "json", "--api-base-url", &server.uri()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["channel_id"], "UC_X");
    assert_eq!(summary["videos_written"], 1);
    assert_eq!(summary["comments_written"], 1);
    assert_eq!(summary["cancelled"], false);
    assert_eq!(summary["warnings"][0]["kind"], "video_missing");

    ytwh(&dir)
        .args([
            "query",
            "SELECT c.name, v.video_id FROM channels c JOIN videos v ON v.channel_id = c.id",
            "--format",
            "tsv",
        ])
        .assert()
        .success()
        .stdout(predicate::eq("name\tvideo_id\nRust Talks\tvid_A\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ingest_table_output_lists_warnings() {
    let server = mock_youtube().await;
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .args(["ingest", "UC_X", "--api-base-url", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("video vid_B no longer exists"))
        .stdout(predicate::str::contains("Ingestion of"));

    let output = ytwh(&dir).args(["stats", "--format", "json"]).output().unwrap();
    let counts: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts, json!({ "channels": 1, "videos": 1, "comments": 1 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ingest_unknown_channel_fails() {
    let server = mock_youtube().await;
    let dir = TempDir::new().unwrap();

    ytwh(&dir)
        .args(["ingest", "UC_MISSING", "--api-base-url", &server.uri()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Channel not found: UC_MISSING"));
}
