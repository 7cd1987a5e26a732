use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config. The remote points at a closed port and
/// no cycle runs on start.
fn minimal_config(port: u16, db_path: &Path) -> String {
    format!(
        r#"
[remote]
engine_key = "engine"
consumer_key = "consumer"
search_url = "http://127.0.0.1:9/api/v1/public/engines/search.json"
detail_base_url = "http://127.0.0.1:9"

[database]
path = "{}"

[server]
host = "127.0.0.1"
port = {}
"#,
        db_path.display(),
        port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_mirror"))
        .env("MIRROR_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Run the binary to completion and return its exit status
async fn run_to_exit(config_path: &Path) -> std::process::Output {
    timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_mirror"))
            .env("MIRROR_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let data_dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config = write_config(&minimal_config(port, &data_dir.path().join("mirror.db")));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_startup_creates_database() {
    let data_dir = TempDir::new().unwrap();
    let db_path = data_dir.path().join("mirror.db");
    let port = get_available_port();
    let config = write_config(&minimal_config(port, &db_path));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );
    assert!(db_path.exists());

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/series/stats", port))
        .send()
        .await
        .expect("Failed to send request");
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["series"], 0);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let data_dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config = write_config(&minimal_config(port, &data_dir.path().join("mirror.db")));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let text = response.text().await.expect("Failed to read body");
    let json: serde_json::Value = serde_json::from_str(&text).expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["remote"]["engine_key_configured"], true);
    assert!(!text.contains("\"consumer\""));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = run_to_exit(Path::new("/nonexistent/config.toml")).await;

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_missing_remote_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );

    let result = run_to_exit(config.path()).await;

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_page_size_exits_with_error() {
    let config = write_config(
        r#"
[remote]
engine_key = "engine"
consumer_key = "consumer"
page_size = 0
"#,
    );

    let result = run_to_exit(config.path()).await;

    assert!(!result.status.success());
}
