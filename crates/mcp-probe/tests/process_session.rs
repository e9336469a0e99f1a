//! Session tests against real child processes (shell-script servers).
#![cfg(unix)]

use std::io::Write;
use std::time::Duration;

use mcp_probe::client::ClientOptions;
use mcp_probe::config::{ProbeConfig, ServerCommand};
use mcp_probe::process::ServerProcess;
use mcp_probe::script::{run_tests, script_steps};
use mcp_probe::session::ProbeSession;
use mcp_probe::types::*;

/// Answers every request line with a one-tool `tools/list` result carrying
/// the request's id. Notifications are ignored.
const ECHO_SERVER: &str = r#"#!/bin/sh
echo "mock server booting" >&2
while IFS= read -r line; do
  case "$line" in
    *'"id":'*)
      id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"navigate","description":"Navigate to a URL"}]}}\n' "$id"
      ;;
  esac
done
"#;

fn write_script(dir: &tempfile::TempDir, body: &str) -> String {
    let path = dir.path().join("server.sh");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path.display().to_string()
}

fn config_for(server: ServerCommand) -> ProbeConfig {
    ProbeConfig {
        server,
        settle: Duration::ZERO,
        client: ClientOptions {
            timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        },
        protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
    }
}

fn sh(args: &[&str]) -> ServerCommand {
    ServerCommand {
        program: "sh".to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_session_lists_tools_from_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(&dir, ECHO_SERVER);
    let mut session = ProbeSession::start(&config_for(sh(&[&script]))).await.unwrap();

    let init = session.client().initialize(DEFAULT_PROTOCOL_VERSION).await.unwrap();
    assert_eq!(init["id"], 1);

    let tools = session.client().list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "navigate");

    session.cleanup().await;
}

#[tokio::test]
async fn test_full_script_against_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(&dir, ECHO_SERVER);
    let mut session = ProbeSession::start(&config_for(sh(&[&script]))).await.unwrap();

    let steps = script_steps("http://localhost:8081", DEFAULT_PROTOCOL_VERSION);
    let mut out = Vec::new();
    let report = run_tests(session.client(), &steps, &mut out).await.unwrap();
    session.cleanup().await;

    let transcript = String::from_utf8(out).unwrap();
    assert!(report.all_ok(), "{transcript}");
    assert!(transcript.contains("Found 1 tools"));
    assert!(transcript.contains("- navigate: Navigate to a URL"));
}

#[tokio::test]
async fn test_server_that_exits_yields_empty_response() {
    let mut session = ProbeSession::start(&config_for(sh(&["-c", "exit 0"])))
        .await
        .unwrap();

    let response = session
        .client()
        .call_tool("navigate", serde_json::json!({"url": "http://localhost:8081/test"}))
        .await
        .unwrap();
    assert_eq!(response, serde_json::json!({}));
    assert!(session.client().is_closed());

    session.cleanup().await;
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
    let command = ServerCommand {
        program: "/nonexistent/mcp-probe-test-server".to_string(),
        args: vec![],
    };

    match ProbeSession::start(&config_for(command)).await {
        Err(ProbeError::Spawn { command, .. }) => {
            assert_eq!(command, "/nonexistent/mcp-probe-test-server");
        }
        Err(other) => panic!("expected Spawn error, got {other:?}"),
        Ok(_) => panic!("expected Spawn error, got a session"),
    }
}

#[tokio::test]
async fn test_terminate_stops_long_running_server() {
    let (mut process, _stdout, _stdin) = ServerProcess::spawn(&sh(&["-c", "sleep 30"])).unwrap();
    assert!(process.id().is_some());
    assert!(process.try_status().unwrap().is_none());

    let status = process.terminate(Duration::from_secs(5)).await;
    let status = status.expect("server should exit after kill");
    assert!(!status.success());
}
