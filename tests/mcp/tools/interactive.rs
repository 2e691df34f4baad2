use codex_mcp::{
    codex::ApprovalMode,
    config::Config,
    mcp::types::{InteractiveParams, SessionCloseParams, SessionSendParams},
};
use pretty_assertions::assert_eq;
use rmcp::{handler::server::wrapper::Parameters, model::ErrorCode};
use serde_json::Value;

use crate::{INTERACTIVE, McpTestFixture, error_text, extract_tool_result_json};

fn send(session_id: &str, message: &str) -> Parameters<SessionSendParams> {
    Parameters(SessionSendParams {
        session_id: session_id.to_string(),
        message: message.to_string(),
    })
}

fn close(session_id: &str) -> Parameters<SessionCloseParams> {
    Parameters(SessionCloseParams {
        session_id: session_id.to_string(),
    })
}

fn session_id(reply: &Value) -> String {
    reply["sessionId"]
        .as_str()
        .expect("reply should carry a sessionId")
        .to_string()
}

#[tokio::test]
async fn test_start_send_close() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server();

    let started = extract_tool_result_json(
        &server
            .codex_interactive(Parameters(InteractiveParams::default()))
            .await
            .unwrap(),
    );
    assert_eq!(started["running"], true);
    assert!(started["output"].as_str().unwrap().contains("started:"));
    assert!(
        started["command"]
            .as_str()
            .unwrap()
            .contains("--approval-mode suggest")
    );
    let id = session_id(&started);

    let reply =
        extract_tool_result_json(&server.codex_session_send(send(&id, "hello")).await.unwrap());
    assert_eq!(reply["sessionId"], id.as_str());
    assert_eq!(reply["output"].as_str().unwrap().trim(), "echo: hello");
    assert_eq!(reply["running"], true);

    let closed = extract_tool_result_json(&server.codex_session_close(close(&id)).await.unwrap());
    assert_eq!(closed["sessionId"], id.as_str());
    assert_eq!(closed["exitCode"], 0);

    let listed = extract_tool_result_json(&server.codex_session_list().await.unwrap());
    assert_eq!(listed["sessions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_initial_prompt_and_flags_reach_codex() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server();

    let started = extract_tool_result_json(
        &server
            .codex_interactive(Parameters(InteractiveParams {
                initial_prompt: Some("fix the tests".to_string()),
                model: Some("o3".to_string()),
                approval_mode: Some(ApprovalMode::AutoEdit),
                ..InteractiveParams::default()
            }))
            .await
            .unwrap(),
    );

    assert_eq!(
        started["output"].as_str().unwrap().trim(),
        "started: --model o3 --approval-mode auto-edit fix the tests"
    );
    server
        .codex_session_close(close(&session_id(&started)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_session_exit_is_reported() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server();

    let started = extract_tool_result_json(
        &server
            .codex_interactive(Parameters(InteractiveParams::default()))
            .await
            .unwrap(),
    );
    let id = session_id(&started);

    let reply =
        extract_tool_result_json(&server.codex_session_send(send(&id, "quit")).await.unwrap());
    assert!(reply["output"].as_str().unwrap().contains("bye"));

    let listed = extract_tool_result_json(&server.codex_session_list().await.unwrap());
    assert!(
        listed["sessions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["sessionId"] != id.as_str())
    );

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let result = server.codex_session_send(send(&id, "hello")).await.unwrap();
    assert_eq!(
        error_text(&result),
        format!("Session '{}' has already exited (status 0)", id)
    );

    let closed = extract_tool_result_json(&server.codex_session_close(close(&id)).await.unwrap());
    assert_eq!(closed["exitCode"], 0);
}

#[tokio::test]
async fn test_unknown_session_is_invalid_params() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server();

    let err = server
        .codex_session_send(send("does-not-exist", "hello"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("does-not-exist"));

    let err = server
        .codex_session_close(close("does-not-exist"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
}

#[tokio::test]
async fn test_session_limit_is_tool_error() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server_with(Config {
        max_sessions: 1,
        ..fixture.config()
    });

    let first = extract_tool_result_json(
        &server
            .codex_interactive(Parameters(InteractiveParams::default()))
            .await
            .unwrap(),
    );

    let result = server
        .codex_interactive(Parameters(InteractiveParams::default()))
        .await
        .unwrap();
    assert!(error_text(&result).contains("Session limit reached"));

    server
        .codex_session_close(close(&session_id(&first)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_shows_live_sessions() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server();

    let started = extract_tool_result_json(
        &server
            .codex_interactive(Parameters(InteractiveParams::default()))
            .await
            .unwrap(),
    );
    let id = session_id(&started);

    let listed = extract_tool_result_json(&server.codex_session_list().await.unwrap());
    assert_eq!(listed["maxSessions"], 4);
    let sessions = listed["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["sessionId"], id.as_str());
    assert!(
        sessions[0]["command"]
            .as_str()
            .unwrap()
            .starts_with(&fixture.codex_path().to_string_lossy().to_string())
    );

    server.codex_session_close(close(&id)).await.unwrap();
}

#[tokio::test]
async fn test_missing_binary_is_configuration_error() {
    let fixture = McpTestFixture::with_codex(INTERACTIVE).unwrap();
    let server = fixture.server_with(Config {
        binary: "/nonexistent/codex".to_string(),
        ..fixture.config()
    });

    let err = server
        .codex_interactive(Parameters(InteractiveParams::default()))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert!(err.message.starts_with("Configuration error"));
}
