use std::{
    io::{BufRead, BufReader, Write},
    process::Stdio,
    sync::mpsc,
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::CliTest;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(20);

#[test]
fn test_missing_codex_binary_is_fatal() -> Result<()> {
    let test = CliTest::new()?;

    let output = test
        .command()
        .args(["--codex-bin", "/nonexistent/codex"])
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("'/nonexistent/codex' command not found"),
        "stderr: {}",
        stderr
    );
    Ok(())
}

#[test]
fn test_codex_not_on_path_is_fatal() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().env("PATH", test.root()).output()?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'codex' command not found"), "stderr: {}", stderr);
    assert!(stderr.contains("npm install -g @openai/codex"));
    Ok(())
}

#[test]
fn test_env_file_can_name_the_binary() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("creds.env", "CODEX_MCP_BIN=/from/env/file/codex\n")?;

    let output = test
        .command()
        .args(["--env-file", "creds.env"])
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("/from/env/file/codex"));
    Ok(())
}

#[test]
fn test_invalid_config_is_fatal() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".codex-mcp.json", r#"{ "maxSessions": 0 }"#)?;
    let codex = test.write_script("bin/codex", "exit 0")?;

    let output = test.command().arg("--codex-bin").arg(&codex).output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("maxSessions"));
    Ok(())
}

#[test]
fn test_unknown_mode_is_rejected() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().args(["--mode", "websocket"]).output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("websocket"));
    assert!(stderr.contains("stdio"));
    assert!(stderr.contains("sse"));
    Ok(())
}

#[test]
fn test_help_lists_examples() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("--help").output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--mode"));
    assert!(stdout.contains("--codex-bin"));
    assert!(stdout.contains("codex-mcp --mode sse --port 8080"));
    Ok(())
}

#[test]
fn test_stdio_session_end_to_end() -> Result<()> {
    let test = CliTest::new()?;
    let codex = test.write_script("bin/codex", r#"echo "codex ran with: $*""#)?;

    let mut child = test
        .command()
        .arg("--codex-bin")
        .arg(&codex)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let stdout = child.stdout.take().context("stdout should be piped")?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdin = child.stdin.take().context("stdin should be piped")?;
    let requests = [
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "cli-test", "version": "0.0.0" }
            }
        }),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "codex_agent",
                "arguments": { "prompt": "say hi", "task_type": "debugging" }
            }
        }),
    ];
    for request in &requests {
        writeln!(stdin, "{}", request)?;
    }
    stdin.flush()?;

    let mut responses = Vec::new();
    while responses.len() < 3 {
        let line = rx
            .recv_timeout(RESPONSE_TIMEOUT)
            .context("server did not answer in time")?;
        let message: Value = serde_json::from_str(&line)?;
        if message.get("id").is_some() {
            responses.push(message);
        }
    }
    responses.sort_by_key(|r| r["id"].as_i64());

    let tools: Vec<&str> = responses[1]["result"]["tools"]
        .as_array()
        .context("tools/list should return tools")?
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    for name in [
        "codex_agent",
        "codex_interactive",
        "codex_session_send",
        "codex_session_close",
        "codex_session_list",
    ] {
        assert!(tools.contains(&name), "missing tool {}", name);
    }

    let call = &responses[2]["result"];
    assert_eq!(call["isError"], false);
    let text = call["content"][0]["text"].as_str().unwrap_or_default();
    assert!(text.starts_with("codex ran with: --quiet"), "text: {}", text);
    assert!(text.contains("--approval-mode suggest"));
    assert!(text.contains("say hi"));

    drop(stdin);
    let status = child.wait()?;
    assert!(status.success());
    Ok(())
}
