use rmcp::ServerHandler;

use crate::{ECHO_ARGS, McpTestFixture};

#[test]
fn test_server_info_advertises_tools() {
    let fixture = McpTestFixture::with_codex(ECHO_ARGS).unwrap();
    let info = fixture.server().get_info();

    assert!(info.capabilities.tools.is_some());
    let instructions = info.instructions.unwrap();
    for tool in [
        "codex_agent",
        "codex_interactive",
        "codex_session_send",
        "codex_session_close",
        "codex_session_list",
    ] {
        assert!(instructions.contains(tool), "instructions should mention {tool}");
    }
}

#[test]
fn test_server_keeps_settings() {
    let fixture = McpTestFixture::with_codex(ECHO_ARGS).unwrap();
    let server = fixture.server();

    assert_eq!(server.settings().working_dir, fixture.root_path());
    assert_eq!(server.settings().binary(), fixture.codex_path());
}
