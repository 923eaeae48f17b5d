//! Drives the stdio tool server with newline-delimited JSON-RPC.

use std::sync::Arc;

use hierarchos::adapters::mcp::StdioServer;
use hierarchos::adapters::sqlite::{create_migrated_test_pool, SqliteSessionRepository};
use hierarchos::domain::models::Config;
use hierarchos::services::{ReasoningService, SessionPool};
use serde_json::{json, Value};

async fn exchange(requests: &[Value]) -> Vec<Value> {
    let db = create_migrated_test_pool().await.unwrap();
    let pool = Arc::new(SessionPool::new(Arc::new(SqliteSessionRepository::new(db)), 2));
    let server = StdioServer::new(Arc::new(ReasoningService::new(pool, Config::default())));

    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

fn text_of(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_handshake_and_decompose() {
    let responses = exchange(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        tool_call(2, "decompose_task", json!({"task": "refactor the cache layer"})),
    ])
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "hierarchos");

    let decomposition = text_of(&responses[1]);
    assert_eq!(decomposition["task_kind"], "refactoring");
    assert_eq!(decomposition["total_subtasks"], 3);
    assert_eq!(decomposition["estimated_complexity"], 1.0);
}

#[tokio::test]
async fn test_refine_returns_session() {
    let responses = exchange(&[tool_call(
        1,
        "refine_solution",
        json!({
            "original_solution": {"primary_solution": "cache with LRU eviction"},
            "refinement_goals": ["add TTL", "bound memory"],
            "max_iterations": 3
        }),
    )])
    .await;

    assert!(responses[0]["result"].get("isError").is_none());
    let refinement = text_of(&responses[0]);
    assert!(refinement["session_id"].is_string());
    assert_eq!(refinement["improvements"], json!(["add TTL", "bound memory"]));
}

#[tokio::test]
async fn test_analyze_unknown_session_is_tool_error() {
    let responses = exchange(&[
        tool_call(
            1,
            "analyze_reasoning_trace",
            json!({"session_id": "00000000-0000-0000-0000-000000000000"}),
        ),
        tool_call(2, "analyze_reasoning_trace", json!({"session_id": "nope"})),
        tool_call(3, "no_such_tool", json!({})),
    ])
    .await;

    for response in &responses {
        assert_eq!(response["result"]["isError"], true);
        assert!(text_of(response)["solution"].is_null());
    }
    assert!(text_of(&responses[2])["error"]
        .as_str()
        .unwrap()
        .contains("Unknown tool"));
}
