//! MCP stdio server implementing JSON-RPC 2.0 over stdin/stdout.
//!
//! Exposes the reasoning operations as tools via the Model Context Protocol.
//!
//! Protocol: newline-delimited JSON-RPC 2.0 on stdin/stdout.
//! Logging goes to stderr (stdout is reserved for protocol messages).

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::models::{ReasoningRequest, Verbosity};
use crate::domain::ports::SessionRepository;
use crate::services::ReasoningService;

const PROTOCOL_VERSION: &str = "2024-11-05";
const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;

/// Default refinement bound when the caller gives none.
const DEFAULT_REFINE_ITERATIONS: u32 = 5;

/// MCP stdio server exposing the reasoning tools.
pub struct StdioServer<R: SessionRepository> {
    service: Arc<ReasoningService<R>>,
}

#[derive(Debug, Deserialize)]
struct ReasonArgs {
    task: String,
    #[serde(default)]
    context: Option<Map<String, Value>>,
    #[serde(default)]
    max_h_iterations: Option<u32>,
    #[serde(default, alias = "max_l_cycles_per_h")]
    max_l_cycles: Option<u32>,
    #[serde(default)]
    convergence_threshold: Option<f64>,
    #[serde(default)]
    verbosity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DecomposeArgs {
    task: String,
}

#[derive(Debug, Deserialize)]
struct RefineArgs {
    original_solution: Value,
    refinement_goals: Vec<String>,
    #[serde(default)]
    max_iterations: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeArgs {
    session_id: String,
}

impl<R: SessionRepository + 'static> StdioServer<R> {
    pub fn new(service: Arc<ReasoningService<R>>) -> Self {
        Self { service }
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve JSON-RPC lines from `reader`, writing responses to `writer`.
    pub async fn serve<In, Out>(&self, reader: In, mut writer: Out) -> anyhow::Result<()>
    where
        In: AsyncBufRead + Unpin,
        Out: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        tracing::info!("MCP stdio server started");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut bytes = response.into_bytes();
                bytes.push(b'\n');
                writer.write_all(&bytes).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("MCP stdio server stopped");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("Parse error: {e}"),
                ));
            }
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        match method {
            "initialize" => Some(handle_initialize(id)),
            "tools/list" => Some(success_response(id, tool_definitions())),
            "tools/call" => Some(self.handle_tools_call(id, &params).await),
            m if m.starts_with("notifications/") => None,
            _ => Some(error_response(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {method}"),
            )),
        }
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> String {
        let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        tracing::debug!(tool = tool_name, "Tool call");
        let result = match tool_name {
            "hierarchical_reason" => self.tool_hierarchical_reason(arguments).await,
            "decompose_task" => self.tool_decompose_task(arguments).await,
            "refine_solution" => self.tool_refine_solution(arguments).await,
            "analyze_reasoning_trace" => self.tool_analyze_reasoning_trace(arguments).await,
            _ => Err(format!("Unknown tool: {tool_name}")),
        };

        match result {
            Ok(content) => success_response(
                id,
                json!({
                    "content": [{ "type": "text", "text": content.to_string() }]
                }),
            ),
            Err(error) => {
                tracing::warn!(tool = tool_name, error = %error, "Tool call failed");
                let payload = json!({ "error": error, "solution": null });
                success_response(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": payload.to_string() }],
                        "isError": true
                    }),
                )
            }
        }
    }

    async fn tool_hierarchical_reason(&self, args: Value) -> Result<Value, String> {
        let args: ReasonArgs = parse_args(args)?;
        let defaults = &self.service.config().reasoning;

        let verbosity = match args.verbosity.as_deref() {
            None => Verbosity::default(),
            Some(v) => Verbosity::from_str(v).ok_or_else(|| format!("Invalid verbosity: {v}"))?,
        };

        let request = ReasoningRequest {
            task: args.task,
            context: args.context.unwrap_or_default(),
            max_h_iterations: args
                .max_h_iterations
                .unwrap_or(defaults.h_controller.max_iterations),
            max_l_cycles: args
                .max_l_cycles
                .unwrap_or(defaults.l_controller.max_cycles_per_h),
            convergence_threshold: args
                .convergence_threshold
                .unwrap_or(defaults.convergence.global_threshold),
            verbosity,
        };

        let response = self
            .service
            .hierarchical_reason(&request)
            .await
            .map_err(|e| format!("Reasoning failed: {e}"))?;
        let mut body = to_value(&response)?;
        if verbosity == Verbosity::Minimal {
            trim_to_minimal(&mut body);
        }
        Ok(body)
    }

    async fn tool_decompose_task(&self, args: Value) -> Result<Value, String> {
        let args: DecomposeArgs = parse_args(args)?;
        let decomposition = self
            .service
            .decompose_task(&args.task)
            .await
            .map_err(|e| format!("Decomposition failed: {e}"))?;
        to_value(&decomposition)
    }

    async fn tool_refine_solution(&self, args: Value) -> Result<Value, String> {
        let args: RefineArgs = parse_args(args)?;
        let refinement = self
            .service
            .refine_solution(
                args.original_solution,
                args.refinement_goals,
                args.max_iterations.unwrap_or(DEFAULT_REFINE_ITERATIONS),
            )
            .await
            .map_err(|e| format!("Refinement failed: {e}"))?;
        to_value(&refinement)
    }

    async fn tool_analyze_reasoning_trace(&self, args: Value) -> Result<Value, String> {
        let args: AnalyzeArgs = parse_args(args)?;
        let id = Uuid::parse_str(&args.session_id)
            .map_err(|e| format!("Invalid session_id: {e}"))?;
        let analysis = self
            .service
            .analyze_session(id)
            .await
            .map_err(|e| format!("Analysis failed: {e}"))?;
        to_value(&analysis)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Minimal responses carry the solution and scores only.
fn trim_to_minimal(body: &mut Value) {
    if let Some(fields) = body.as_object_mut() {
        fields.remove("trace_summary");
        if let Some(solution) = fields.get_mut("solution").and_then(Value::as_object_mut) {
            solution.remove("implementation_notes");
        }
    }
}

fn handle_initialize(id: Value) -> String {
    success_response(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "hierarchos",
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn tool_definitions() -> Value {
    json!({
        "tools": [
            {
                "name": "hierarchical_reason",
                "description": "Solve a task with the two-level reasoning loop: a strategic controller decomposes the task into subgoals and tracks confidence, an execution controller refines each subgoal until its confidence stabilises. Returns the compiled solution, a trace summary, and the session id for later analysis.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "task": { "type": "string", "description": "The task to solve" },
                        "context": { "type": "object", "description": "Additional context such as existing code or constraints" },
                        "max_h_iterations": { "type": "integer", "minimum": 1, "maximum": 50, "description": "Maximum strategic rounds (default 10)" },
                        "max_l_cycles": { "type": "integer", "minimum": 3, "maximum": 20, "description": "Maximum refinement cycles per subgoal (default 6)" },
                        "convergence_threshold": { "type": "number", "minimum": 0.5, "maximum": 1.0, "description": "Overall confidence required to converge (default 0.85)" },
                        "verbosity": { "type": "string", "enum": ["minimal", "normal", "detailed"] }
                    },
                    "required": ["task"]
                }
            },
            {
                "name": "decompose_task",
                "description": "Decompose a task into its ordered subgoals without executing them.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "task": { "type": "string", "description": "The task to decompose" }
                    },
                    "required": ["task"]
                }
            },
            {
                "name": "refine_solution",
                "description": "Run another bounded reasoning pass over an existing solution with specific refinement goals.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "original_solution": { "description": "The solution to refine" },
                        "refinement_goals": { "type": "array", "items": { "type": "string" }, "description": "Refinement objectives" },
                        "max_iterations": { "type": "integer", "minimum": 1, "maximum": 50, "description": "Maximum strategic rounds (default 5)" }
                    },
                    "required": ["original_solution", "refinement_goals"]
                }
            },
            {
                "name": "analyze_reasoning_trace",
                "description": "Analyze a completed session: throughput, convergence efficiency, and bottlenecks.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "session_id": { "type": "string", "description": "Session UUID returned by hierarchical_reason or refine_solution" }
                    },
                    "required": ["session_id"]
                }
            }
        ]
    })
}

fn success_response(id: Value, result: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
    .to_string()
}

fn error_response(id: Value, code: i32, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionRepository;
    use crate::domain::models::Config;
    use crate::services::SessionPool;

    fn server() -> StdioServer<InMemorySessionRepository> {
        let pool = Arc::new(SessionPool::new(Arc::new(InMemorySessionRepository::new()), 2));
        StdioServer::new(Arc::new(ReasoningService::new(pool, Config::default())))
    }

    async fn call(server: &StdioServer<InMemorySessionRepository>, message: Value) -> Value {
        let response = server.handle_message(&message.to_string()).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    fn tool_text(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_tools_list_names_four_tools() {
        let response = call(&server(), json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await;
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["hierarchical_reason", "decompose_task", "refine_solution", "analyze_reasoning_trace"]
        );
    }

    #[tokio::test]
    async fn test_parse_error_and_unknown_method() {
        let server = server();
        let response: Value =
            serde_json::from_str(&server.handle_message("{oops").await.unwrap()).unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);

        let response = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "bogus"})).await;
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let message = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server().handle_message(&message.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_reason_then_analyze() {
        let server = server();
        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": { "name": "hierarchical_reason", "arguments": { "task": "implement X", "max_h_iterations": 3, "max_l_cycles": 3 } }
            }),
        )
        .await;
        assert!(response["result"].get("isError").is_none());
        let body = tool_text(&response);
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert!(body["total_iterations"].as_u64().unwrap() <= 3);

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": { "name": "analyze_reasoning_trace", "arguments": { "session_id": session_id } }
            }),
        )
        .await;
        let analysis = tool_text(&response);
        assert_eq!(analysis["session_summary"]["total_iterations"], 3);
    }

    #[tokio::test]
    async fn test_minimal_verbosity_drops_trace() {
        let server = server();
        let reason = |id: u64, verbosity: &str| {
            json!({
                "jsonrpc": "2.0", "id": id, "method": "tools/call",
                "params": { "name": "hierarchical_reason", "arguments": { "task": "implement X", "verbosity": verbosity } }
            })
        };

        let minimal = tool_text(&call(&server, reason(6, "minimal")).await);
        assert!(minimal.get("trace_summary").is_none());
        assert!(minimal["solution"].get("implementation_notes").is_none());
        assert!(minimal["solution"]["primary_solution"].is_string());
        assert!(minimal["confidence_score"].is_number());

        let normal = tool_text(&call(&server, reason(7, "normal")).await);
        assert!(normal["trace_summary"].is_object());
        assert!(normal["solution"]["implementation_notes"].is_string());
    }

    #[tokio::test]
    async fn test_tool_failure_is_structured_error() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0", "id": 5, "method": "tools/call",
                "params": { "name": "hierarchical_reason", "arguments": { "task": "x", "max_l_cycles": 99 } }
            }),
        )
        .await;
        assert_eq!(response["result"]["isError"], true);
        let body = tool_text(&response);
        assert!(body["solution"].is_null());
        assert!(body["error"].as_str().unwrap().starts_with("Reasoning failed"));
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#, "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, "\n",
        );
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("\"protocolVersion\""));
    }
}
