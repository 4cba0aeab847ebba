use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::{debug, error, info};

use mnemo_core::{ALLOWED_TYPES_LIST, MemoryError};
use mnemo_store::MemoryStore;

/// MCP server implementation
///
/// Exposes the project memory store as MCP tools over JSON-RPC 2.0
/// stdio. One request per line on stdin, one response per line on
/// stdout; diagnostics go to stderr via tracing.
pub(crate) fn run_mcp_server(store: &mut MemoryStore) -> Result<()> {
    info!("Starting MCP server on stdio");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read line from stdin")?;
        let trimmed = line.trim();

        // Skip empty lines
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                let error_response = JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32700,
                        message: format!("Parse error: {}", e),
                    }),
                    id: None,
                };
                write_response(&stdout, &error_response)?;
                continue;
            }
        };

        // Notifications get no response line
        if let Some(response) = handle_request(store, request) {
            write_response(&stdout, &response)?;
        }
    }

    info!("MCP server shutting down");
    Ok(())
}

/// JSON-RPC 2.0 Request
#[derive(Deserialize)]
pub(crate) struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Option<Value>,
    id: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Serialize)]
pub(crate) struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

/// JSON-RPC 2.0 Error
#[derive(Serialize)]
pub(crate) struct JsonRpcError {
    code: i32,
    message: String,
}

/// MCP Tool Definition
#[derive(Serialize)]
struct McpToolDef {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

/// MCP tool definitions
fn get_tools() -> Vec<McpToolDef> {
    vec![
        McpToolDef {
            name: "activate_project".to_string(),
            description: "Activate the current project and load/create its memory store. \
                          Must be called before any other memory operation."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
        McpToolDef {
            name: "store_memory".to_string(),
            description: format!(
                "Store a new memory. Type must be one of: {}",
                ALLOWED_TYPES_LIST
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Memory title (required, non-empty)"
                    },
                    "type": {
                        "type": "string",
                        "description": "Memory type"
                    },
                    "content": {
                        "type": "string",
                        "description": "Memory content in markdown (may be empty)"
                    }
                },
                "required": ["title", "type", "content"]
            }),
        },
        McpToolDef {
            name: "get_memory".to_string(),
            description: "Retrieve a full memory record by its UUID".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "memory_id": {
                        "type": "string",
                        "description": "UUID of the memory to retrieve"
                    }
                },
                "required": ["memory_id"]
            }),
        },
        McpToolDef {
            name: "list_memories".to_string(),
            description: "List memory metadata (id, title, type), optionally filtered by type. \
                          Content is never included."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "type": {
                        "type": "string",
                        "description": "Optional memory type filter"
                    }
                }
            }),
        },
        McpToolDef {
            name: "update_memory".to_string(),
            description: "Replace a memory's content. Id, title, and type cannot change."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "memory_id": {
                        "type": "string",
                        "description": "UUID of the memory to update"
                    },
                    "content": {
                        "type": "string",
                        "description": "New content in markdown"
                    }
                },
                "required": ["memory_id", "content"]
            }),
        },
        McpToolDef {
            name: "delete_memory".to_string(),
            description: "Permanently delete a memory".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "memory_id": {
                        "type": "string",
                        "description": "UUID of the memory to delete"
                    }
                },
                "required": ["memory_id"]
            }),
        },
    ]
}

/// Handle JSON-RPC request. Returns `None` for notifications.
pub(crate) fn handle_request(
    store: &mut MemoryStore,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => {
            debug!("Handling initialize");
            Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": "mnemo",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                })),
                error: None,
                id,
            })
        }
        "notifications/initialized" => {
            debug!("Handling initialized notification");
            None
        }
        "tools/list" => {
            debug!("Handling tools/list");
            Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(serde_json::json!({
                    "tools": get_tools()
                })),
                error: None,
                id,
            })
        }
        "tools/call" => {
            debug!("Handling tools/call");
            match handle_tool_call(store, request.params) {
                Ok(result) => Some(JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    result: Some(result),
                    error: None,
                    id,
                }),
                Err(e) => Some(JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32603,
                        message: e.to_string(),
                    }),
                    id,
                }),
            }
        }
        "shutdown" => {
            debug!("Handling shutdown");
            Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(serde_json::json!({})),
                error: None,
                id,
            })
        }
        _ => Some(JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", request.method),
            }),
            id,
        }),
    }
}

/// Handle tool call. Only a malformed envelope or an unknown tool name
/// becomes a JSON-RPC error; store failures travel in-band as
/// `{"error": "<code>"}` payloads.
fn handle_tool_call(store: &mut MemoryStore, params: Option<Value>) -> Result<Value> {
    let params = params.context("Missing params for tools/call")?;
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .context("Missing tool name")?;
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    debug!("Tool call: {} with args: {:?}", name, arguments);

    let outcome = match name {
        "activate_project" => tool_activate_project(store),
        "store_memory" => tool_store_memory(store, &arguments),
        "get_memory" => tool_get_memory(store, &arguments),
        "list_memories" => tool_list_memories(store, &arguments),
        "update_memory" => tool_update_memory(store, &arguments),
        "delete_memory" => tool_delete_memory(store, &arguments),
        _ => anyhow::bail!("Unknown tool: {}", name),
    };

    Ok(tool_content(result_payload(outcome)))
}

fn tool_activate_project(store: &mut MemoryStore) -> Result<Value, MemoryError> {
    let project_id = store.activate()?;
    Ok(serde_json::json!({ "project_id": project_id }))
}

fn tool_store_memory(store: &MemoryStore, args: &Value) -> Result<Value, MemoryError> {
    let title = require_str(args, "title")?;
    // An absent type is outside the enumeration, not a missing field
    let memory_type = args.get("type").and_then(Value::as_str).unwrap_or_default();
    let content = require_str(args, "content")?;

    let memory_id = store.store_memory(title, memory_type, content)?;
    Ok(serde_json::json!({ "memory_id": memory_id }))
}

fn tool_get_memory(store: &MemoryStore, args: &Value) -> Result<Value, MemoryError> {
    let memory_id = args
        .get("memory_id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let memory = store.get_memory(memory_id)?;
    Ok(serde_json::json!({ "memory": memory }))
}

fn tool_list_memories(store: &MemoryStore, args: &Value) -> Result<Value, MemoryError> {
    let mut memories = store.list_memories(None)?;
    // A filter outside the enumeration matches no record; it lists as
    // empty rather than erroring
    if let Some(filter) = args.get("type").and_then(Value::as_str) {
        memories.retain(|memory| memory.memory_type.as_str() == filter);
    }
    Ok(serde_json::json!({ "memories": memories }))
}

fn tool_update_memory(store: &MemoryStore, args: &Value) -> Result<Value, MemoryError> {
    let memory_id = args
        .get("memory_id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let content = require_str(args, "content")?;
    store.update_memory(memory_id, content)?;
    Ok(serde_json::json!({}))
}

fn tool_delete_memory(store: &MemoryStore, args: &Value) -> Result<Value, MemoryError> {
    let memory_id = args
        .get("memory_id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    store.delete_memory(memory_id)?;
    Ok(serde_json::json!({}))
}

fn require_str<'a>(args: &'a Value, field: &'static str) -> Result<&'a str, MemoryError> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or(MemoryError::MissingRequiredField(field))
}

/// Collapse a store result into the wire payload: either
/// `{"success": true, ...}` or `{"error": "<code>"}`.
fn result_payload(outcome: Result<Value, MemoryError>) -> Value {
    match outcome {
        Ok(Value::Object(mut payload)) => {
            payload.insert("success".to_string(), Value::Bool(true));
            Value::Object(payload)
        }
        Ok(other) => serde_json::json!({ "success": true, "result": other }),
        Err(err) => serde_json::json!({ "error": err.code() }),
    }
}

/// Wrap a payload as MCP text content.
fn tool_content(payload: Value) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": payload.to_string()
            }
        ]
    })
}

/// Write JSON-RPC response to stdout
fn write_response(stdout: &std::io::Stdout, response: &JsonRpcResponse) -> Result<()> {
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, response).context("Failed to serialize response")?;
    out.write_all(b"\n")
        .context("Failed to write newline to stdout")?;
    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
impl JsonRpcResponse {
    pub(crate) fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub(crate) fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}
