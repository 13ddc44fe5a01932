use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use weft_core::{Message, Part, RequestContext, Role};

// JSON-RPC 2.0 error codes, plus the protocol's task-not-found extension.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_PARAMS: i64 = -32602;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;
pub const TASK_NOT_FOUND: i64 = -32001;

/// One inbound JSON-RPC call.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// One outbound JSON-RPC reply (also used as the envelope for each
/// streamed event).
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Params for `message/send` and `message/stream`.
#[derive(Debug, Deserialize)]
pub struct SendParams {
    pub message: IncomingMessage,
}

/// The caller's message, with optional identifiers the transport may have
/// left out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub context_id: Option<String>,
}

impl IncomingMessage {
    /// Build the immutable per-call context, generating any absent ids.
    pub fn into_context(self, call_metadata: HashMap<String, String>) -> RequestContext {
        let message = Message {
            message_id: self
                .message_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            role: self.role.unwrap_or(Role::User),
            parts: self.parts,
        };
        RequestContext::new(self.task_id, self.context_id, Some(message), call_metadata)
    }
}

/// Params for `tasks/get` and `tasks/cancel`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    pub id: String,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn incoming_message_generates_absent_ids() {
        let incoming: IncomingMessage = serde_json::from_value(json!({
            "parts": [{"kind": "text", "text": "hello"}],
        }))
        .unwrap();
        let ctx = incoming.into_context(HashMap::new());
        assert!(!ctx.task_id.is_empty());
        assert_eq!(ctx.input_text(), "hello");
        assert_eq!(ctx.message.as_ref().unwrap().role, Role::User);
    }

    #[test]
    fn incoming_message_keeps_supplied_ids() {
        let incoming: IncomingMessage = serde_json::from_value(json!({
            "messageId": "m-1",
            "taskId": "t-1",
            "contextId": "c-1",
            "parts": [{"kind": "text", "text": "hi"}],
        }))
        .unwrap();
        let ctx = incoming.into_context(HashMap::new());
        assert_eq!(ctx.task_id, "t-1");
        assert_eq!(ctx.context_id, "c-1");
        assert_eq!(ctx.message.as_ref().unwrap().message_id, "m-1");
    }

    #[test]
    fn error_response_shape() {
        let response = RpcResponse::err(json!(7), METHOD_NOT_FOUND, "no such method");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["error"]["code"], -32601);
        assert!(json.get("result").is_none());
    }
}
