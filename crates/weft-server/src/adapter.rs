use std::sync::Arc;

use axum::Router;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use weft_core::{AgentDescriptor, InMemoryTaskStore, Result, TaskStore};
use weft_executor::ProtocolExecutor;
use weft_graph::CompiledGraph;
use weft_strategy::{
    ExecutionResult, ExecutionStrategy, ExtraOptions, FunctionStrategy, GraphStrategy,
    InvokeOptions, MethodStrategy,
};

use crate::server::A2aServer;
use crate::state::AppState;

/// Composition root: one execution strategy, one descriptor, one task
/// store, one protocol executor, bound into a servable unit.
///
/// Strategies are never constructed by callers directly; each variant has
/// a named constructor here.
pub struct Adapter {
    descriptor: AgentDescriptor,
    strategy: Arc<dyn ExecutionStrategy>,
    executor: Arc<ProtocolExecutor>,
    store: Arc<dyn TaskStore>,
}

impl Adapter {
    fn compose(strategy: Arc<dyn ExecutionStrategy>, descriptor: AgentDescriptor) -> Self {
        let executor = Arc::new(ProtocolExecutor::new(strategy.clone()));
        Self {
            descriptor,
            strategy,
            executor,
            store: Arc::new(InMemoryTaskStore::new()),
        }
    }

    /// Serve a compiled workflow graph, reading and writing the default
    /// `messages` state key.
    pub fn from_graph(graph: Arc<dyn CompiledGraph>, descriptor: AgentDescriptor) -> Self {
        Self::compose(Arc::new(GraphStrategy::new(graph)), descriptor)
    }

    /// Serve a compiled workflow graph with explicit input/output keys.
    pub fn from_graph_with_keys(
        graph: Arc<dyn CompiledGraph>,
        descriptor: AgentDescriptor,
        input_key: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        let strategy = GraphStrategy::new(graph)
            .with_input_key(input_key)
            .with_output_key(output_key);
        Self::compose(Arc::new(strategy), descriptor)
    }

    /// Serve a plain single-argument function.
    pub fn from_fn<F>(func: F, descriptor: AgentDescriptor) -> Self
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        Self::compose(Arc::new(FunctionStrategy::new(func)), descriptor)
    }

    /// Serve a function that also accepts extra options.
    pub fn from_fn_with_options<F>(func: F, descriptor: AgentDescriptor) -> Self
    where
        F: Fn(&str, &ExtraOptions) -> Result<Value> + Send + Sync + 'static,
    {
        Self::compose(Arc::new(FunctionStrategy::with_options(func)), descriptor)
    }

    /// Serve a bound method of an object instance.
    pub fn from_method<T: Send + Sync + 'static>(
        instance: Arc<T>,
        method: fn(&T, &str) -> Result<Value>,
        descriptor: AgentDescriptor,
    ) -> Self {
        Self::compose(Arc::new(MethodStrategy::new(instance, method)), descriptor)
    }

    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    /// Direct blocking invocation of the underlying strategy, bypassing
    /// the protocol layer. Run it off the async scheduler.
    pub fn invoke(&self, query: &str) -> Result<ExecutionResult> {
        self.strategy.invoke(query, &InvokeOptions::default())
    }

    /// Direct async invocation of the underlying strategy.
    pub async fn ainvoke(&self, query: &str) -> Result<ExecutionResult> {
        self.strategy.ainvoke(query, &InvokeOptions::default()).await
    }

    fn into_state(self) -> Arc<AppState> {
        Arc::new(AppState {
            descriptor: self.descriptor,
            executor: self.executor,
            store: self.store,
        })
    }

    /// The transport app, for embedding or testing without a socket.
    pub fn router(self) -> Router {
        A2aServer::new(self.into_state()).router()
    }

    /// Finalize the advertised host/port and serve until the process is
    /// told to stop. Does not return under normal operation.
    pub async fn serve(mut self, host: Option<String>, port: Option<u16>) -> Result<()> {
        if let Some(host) = host {
            self.descriptor.host = host;
        }
        if let Some(port) = port {
            self.descriptor.port = port;
        }
        info!(
            name = %self.descriptor.name,
            version = %self.descriptor.version,
            url = %self.descriptor.url(),
            "serving agent"
        );

        let server = A2aServer::new(self.into_state());
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.cancel();
            }
        });
        server.run(shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use weft_graph::{GraphState, StateGraph, END};

    fn echo_adapter() -> Adapter {
        Adapter::from_fn(
            |q| Ok(json!({"response": format!("echo: {q}")})),
            AgentDescriptor::new("Echo").with_description("echoes input"),
        )
    }

    fn rpc_body(id: u64, method: &str, params: Value) -> Body {
        Body::from(
            json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string(),
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn serves_agent_card() {
        let router = echo_adapter().router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/.well-known/agent.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let card = body_json(response).await;
        assert_eq!(card["name"], "Echo");
        assert_eq!(card["capabilities"]["streaming"], true);
        assert_eq!(card["skills"][0]["id"], "default");
    }

    #[tokio::test]
    async fn message_send_returns_completed_task_and_get_finds_it() {
        let router = echo_adapter().router();

        let params = json!({"message": {
            "taskId": "task-1",
            "parts": [{"kind": "text", "text": "hi"}],
        }});
        let response = router
            .clone()
            .oneshot(post(rpc_body(1, "message/send", params)))
            .await
            .unwrap();
        let reply = body_json(response).await;
        assert_eq!(reply["result"]["status"]["state"], "completed");
        let history = reply["result"]["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1]["parts"][0]["text"], "echo: hi");

        let response = router
            .oneshot(post(rpc_body(2, "tasks/get", json!({"id": "task-1"}))))
            .await
            .unwrap();
        let reply = body_json(response).await;
        assert_eq!(reply["result"]["id"], "task-1");
        assert_eq!(reply["result"]["status"]["state"], "completed");
    }

    #[tokio::test]
    async fn strategy_failure_surfaces_as_failed_task_not_http_error() {
        let adapter = Adapter::from_fn(
            |_q| Err(weft_core::WeftError::Strategy("model offline".into())),
            AgentDescriptor::new("Flaky"),
        );
        let response = adapter
            .router()
            .oneshot(post(rpc_body(
                1,
                "message/send",
                json!({"message": {"parts": [{"kind": "text", "text": "x"}]}}),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let reply = body_json(response).await;
        assert_eq!(reply["result"]["status"]["state"], "failed");
        let message = reply["result"]["status"]["message"].as_str().unwrap();
        assert!(message.contains("model offline"));
    }

    #[tokio::test]
    async fn credential_headers_reach_graph_nodes() {
        let graph = StateGraph::new()
            .add_node("probe", |state: GraphState| async move {
                let key = state
                    .get("api_config")
                    .and_then(|c| c.get("openai_api_key"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("absent")
                    .to_string();
                Ok(json!({"messages": [{"content": key}]})
                    .as_object()
                    .cloned()
                    .unwrap())
            })
            .set_entry("probe")
            .add_edge("probe", END)
            .compile()
            .unwrap();
        let adapter = Adapter::from_graph_with_keys(
            Arc::new(graph),
            AgentDescriptor::new("Probe"),
            "query",
            "messages",
        );

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-openai-api-key", "sk-from-header")
            .body(rpc_body(
                1,
                "message/send",
                json!({"message": {"parts": [{"kind": "text", "text": "q"}]}}),
            ))
            .unwrap();
        let response = adapter.router().oneshot(request).await.unwrap();
        let reply = body_json(response).await;
        let history = reply["result"]["history"].as_array().unwrap();
        assert_eq!(history[1]["parts"][0]["text"], "sk-from-header");
    }

    #[tokio::test]
    async fn cancel_unknown_task_still_yields_canceled_task() {
        let router = echo_adapter().router();
        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(post(rpc_body(1, "tasks/cancel", json!({"id": "ghost"}))))
                .await
                .unwrap();
            let reply = body_json(response).await;
            assert_eq!(reply["result"]["id"], "ghost");
            assert_eq!(reply["result"]["status"]["state"], "canceled");
        }
    }

    #[tokio::test]
    async fn unknown_method_is_a_jsonrpc_error() {
        let response = echo_adapter()
            .router()
            .oneshot(post(rpc_body(9, "tasks/resubmit", json!({}))))
            .await
            .unwrap();
        let reply = body_json(response).await;
        assert_eq!(reply["error"]["code"], -32601);
        assert_eq!(reply["id"], 9);
    }

    #[tokio::test]
    async fn missing_task_is_a_task_not_found_error() {
        let response = echo_adapter()
            .router()
            .oneshot(post(rpc_body(3, "tasks/get", json!({"id": "nope"}))))
            .await
            .unwrap();
        let reply = body_json(response).await;
        assert_eq!(reply["error"]["code"], -32001);
        let message = reply["error"]["message"].as_str().unwrap();
        assert_eq!(message, "task not found: nope");
    }

    #[tokio::test]
    async fn message_stream_responds_with_sse() {
        let response = echo_adapter()
            .router()
            .oneshot(post(rpc_body(
                1,
                "message/stream",
                json!({"message": {"parts": [{"kind": "text", "text": "a b"}]}}),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("\"state\":\"working\""));
        assert!(body.contains("\"state\":\"completed\""));
    }

    #[tokio::test]
    async fn direct_invoke_bypasses_the_protocol_layer() {
        let adapter = echo_adapter();
        let result = adapter.ainvoke("ping").await.unwrap();
        assert_eq!(result.content, "echo: ping");
        assert!(result.is_task_complete);
    }
}
