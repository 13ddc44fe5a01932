use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use weft_core::Result;
use weft_graph::{CompiledGraph, GraphState, RunConfig};

use crate::result::{stringify, ExecutionResult};
use crate::{ExecutionStrategy, InvokeOptions, StreamChunk};

/// State key under which per-request credentials are injected, so node
/// logic can select request-scoped keys over process-wide defaults. This
/// is what lets one server multiplex different callers' API keys without
/// restart or global mutable configuration.
pub const API_CONFIG_KEY: &str = "api_config";

/// Strategy wrapping a compiled workflow graph.
pub struct GraphStrategy {
    graph: Arc<dyn CompiledGraph>,
    input_key: String,
    output_key: String,
}

impl GraphStrategy {
    pub fn new(graph: Arc<dyn CompiledGraph>) -> Self {
        Self {
            graph,
            input_key: "messages".to_string(),
            output_key: "messages".to_string(),
        }
    }

    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.input_key = key.into();
        self
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }

    fn prepare_input(&self, query: &str, opts: &InvokeOptions) -> GraphState {
        let mut input = GraphState::new();
        input.insert(self.input_key.clone(), Value::String(query.to_string()));
        if let Some(creds) = &opts.credentials {
            if let Ok(value) = serde_json::to_value(creds) {
                input.insert(API_CONFIG_KEY.to_string(), value);
            }
        }
        input
    }

    fn prepare_config(&self, opts: &InvokeOptions) -> RunConfig {
        RunConfig {
            thread_id: opts.session_id.clone(),
            extra: opts.extra.clone(),
        }
    }

    /// Pull the response out of the final state: the last message-like
    /// element of the output key, a plain string, or the stringified value.
    fn extract_response(&self, state: GraphState) -> ExecutionResult {
        let data = Value::Object(state);
        let output = data
            .get(self.output_key.as_str())
            .cloned()
            .unwrap_or_else(|| data.clone());

        let content = match &output {
            Value::Array(items) if !items.is_empty() => {
                let last = &items[items.len() - 1];
                match last.get("content") {
                    Some(content) => stringify(content),
                    None => output.to_string(),
                }
            }
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        ExecutionResult {
            content,
            data,
            is_task_complete: true,
        }
    }
}

impl ExecutionStrategy for GraphStrategy {
    /// Blocking graph run on a private current-thread runtime, so nodes
    /// that await timers or sockets still work. Run it off the async
    /// scheduler; `ainvoke` is the serving path.
    fn invoke(&self, query: &str, opts: &InvokeOptions) -> Result<ExecutionResult> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.ainvoke(query, opts))
    }

    fn ainvoke<'a>(
        &'a self,
        query: &'a str,
        opts: &'a InvokeOptions,
    ) -> BoxFuture<'a, Result<ExecutionResult>> {
        let input = self.prepare_input(query, opts);
        let config = self.prepare_config(opts);
        Box::pin(async move {
            debug!(thread_id = ?config.thread_id, "running graph strategy");
            let state = self.graph.invoke(input, config).await?;
            Ok(self.extract_response(state))
        })
    }

    /// Native streaming: one chunk per graph node that produced content,
    /// labelled with the node's name, then the final complete chunk.
    fn astream<'a>(
        &'a self,
        query: &'a str,
        opts: &'a InvokeOptions,
    ) -> BoxStream<'a, Result<StreamChunk>> {
        let input = self.prepare_input(query, opts);
        let config = self.prepare_config(opts);
        let output_key = self.output_key.clone();

        let chunks = self
            .graph
            .stream(input, config)
            .filter_map(move |res| {
                futures::future::ready(match res {
                    Ok(update) => chunk_content(&update.update, &output_key)
                        .map(|content| Ok(StreamChunk::from_node(content, update.node))),
                    Err(e) => Some(Err(e)),
                })
            })
            .chain(futures::stream::once(futures::future::ready(Ok(
                StreamChunk::complete(),
            ))));
        Box::pin(chunks)
    }
}

/// Content contributed by one node update: the last message-like element
/// under the output key, else a `response` or `content` field. Empty
/// contributions produce no chunk.
fn chunk_content(update: &GraphState, output_key: &str) -> Option<String> {
    if let Some(Value::Array(items)) = update.get(output_key) {
        if let Some(content) = items.last().and_then(|last| last.get("content")) {
            let text = stringify(content);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    for key in ["response", "content"] {
        if let Some(value) = update.get(key) {
            let text = stringify(value);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
