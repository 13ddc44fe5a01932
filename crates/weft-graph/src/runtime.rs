use futures::future::BoxFuture;
use futures::stream::BoxStream;

use weft_core::Result;

/// Shared state flowing through a workflow graph. Nodes read the whole
/// state and return a partial update that is merged back in.
pub type GraphState = serde_json::Map<String, serde_json::Value>;

/// Per-run configuration for a graph invocation.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Session correlation key. Runs sharing a thread id continue from the
    /// state the previous run left behind.
    pub thread_id: Option<String>,
    /// Caller-supplied extras, opaque to the runtime.
    pub extra: GraphState,
}

impl RunConfig {
    pub fn with_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            extra: GraphState::new(),
        }
    }
}

/// One node's contribution during a streamed run.
#[derive(Debug, Clone)]
pub struct NodeUpdate {
    pub node: String,
    pub update: GraphState,
}

/// A compiled, runnable workflow graph. The bridge treats this as an
/// opaque callable contract; any engine that can run a state map through
/// to completion can stand behind it.
pub trait CompiledGraph: Send + Sync + 'static {
    /// Run the graph to completion and return the final state.
    fn invoke(&self, input: GraphState, config: RunConfig) -> BoxFuture<'_, Result<GraphState>>;

    /// Run the graph, yielding each node's update as it is produced.
    fn stream(&self, input: GraphState, config: RunConfig) -> BoxStream<'_, Result<NodeUpdate>>;
}

/// Merge a node's partial update into the state. List-valued keys append
/// (so message channels accumulate); everything else overwrites.
pub fn merge_state(state: &mut GraphState, update: GraphState) {
    for (key, value) in update {
        match (state.get_mut(&key), value) {
            (Some(serde_json::Value::Array(existing)), serde_json::Value::Array(mut new)) => {
                existing.append(&mut new);
            }
            (_, value) => {
                state.insert(key, value);
            }
        }
    }
}
