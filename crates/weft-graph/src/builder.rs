use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use tracing::debug;

use weft_core::{Result, WeftError};

use crate::runtime::{merge_state, CompiledGraph, GraphState, NodeUpdate, RunConfig};

/// Edge target marking the end of a run.
pub const END: &str = "__end__";

type NodeFn = Arc<dyn Fn(GraphState) -> BoxFuture<'static, Result<GraphState>> + Send + Sync>;

/// Builder for a linear workflow graph: named async nodes connected by
/// edges from an entry point down to [`END`].
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, NodeFn>,
    edges: HashMap<String, String>,
    entry: Option<String>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. The node receives a snapshot of the full state and
    /// returns a partial update.
    pub fn add_node<F, Fut>(mut self, name: impl Into<String>, node: F) -> Self
    where
        F: Fn(GraphState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GraphState>> + Send + 'static,
    {
        self.nodes
            .insert(name.into(), Arc::new(move |state| Box::pin(node(state))));
        self
    }

    /// Connect `from` to `to`. Use [`END`] to terminate the run.
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    pub fn set_entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Resolve the node order and produce a runnable graph.
    pub fn compile(mut self) -> Result<CompiledStateGraph> {
        let entry = self
            .entry
            .ok_or_else(|| WeftError::GraphBuild("no entry node set".into()))?;

        let mut order = Vec::new();
        let mut current = entry;
        loop {
            let node = self.nodes.remove(&current).ok_or_else(|| {
                WeftError::GraphBuild(format!("unknown or revisited node '{current}'"))
            })?;
            let next = self
                .edges
                .get(&current)
                .cloned()
                .ok_or_else(|| WeftError::GraphBuild(format!("node '{current}' has no outgoing edge")))?;
            order.push((current, node));
            if next == END {
                break;
            }
            current = next;
        }

        Ok(CompiledStateGraph {
            order,
            threads: Mutex::new(HashMap::new()),
        })
    }
}

/// A compiled linear graph. Holds per-thread final states so runs sharing
/// a thread id continue the same conversation.
pub struct CompiledStateGraph {
    order: Vec<(String, NodeFn)>,
    threads: Mutex<HashMap<String, GraphState>>,
}

impl CompiledStateGraph {
    /// Seed the run: the saved thread state (if any) overlaid with the
    /// fresh input.
    fn initial_state(&self, input: GraphState, config: &RunConfig) -> GraphState {
        let mut state = config
            .thread_id
            .as_ref()
            .and_then(|tid| self.threads.lock().unwrap().get(tid).cloned())
            .unwrap_or_default();
        merge_state(&mut state, input);
        state
    }

    fn save_thread(&self, config: &RunConfig, state: &GraphState) {
        if let Some(tid) = &config.thread_id {
            self.threads
                .lock()
                .unwrap()
                .insert(tid.clone(), state.clone());
        }
    }

    async fn run_node(&self, index: usize, state: &GraphState) -> Result<GraphState> {
        let (name, node) = &self.order[index];
        debug!(node = %name, "running graph node");
        node(state.clone())
            .await
            .map_err(|e| WeftError::GraphNode {
                node: name.clone(),
                message: e.to_string(),
            })
    }
}

impl CompiledGraph for CompiledStateGraph {
    fn invoke(&self, input: GraphState, config: RunConfig) -> BoxFuture<'_, Result<GraphState>> {
        Box::pin(async move {
            let mut state = self.initial_state(input, &config);
            for index in 0..self.order.len() {
                let update = self.run_node(index, &state).await?;
                merge_state(&mut state, update);
            }
            self.save_thread(&config, &state);
            Ok(state)
        })
    }

    fn stream(&self, input: GraphState, config: RunConfig) -> BoxStream<'_, Result<NodeUpdate>> {
        let init = self.initial_state(input, &config);
        let total = self.order.len();
        Box::pin(futures::stream::unfold(
            (0usize, init, config),
            move |(index, mut state, config)| async move {
                if index >= total {
                    return None;
                }
                match self.run_node(index, &state).await {
                    Ok(update) => {
                        merge_state(&mut state, update.clone());
                        if index + 1 == total {
                            self.save_thread(&config, &state);
                        }
                        let item = NodeUpdate {
                            node: self.order[index].0.clone(),
                            update,
                        };
                        Some((Ok(item), (index + 1, state, config)))
                    }
                    // End the stream after surfacing the error.
                    Err(e) => Some((Err(e), (total, state, config))),
                }
            },
        ))
    }
}
