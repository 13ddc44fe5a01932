pub mod builder;
pub mod runtime;

pub use builder::{CompiledStateGraph, StateGraph, END};
pub use runtime::{merge_state, CompiledGraph, GraphState, NodeUpdate, RunConfig};
