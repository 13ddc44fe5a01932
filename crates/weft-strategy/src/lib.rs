pub mod function;
pub mod graph;
pub mod method;
pub mod result;
pub mod stream;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

use weft_core::{ApiCredentials, Result};

pub use function::{ExtraOptions, FunctionStrategy};
pub use graph::GraphStrategy;
pub use method::MethodStrategy;
pub use result::ExecutionResult;
pub use stream::StreamChunk;

/// Options threaded through every strategy invocation.
///
/// Credentials travel here, per call, and nowhere else: there is no
/// process-wide credential state for concurrent requests to clobber.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Groups invocations into one logical conversation.
    pub session_id: Option<String>,
    /// Per-request credential overrides.
    pub credentials: Option<ApiCredentials>,
    /// Extra keyword-style options, opaque to the bridge.
    pub extra: ExtraOptions,
}

impl InvokeOptions {
    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }
}

/// Something that turns a query into a response. Three variants exist —
/// workflow graph, plain function, bound method — all invoked identically.
pub trait ExecutionStrategy: Send + Sync + 'static {
    /// Synchronous, blocking invocation. Must be run off the async
    /// scheduler (e.g. a dedicated worker thread) when called from within
    /// it; `ainvoke` is the path intended for concurrent serving.
    fn invoke(&self, query: &str, opts: &InvokeOptions) -> Result<ExecutionResult>;

    /// Asynchronous invocation; safe to run concurrently with others.
    fn ainvoke<'a>(
        &'a self,
        query: &'a str,
        opts: &'a InvokeOptions,
    ) -> BoxFuture<'a, Result<ExecutionResult>>;

    /// Lazy, finite, non-restartable sequence of partial results,
    /// terminated by one final complete chunk with empty content.
    ///
    /// The default decomposes a finished `ainvoke` into word-level chunks
    /// with a small inter-chunk delay, so strategies with no native
    /// incremental output still satisfy streaming callers.
    fn astream<'a>(
        &'a self,
        query: &'a str,
        opts: &'a InvokeOptions,
    ) -> BoxStream<'a, Result<StreamChunk>> {
        stream::word_chunk_stream(self.ainvoke(query, opts))
    }
}
