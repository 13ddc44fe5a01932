use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::StreamExt;

use weft_core::Result;

use crate::result::ExecutionResult;

/// Pacing between fallback chunks, so consumers see incremental output
/// rather than one burst.
const INTER_CHUNK_DELAY: Duration = Duration::from_millis(20);

/// One partial result from a streamed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub content: String,
    pub is_task_complete: bool,
    /// Which graph node produced this chunk, when the strategy knows.
    pub node: Option<String>,
}

impl StreamChunk {
    pub fn partial(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_task_complete: false,
            node: None,
        }
    }

    pub fn from_node(content: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_task_complete: false,
            node: Some(node.into()),
        }
    }

    /// The terminating event: empty content, task complete.
    pub fn complete() -> Self {
        Self {
            content: String::new(),
            is_task_complete: true,
            node: None,
        }
    }
}

/// Decompose a completed invocation into word-level chunks followed by one
/// final complete chunk. Every word but the last keeps its trailing space,
/// so concatenating the chunks reproduces the normalized content.
pub(crate) fn word_chunk_stream(
    fut: BoxFuture<'_, Result<ExecutionResult>>,
) -> BoxStream<'_, Result<StreamChunk>> {
    Box::pin(futures::stream::once(fut).flat_map(|res| match res {
        Ok(result) => futures::stream::iter(word_chunks(&result.content))
            .then(|chunk| async move {
                tokio::time::sleep(INTER_CHUNK_DELAY).await;
                Ok(chunk)
            })
            .boxed(),
        Err(e) => futures::stream::once(async move { Err(e) }).boxed(),
    }))
}

fn word_chunks(content: &str) -> Vec<StreamChunk> {
    let words: Vec<&str> = content.split_whitespace().collect();
    let mut chunks = Vec::with_capacity(words.len() + 1);
    for (i, word) in words.iter().enumerate() {
        let text = if i + 1 < words.len() {
            format!("{word} ")
        } else {
            (*word).to_string()
        };
        chunks.push(StreamChunk::partial(text));
    }
    chunks.push(StreamChunk::complete());
    chunks
}
