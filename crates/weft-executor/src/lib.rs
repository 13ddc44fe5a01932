//! The protocol executor: drives one execution strategy per request and
//! publishes lifecycle events onto a per-request sink.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use weft_core::{
    EventSink, Message, RequestContext, Result, Task, TaskEvent, TaskState, TaskStatus,
};
use weft_strategy::{ExecutionResult, ExecutionStrategy, InvokeOptions};

/// Outcome of driving the strategy, kept distinct from the recoverable
/// degradation strategies perform internally: anything that reaches here as
/// `Failed` is task-fatal.
enum Outcome {
    Completed(ExecutionResult),
    Failed(weft_core::WeftError),
}

/// Consumes one request context, invokes the strategy, and emits lifecycle
/// events. Within one task the working event always precedes the terminal
/// event, and nothing follows the terminal event.
pub struct ProtocolExecutor {
    strategy: Arc<dyn ExecutionStrategy>,
}

impl ProtocolExecutor {
    pub fn new(strategy: Arc<dyn ExecutionStrategy>) -> Self {
        Self { strategy }
    }

    fn invoke_options(ctx: &RequestContext) -> InvokeOptions {
        InvokeOptions {
            // The context id groups tasks into one conversation, so it
            // doubles as the strategy's session correlation key.
            session_id: Some(ctx.context_id.clone()),
            credentials: ctx.credentials(),
            extra: Default::default(),
        }
    }

    /// Terminal task for an outcome. History is `[request, response]`, or
    /// just the response when the request carried no message.
    fn terminal_task(ctx: &RequestContext, outcome: Outcome) -> Task {
        match outcome {
            Outcome::Completed(result) => {
                let response = Message::agent_text(result.content);
                let mut history = Vec::with_capacity(2);
                if let Some(request) = &ctx.message {
                    history.push(request.clone());
                }
                history.push(response);
                Task::completed(&ctx.task_id, &ctx.context_id, history)
            }
            Outcome::Failed(error) => {
                warn!(task_id = %ctx.task_id, error = %error, "task failed");
                Task::failed(&ctx.task_id, &ctx.context_id, error.to_string())
            }
        }
    }

    /// Run one task to a terminal state.
    ///
    /// A strategy error becomes a `failed` terminal task; it is never
    /// retried and never escapes to take the serving process down. The
    /// only error this returns is a closed sink, meaning nobody is
    /// listening for the result anyway.
    pub async fn execute(&self, ctx: &RequestContext, sink: &EventSink) -> Result<()> {
        let input = ctx.input_text();
        let opts = Self::invoke_options(ctx);
        debug!(task_id = %ctx.task_id, context_id = %ctx.context_id, "task started");

        sink.publish(TaskEvent::working(&ctx.task_id, &ctx.context_id))
            .await?;

        let outcome = match self.strategy.ainvoke(input, &opts).await {
            Ok(result) => Outcome::Completed(result),
            Err(e) => Outcome::Failed(e),
        };

        sink.publish(TaskEvent::Task(Self::terminal_task(ctx, outcome)))
            .await
    }

    /// Like [`execute`](Self::execute), but surfaces partial output: each
    /// streamed chunk is published as a non-final working update carrying
    /// the chunk text, followed by the terminal task.
    pub async fn execute_streaming(&self, ctx: &RequestContext, sink: &EventSink) -> Result<()> {
        let input = ctx.input_text();
        let opts = Self::invoke_options(ctx);
        debug!(task_id = %ctx.task_id, context_id = %ctx.context_id, "streaming task started");

        sink.publish(TaskEvent::working(&ctx.task_id, &ctx.context_id))
            .await?;

        let mut content = String::new();
        let mut stream = self.strategy.astream(input, &opts);
        let outcome = loop {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    if chunk.is_task_complete {
                        break Outcome::Completed(ExecutionResult::complete(
                            content.clone(),
                            serde_json::Value::Null,
                        ));
                    }
                    content.push_str(&chunk.content);
                    sink.publish(TaskEvent::StatusUpdate(weft_core::TaskStatusUpdate {
                        task_id: ctx.task_id.clone(),
                        context_id: ctx.context_id.clone(),
                        status: TaskStatus::with_message(TaskState::Working, chunk.content),
                        is_final: false,
                    }))
                    .await?;
                }
                Some(Err(e)) => break Outcome::Failed(e),
                // A stream that ends without a complete chunk still
                // terminates the task with whatever content arrived.
                None => {
                    break Outcome::Completed(ExecutionResult::complete(
                        content.clone(),
                        serde_json::Value::Null,
                    ))
                }
            }
        };
        drop(stream);

        sink.publish(TaskEvent::Task(Self::terminal_task(ctx, outcome)))
            .await
    }

    /// Record a cancellation. Unconditional and advisory: it does not
    /// check that the task was running and does not interrupt an in-flight
    /// invocation. Repeated cancellations are harmless.
    pub async fn cancel(&self, ctx: &RequestContext, sink: &EventSink) -> Result<()> {
        debug!(task_id = %ctx.task_id, "task canceled");
        sink.publish(TaskEvent::Task(Task::canceled(&ctx.task_id, &ctx.context_id)))
            .await
    }
}
