use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Result, WeftError};
use crate::task::{Task, TaskStatus};

/// Non-final status notification for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdate {
    pub task_id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(rename = "final")]
    pub is_final: bool,
}

/// One lifecycle event emitted by the protocol executor.
///
/// A `StatusUpdate` is intermediate; a full `Task` is terminal. Within one
/// task the working update always precedes the terminal task, and nothing
/// follows the terminal task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TaskEvent {
    StatusUpdate(TaskStatusUpdate),
    Task(Task),
}

impl TaskEvent {
    pub fn working(task_id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self::StatusUpdate(TaskStatusUpdate {
            task_id: task_id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(crate::task::TaskState::Working),
            is_final: false,
        })
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Self::StatusUpdate(update) => update.is_final,
            Self::Task(task) => task.status.state.is_terminal(),
        }
    }
}

/// Write half of a per-request event queue. The executor publishes into it;
/// the transport drains the matching `EventStream`.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<TaskEvent>,
}

/// Read half of a per-request event queue.
pub type EventStream = mpsc::Receiver<TaskEvent>;

impl EventSink {
    /// A fresh sink/stream pair for one request.
    pub fn channel(capacity: usize) -> (Self, EventStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Publish one event. Fails if the consumer has gone away, which means
    /// the request this sink belongs to is already abandoned.
    pub async fn publish(&self, event: TaskEvent) -> Result<()> {
        self.tx.send(event).await.map_err(|_| WeftError::SinkClosed)
    }
}
