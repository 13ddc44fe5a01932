use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};
use crate::message::Message;

/// Lifecycle state of a task.
///
/// `submitted -> working -> {completed | failed | canceled}`. Terminal states
/// are final; a task never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// Forward-only transition check.
    pub fn can_advance_to(&self, next: TaskState) -> bool {
        match self {
            Self::Submitted => next != Self::Submitted,
            Self::Working => next.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

/// Status of a task: state plus an optional human-readable message
/// (populated on failure, and for partial output during streaming).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(state: TaskState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

/// A unit of work tracked through its lifecycle. Mutated only by the
/// protocol executor; strategies never see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
}

impl Task {
    pub fn working(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(TaskState::Working),
            history: Vec::new(),
        }
    }

    pub fn completed(
        id: impl Into<String>,
        context_id: impl Into<String>,
        history: Vec<Message>,
    ) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(TaskState::Completed),
            history,
        }
    }

    pub fn failed(
        id: impl Into<String>,
        context_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::with_message(TaskState::Failed, reason),
            history: Vec::new(),
        }
    }

    pub fn canceled(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(TaskState::Canceled),
            history: Vec::new(),
        }
    }

    /// Advance to a new status, enforcing forward-only movement.
    pub fn advance(&mut self, status: TaskStatus) -> Result<()> {
        if !self.status.state.can_advance_to(status.state) {
            return Err(WeftError::InvalidTransition {
                from: self.status.state.to_string(),
                to: status.state.to_string(),
            });
        }
        self.status = status;
        Ok(())
    }

    /// Reason attached to a failed task, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        match self.status.state {
            TaskState::Failed => self.status.message.as_deref(),
            _ => None,
        }
    }
}
