pub mod context;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod message;
pub mod store;
pub mod task;

pub use context::{ApiCredentials, RequestContext};
pub use descriptor::{AgentCapabilities, AgentDescriptor, AgentSkill};
pub use error::{Result, WeftError};
pub use event::{EventSink, EventStream, TaskEvent, TaskStatusUpdate};
pub use message::{Message, Part, Role};
pub use store::{InMemoryTaskStore, TaskStore};
pub use task::{Task, TaskState, TaskStatus};
