//! The asynchronous task model.
//!
//! Mutating control-plane calls do not finish synchronously: they return a
//! list of task identifiers, and the task endpoint is polled until each
//! task reaches a terminal state. A task is never stored locally; its state
//! is always queried fresh, and the identifier is forgotten once terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Opaque server-side identifier for an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Task lifecycle state as reported by the control plane.
///
/// `Finished` and `Error` are terminal; the other states mean the task is
/// still in flight and must be polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Accepted but not yet started.
    New,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Finished,
    /// Failed; the task carries the remote error message.
    Error,
}

impl TaskState {
    /// True if the state will not change on further polling.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// Resource identifiers recorded by a completed task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedResources {
    /// Instances produced by the task.
    #[serde(default)]
    pub instances: Vec<String>,
    /// Volumes produced by the task.
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Floating IPs produced by the task.
    #[serde(default)]
    pub floating_ips: Vec<String>,
}

/// A task as returned by the task-status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Task identifier.
    pub id: TaskId,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Remote error message, present when `state` is `Error`.
    #[serde(default)]
    pub error: Option<String>,
    /// IDs of resources the task produced, present once finished.
    #[serde(default)]
    pub created_resources: Option<CreatedResources>,
}

impl TaskInfo {
    /// The first instance ID recorded in the task's metadata, if any.
    #[must_use]
    pub fn first_instance_id(&self) -> Option<&str> {
        self.created_resources
            .as_ref()
            .and_then(|r| r.instances.first())
            .map(String::as_str)
    }
}

/// Task identifiers returned by a mutating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    /// Tasks spawned by the operation, in submission order.
    pub tasks: Vec<TaskId>,
}

/// Fetch the current state of a task.
pub async fn get(client: &ApiClient, id: &TaskId) -> ApiResult<TaskInfo> {
    client.get_json(&client.url("v1", "tasks", &id.0)?).await
}
