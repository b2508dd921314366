use serde::{Deserialize, Serialize};

pub type TaskId = String;

/// The value stored under `tasks/{userId}/{taskId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TaskRecord {
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
}

impl Task {
    pub fn from_record(id: TaskId, record: TaskRecord) -> Self {
        Self {
            id,
            description: record.description,
        }
    }

    pub fn record(&self) -> TaskRecord {
        TaskRecord {
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: String,
    /// Bearer token for the remote store. Absent for in-memory backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: email.into(),
            id_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    /// The user id, treating an empty string the same as a missing one.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Everything the presentation layer needs to draw the task list screen.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TaskListView {
    pub loading: bool,
    pub tasks: Vec<Task>,
    pub current_text: String,
    pub editing: bool,
}
