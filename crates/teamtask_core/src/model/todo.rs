use crate::recurrence::Repeat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TodoStatus,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub creator_id: String,
    /// Set the first time a due-soon reminder goes out for the current due
    /// date; cleared only when the due date itself changes.
    #[serde(default)]
    pub due_soon_reminded_at: Option<String>,
    #[serde(default)]
    pub overdue_reminded_at: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub todo_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub todo_id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}
