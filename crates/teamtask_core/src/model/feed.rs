use serde::{Deserialize, Serialize};

/// One inbox entry for one user. The message is rendered once at creation
/// time; it is never re-derived from the todo, so it survives the todo's
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub todo_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Assigned,
    Commented,
}

/// One immutable audit entry describing a single field change on a todo.
/// Old/new values are loose optional strings shared by every action kind;
/// `activity::render` is the only consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub todo_id: String,
    pub actor_id: String,
    pub action: ActivityAction,
    pub field: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    StatusChanged,
    AssigneeChanged,
    DueDateChanged,
    LabelsChanged,
    DescriptionChanged,
}
