use crate::error::AppError;
use crate::model::{Activity, Comment, Label, Notification, Subtask, Tenant, Todo, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "teamtask.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredWorkspace {
    schema_version: u32,
    #[serde(default)]
    tenants: Vec<Tenant>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    subtasks: Vec<Subtask>,
    #[serde(default)]
    notifications: Vec<Notification>,
    #[serde(default)]
    activities: Vec<Activity>,
}

/// The whole store, loaded and saved as one document. Every mutation is a
/// load-mutate-save of this snapshot, which is what makes multi-entity
/// writes (todo plus its label links) atomic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    pub tenants: Vec<Tenant>,
    pub users: Vec<User>,
    pub labels: Vec<Label>,
    pub todos: Vec<Todo>,
    pub comments: Vec<Comment>,
    pub subtasks: Vec<Subtask>,
    pub notifications: Vec<Notification>,
    pub activities: Vec<Activity>,
}

impl Workspace {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn user_in_tenant(&self, tenant_id: &str, id: &str) -> Option<&User> {
        self.user(id).filter(|user| user.tenant_id == tenant_id)
    }

    pub fn label_in_tenant(&self, tenant_id: &str, id: &str) -> Option<&Label> {
        self.labels
            .iter()
            .find(|label| label.id == id && label.tenant_id == tenant_id)
    }

    pub fn todo_in_tenant(&self, tenant_id: &str, id: &str) -> Option<&Todo> {
        self.todos
            .iter()
            .find(|todo| todo.id == id && todo.tenant_id == tenant_id)
    }

    pub fn todo_in_tenant_mut(&mut self, tenant_id: &str, id: &str) -> Option<&mut Todo> {
        self.todos
            .iter_mut()
            .find(|todo| todo.id == id && todo.tenant_id == tenant_id)
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var("TEAMTASK_STORE_PATH")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("teamtask")
            .join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("teamtask")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_workspace(path: &Path) -> Result<Workspace, AppError> {
    if !path.exists() {
        return Ok(Workspace::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredWorkspace =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let workspace = Workspace {
        tenants: stored.tenants,
        users: stored.users,
        labels: stored.labels,
        todos: stored.todos,
        comments: stored.comments,
        subtasks: stored.subtasks,
        notifications: stored.notifications,
        activities: stored.activities,
    };

    for todo in &workspace.todos {
        if workspace
            .user_in_tenant(&todo.tenant_id, &todo.creator_id)
            .is_none()
        {
            return Err(AppError::invalid_data(format!(
                "todo {} creator does not belong to its tenant",
                todo.id
            )));
        }
        if let Some(assignee_id) = todo.assignee_id.as_deref()
            && workspace
                .user_in_tenant(&todo.tenant_id, assignee_id)
                .is_none()
        {
            return Err(AppError::invalid_data(format!(
                "todo {} assignee does not belong to its tenant",
                todo.id
            )));
        }
    }

    Ok(workspace)
}

pub fn save_workspace(path: &Path, workspace: &Workspace) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredWorkspace {
        schema_version: SCHEMA_VERSION,
        tenants: workspace.tenants.clone(),
        users: workspace.users.clone(),
        labels: workspace.labels.clone(),
        todos: workspace.todos.clone(),
        comments: workspace.comments.clone(),
        subtasks: workspace.subtasks.clone(),
        notifications: workspace.notifications.clone(),
        activities: workspace.activities.clone(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}
