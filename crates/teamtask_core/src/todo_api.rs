use crate::activity::{self, RecordInput};
use crate::config::Session;
use crate::error::AppError;
use crate::model::{
    ActivityAction, Comment, Label, NotificationKind, Tenant, Todo, TodoStatus, User,
};
use crate::notifications::{self, NewNotification};
use crate::recurrence::Repeat;
use crate::recurring;
use crate::stamp;
use crate::storage::json_store::{self, Workspace};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<String>,
    pub repeat: Repeat,
    pub assignee_id: Option<String>,
    pub label_ids: Vec<String>,
}

pub fn status_label(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Pending => "pending",
        TodoStatus::Completed => "completed",
    }
}

pub fn add_tenant(name: &str) -> Result<Tenant, AppError> {
    let path = json_store::store_path()?;
    add_tenant_with_path(&path, name)
}

pub fn add_tenant_with_path(path: &Path, name: &str) -> Result<Tenant, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }

    let mut workspace = json_store::load_workspace(path)?;
    let tenant = Tenant {
        id: stamp::new_id("tenant"),
        name: trimmed.to_string(),
    };
    workspace.tenants.push(tenant.clone());
    json_store::save_workspace(path, &workspace)?;

    Ok(tenant)
}

pub fn add_user(
    tenant_id: &str,
    name: &str,
    email: &str,
    email_reminders: bool,
) -> Result<User, AppError> {
    let path = json_store::store_path()?;
    add_user_with_path(&path, tenant_id, name, email, email_reminders)
}

pub fn add_user_with_path(
    path: &Path,
    tenant_id: &str,
    name: &str,
    email: &str,
    email_reminders: bool,
) -> Result<User, AppError> {
    let trimmed_name = name.trim();
    if trimmed_name.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    let trimmed_email = email.trim();
    if trimmed_email.is_empty() || !trimmed_email.contains('@') {
        return Err(AppError::invalid_input("a valid email is required"));
    }

    let mut workspace = json_store::load_workspace(path)?;
    if !workspace.tenants.iter().any(|tenant| tenant.id == tenant_id) {
        return Err(AppError::not_found("tenant not found"));
    }

    let user = User {
        id: stamp::new_id("user"),
        tenant_id: tenant_id.to_string(),
        name: trimmed_name.to_string(),
        email: trimmed_email.to_string(),
        email_reminders,
    };
    workspace.users.push(user.clone());
    json_store::save_workspace(path, &workspace)?;

    Ok(user)
}

pub fn create_todo(session: &Session, new: NewTodo) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    create_todo_with_path(&path, session, new)
}

pub fn create_todo_with_path(
    path: &Path,
    session: &Session,
    new: NewTodo,
) -> Result<Todo, AppError> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }

    let due_at = match new.due_at.as_deref() {
        Some(value) => {
            let parsed = stamp::parse_rfc3339(value.trim(), "due_at")
                .map_err(|_| AppError::invalid_input("due_at must be RFC3339"))?;
            Some(stamp::format_rfc3339(parsed)?)
        }
        None => None,
    };

    let mut workspace = json_store::load_workspace(path)?;
    if let Some(assignee_id) = new.assignee_id.as_deref()
        && workspace
            .user_in_tenant(&session.tenant_id, assignee_id)
            .is_none()
    {
        return Err(AppError::not_found("user not found"));
    }
    for label_id in &new.label_ids {
        if workspace
            .label_in_tenant(&session.tenant_id, label_id)
            .is_none()
        {
            return Err(AppError::not_found("label not found"));
        }
    }

    let todo = Todo {
        id: stamp::new_id("todo"),
        tenant_id: session.tenant_id.clone(),
        title: title.to_string(),
        description: new.description,
        status: TodoStatus::Pending,
        due_at,
        repeat: new.repeat,
        assignee_id: new.assignee_id,
        creator_id: session.user_id.clone(),
        due_soon_reminded_at: None,
        overdue_reminded_at: None,
        label_ids: new.label_ids,
        created_at: stamp::now_rfc3339()?,
        completed_at: None,
    };
    workspace.todos.push(todo.clone());

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: todo.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::Created,
            field: "todo".to_string(),
            old_value: None,
            new_value: None,
        },
    )?;
    json_store::save_workspace(path, &workspace)?;

    Ok(todo)
}

pub fn list_todos(session: &Session) -> Result<Vec<Todo>, AppError> {
    let path = json_store::store_path()?;
    list_todos_with_path(&path, session)
}

pub fn list_todos_with_path(path: &Path, session: &Session) -> Result<Vec<Todo>, AppError> {
    let workspace = json_store::load_workspace(path)?;
    Ok(workspace
        .todos
        .iter()
        .filter(|todo| todo.tenant_id == session.tenant_id)
        .cloned()
        .collect())
}

pub fn get_todo(session: &Session, id: &str) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    get_todo_with_path(&path, session, id)
}

pub fn get_todo_with_path(path: &Path, session: &Session, id: &str) -> Result<Todo, AppError> {
    let workspace = json_store::load_workspace(path)?;
    workspace
        .todo_in_tenant(&session.tenant_id, id)
        .cloned()
        .ok_or_else(|| AppError::not_found("todo not found"))
}

pub fn assign_todo(
    session: &Session,
    id: &str,
    assignee_id: Option<&str>,
) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    assign_todo_with_path(&path, session, id, assignee_id)
}

/// Change (or clear) a todo's assignee. Records the matching audit entry
/// and notifies the new assignee, unless the actor assigned themselves;
/// self-directed actions never notify the actor.
pub fn assign_todo_with_path(
    path: &Path,
    session: &Session,
    id: &str,
    assignee_id: Option<&str>,
) -> Result<Todo, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let actor_name = actor_name(&workspace, session)?;

    if let Some(assignee_id) = assignee_id
        && workspace
            .user_in_tenant(&session.tenant_id, assignee_id)
            .is_none()
    {
        return Err(AppError::not_found("user not found"));
    }

    let todo = workspace
        .todo_in_tenant_mut(&session.tenant_id, id)
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    let old = todo.assignee_id.clone();
    let new = assignee_id.map(str::to_string);
    if old == new {
        return Ok(todo.clone());
    }

    todo.assignee_id = new.clone();
    let updated = todo.clone();

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: updated.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::AssigneeChanged,
            field: "assignee".to_string(),
            old_value: old,
            new_value: new.clone(),
        },
    )?;

    if let Some(recipient) = new
        && recipient != session.user_id
    {
        notifications::append(
            &mut workspace,
            NewNotification {
                recipient_id: recipient,
                kind: NotificationKind::Assigned,
                message: format!("{actor_name} assigned \"{}\" to you", updated.title),
                todo_id: Some(updated.id.clone()),
            },
        )?;
    }

    json_store::save_workspace(path, &workspace)?;
    Ok(updated)
}

pub fn comment_todo(session: &Session, id: &str, body: &str) -> Result<Comment, AppError> {
    let path = json_store::store_path()?;
    comment_todo_with_path(&path, session, id, body)
}

/// Append a comment and notify the todo's creator and current assignee,
/// skipping the actor and collapsing duplicates.
pub fn comment_todo_with_path(
    path: &Path,
    session: &Session,
    id: &str,
    body: &str,
) -> Result<Comment, AppError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("comment body is required"));
    }

    let mut workspace = json_store::load_workspace(path)?;
    let actor_name = actor_name(&workspace, session)?;
    let todo = workspace
        .todo_in_tenant(&session.tenant_id, id)
        .cloned()
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    let comment = Comment {
        id: stamp::new_id("comment"),
        todo_id: todo.id.clone(),
        author_id: session.user_id.clone(),
        body: trimmed.to_string(),
        created_at: stamp::now_rfc3339()?,
    };
    workspace.comments.push(comment.clone());

    let mut recipients = vec![todo.creator_id.clone()];
    if let Some(assignee_id) = todo.assignee_id.clone() {
        recipients.push(assignee_id);
    }
    recipients.dedup();
    recipients.retain(|recipient| recipient != &session.user_id);

    for recipient in recipients {
        notifications::append(
            &mut workspace,
            NewNotification {
                recipient_id: recipient,
                kind: NotificationKind::Commented,
                message: format!("{actor_name} commented on \"{}\"", todo.title),
                todo_id: Some(todo.id.clone()),
            },
        )?;
    }

    json_store::save_workspace(path, &workspace)?;
    Ok(comment)
}

pub fn complete_todo(session: &Session, id: &str) -> Result<(Todo, Option<Todo>), AppError> {
    let path = json_store::store_path()?;
    complete_todo_with_path(&path, session, id)
}

/// Mark a todo completed. When it carries a repeat interval and a due
/// date, its successor is spawned in the same store write, so the status
/// change, the new todo, and its label links land atomically.
pub fn complete_todo_with_path(
    path: &Path,
    session: &Session,
    id: &str,
) -> Result<(Todo, Option<Todo>), AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let todo = workspace
        .todo_in_tenant_mut(&session.tenant_id, id)
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    if todo.status == TodoStatus::Completed {
        return Err(AppError::invalid_input("todo already completed"));
    }

    todo.status = TodoStatus::Completed;
    todo.completed_at = Some(stamp::now_rfc3339()?);
    let completed = todo.clone();

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: completed.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::StatusChanged,
            field: "status".to_string(),
            old_value: Some(status_label(TodoStatus::Pending).to_string()),
            new_value: Some(status_label(TodoStatus::Completed).to_string()),
        },
    )?;

    let successor = recurring::spawn_next(&mut workspace, &completed.id)?;
    json_store::save_workspace(path, &workspace)?;

    Ok((completed, successor))
}

pub fn reschedule_todo(
    session: &Session,
    id: &str,
    due_at: Option<&str>,
) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    reschedule_todo_with_path(&path, session, id, due_at)
}

/// Set, move, or clear a todo's due date. A new due date is a new reminder
/// condition, so both reminded-at flags are cleared.
pub fn reschedule_todo_with_path(
    path: &Path,
    session: &Session,
    id: &str,
    due_at: Option<&str>,
) -> Result<Todo, AppError> {
    let new = match due_at {
        Some(value) => {
            let parsed = stamp::parse_rfc3339(value.trim(), "due_at")
                .map_err(|_| AppError::invalid_input("due_at must be RFC3339"))?;
            Some(stamp::format_rfc3339(parsed)?)
        }
        None => None,
    };

    let mut workspace = json_store::load_workspace(path)?;
    let todo = workspace
        .todo_in_tenant_mut(&session.tenant_id, id)
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    let old = todo.due_at.clone();
    if old == new {
        return Ok(todo.clone());
    }

    todo.due_at = new.clone();
    todo.due_soon_reminded_at = None;
    todo.overdue_reminded_at = None;
    let updated = todo.clone();

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: updated.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::DueDateChanged,
            field: "due_at".to_string(),
            old_value: old,
            new_value: new,
        },
    )?;

    json_store::save_workspace(path, &workspace)?;
    Ok(updated)
}

pub fn update_description(
    session: &Session,
    id: &str,
    description: Option<&str>,
) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    update_description_with_path(&path, session, id, description)
}

pub fn update_description_with_path(
    path: &Path,
    session: &Session,
    id: &str,
    description: Option<&str>,
) -> Result<Todo, AppError> {
    let new = description
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let mut workspace = json_store::load_workspace(path)?;
    let todo = workspace
        .todo_in_tenant_mut(&session.tenant_id, id)
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    let old = todo.description.clone();
    if old == new {
        return Ok(todo.clone());
    }

    todo.description = new.clone();
    let updated = todo.clone();

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: updated.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::DescriptionChanged,
            field: "description".to_string(),
            old_value: old,
            new_value: new,
        },
    )?;

    json_store::save_workspace(path, &workspace)?;
    Ok(updated)
}

pub fn add_label(session: &Session, name: &str) -> Result<Label, AppError> {
    let path = json_store::store_path()?;
    add_label_with_path(&path, session, name)
}

pub fn add_label_with_path(path: &Path, session: &Session, name: &str) -> Result<Label, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }

    let mut workspace = json_store::load_workspace(path)?;
    if workspace
        .labels
        .iter()
        .any(|label| label.tenant_id == session.tenant_id && label.name == trimmed)
    {
        return Err(AppError::invalid_input("label already exists"));
    }

    let label = Label {
        id: stamp::new_id("label"),
        tenant_id: session.tenant_id.clone(),
        name: trimmed.to_string(),
    };
    workspace.labels.push(label.clone());
    json_store::save_workspace(path, &workspace)?;

    Ok(label)
}

pub fn attach_label(session: &Session, id: &str, label_id: &str) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    attach_label_with_path(&path, session, id, label_id)
}

pub fn attach_label_with_path(
    path: &Path,
    session: &Session,
    id: &str,
    label_id: &str,
) -> Result<Todo, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let label_name = workspace
        .label_in_tenant(&session.tenant_id, label_id)
        .map(|label| label.name.clone())
        .ok_or_else(|| AppError::not_found("label not found"))?;

    let todo = workspace
        .todo_in_tenant_mut(&session.tenant_id, id)
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    if todo.label_ids.iter().any(|existing| existing == label_id) {
        return Ok(todo.clone());
    }

    todo.label_ids.push(label_id.to_string());
    let updated = todo.clone();

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: updated.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::LabelsChanged,
            field: "labels".to_string(),
            old_value: None,
            new_value: Some(label_name),
        },
    )?;

    json_store::save_workspace(path, &workspace)?;
    Ok(updated)
}

pub fn detach_label(session: &Session, id: &str, label_id: &str) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    detach_label_with_path(&path, session, id, label_id)
}

pub fn detach_label_with_path(
    path: &Path,
    session: &Session,
    id: &str,
    label_id: &str,
) -> Result<Todo, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let label_name = workspace
        .label_in_tenant(&session.tenant_id, label_id)
        .map(|label| label.name.clone())
        .ok_or_else(|| AppError::not_found("label not found"))?;

    let todo = workspace
        .todo_in_tenant_mut(&session.tenant_id, id)
        .ok_or_else(|| AppError::not_found("todo not found"))?;

    let before = todo.label_ids.len();
    todo.label_ids.retain(|existing| existing != label_id);
    if todo.label_ids.len() == before {
        return Ok(todo.clone());
    }
    let updated = todo.clone();

    activity::append(
        &mut workspace,
        RecordInput {
            todo_id: updated.id.clone(),
            actor_id: session.user_id.clone(),
            action: ActivityAction::LabelsChanged,
            field: "labels".to_string(),
            old_value: Some(label_name),
            new_value: None,
        },
    )?;

    json_store::save_workspace(path, &workspace)?;
    Ok(updated)
}

fn actor_name(workspace: &Workspace, session: &Session) -> Result<String, AppError> {
    workspace
        .user_in_tenant(&session.tenant_id, &session.user_id)
        .map(|user| user.name.clone())
        .ok_or_else(|| AppError::invalid_data("acting user not found"))
}
