use crate::error::AppError;
use crate::model::{Todo, TodoStatus};
use crate::recurrence::{self, Repeat};
use crate::stamp;
use crate::storage::json_store::{self, Workspace};
use std::path::Path;

/// Successor of a just-completed repeating todo, or `None` when the todo
/// does not qualify. Copies title, description, repeat, assignee, and the
/// full label set; forces status back to Pending; advances the due date;
/// leaves both reminded-at fields unset. Comments, subtasks, and activity
/// history are deliberately not copied.
pub fn successor_of(todo: &Todo) -> Result<Option<Todo>, AppError> {
    if todo.repeat == Repeat::None {
        return Ok(None);
    }
    let Some(due_at) = todo.due_at.as_deref() else {
        return Ok(None);
    };

    let current = stamp::parse_rfc3339(due_at, "due_at")?;
    let Some(next) = recurrence::next_due_date(current, todo.repeat) else {
        return Ok(None);
    };

    Ok(Some(Todo {
        id: stamp::new_id("todo"),
        tenant_id: todo.tenant_id.clone(),
        title: todo.title.clone(),
        description: todo.description.clone(),
        status: TodoStatus::Pending,
        due_at: Some(stamp::format_rfc3339(next)?),
        repeat: todo.repeat,
        assignee_id: todo.assignee_id.clone(),
        creator_id: todo.creator_id.clone(),
        due_soon_reminded_at: None,
        overdue_reminded_at: None,
        label_ids: todo.label_ids.clone(),
        created_at: stamp::now_rfc3339()?,
        completed_at: None,
    }))
}

/// Materialize the successor into an already-loaded workspace. The caller
/// owns the save, so the completion handler can bundle the status change
/// and the spawn into one store write.
pub fn spawn_next(workspace: &mut Workspace, todo_id: &str) -> Result<Option<Todo>, AppError> {
    let Some(todo) = workspace.todos.iter().find(|todo| todo.id == todo_id) else {
        return Ok(None);
    };

    let Some(next) = successor_of(todo)? else {
        return Ok(None);
    };

    workspace.todos.push(next.clone());
    Ok(Some(next))
}

pub fn generate_next(todo_id: &str) -> Result<Option<Todo>, AppError> {
    let path = json_store::store_path()?;
    generate_next_with_path(&path, todo_id)
}

/// Standalone entry point: load, spawn, save once. A precondition failure
/// (missing todo, no repeat, no due date) is a silent no-op, not an error.
pub fn generate_next_with_path(path: &Path, todo_id: &str) -> Result<Option<Todo>, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let spawned = spawn_next(&mut workspace, todo_id)?;
    if spawned.is_some() {
        json_store::save_workspace(path, &workspace)?;
    }
    Ok(spawned)
}
