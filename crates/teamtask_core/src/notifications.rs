use crate::config::Session;
use crate::error::AppError;
use crate::model::{Notification, NotificationKind};
use crate::stamp;
use crate::storage::json_store::{self, Workspace};
use std::path::Path;

pub const DEFAULT_LIST_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub todo_id: Option<String>,
}

/// Pure append; no suppression logic lives here. Callers must compare the
/// actor to the recipient and skip the call entirely when they match.
pub fn append(workspace: &mut Workspace, input: NewNotification) -> Result<Notification, AppError> {
    let notification = Notification {
        id: stamp::new_id("ntf"),
        user_id: input.recipient_id,
        kind: input.kind,
        message: input.message,
        todo_id: input.todo_id,
        read: false,
        created_at: stamp::now_rfc3339()?,
    };
    workspace.notifications.push(notification.clone());
    Ok(notification)
}

pub fn create(input: NewNotification) -> Result<Notification, AppError> {
    let path = json_store::store_path()?;
    create_with_path(&path, input)
}

pub fn create_with_path(path: &Path, input: NewNotification) -> Result<Notification, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let notification = append(&mut workspace, input)?;
    json_store::save_workspace(path, &workspace)?;
    Ok(notification)
}

pub fn list(session: &Session, limit: Option<usize>) -> Result<Vec<Notification>, AppError> {
    let path = json_store::store_path()?;
    list_with_path(&path, session, limit)
}

/// The caller's notifications only, most recent first, truncated to
/// `limit` (20 if unspecified).
pub fn list_with_path(
    path: &Path,
    session: &Session,
    limit: Option<usize>,
) -> Result<Vec<Notification>, AppError> {
    let workspace = json_store::load_workspace(path)?;
    Ok(workspace
        .notifications
        .iter()
        .filter(|notification| notification.user_id == session.user_id)
        .rev()
        .take(limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .cloned()
        .collect())
}

pub fn unread_count(session: &Session) -> Result<usize, AppError> {
    let path = json_store::store_path()?;
    unread_count_with_path(&path, session)
}

pub fn unread_count_with_path(path: &Path, session: &Session) -> Result<usize, AppError> {
    let workspace = json_store::load_workspace(path)?;
    Ok(workspace
        .notifications
        .iter()
        .filter(|notification| notification.user_id == session.user_id && !notification.read)
        .count())
}

pub fn mark_read(session: &Session, id: &str) -> Result<Notification, AppError> {
    let path = json_store::store_path()?;
    mark_read_with_path(&path, session, id)
}

/// Marks one notification read. Already-read is a successful no-op. A
/// notification that does not exist and one that belongs to another user
/// produce the same error.
pub fn mark_read_with_path(
    path: &Path,
    session: &Session,
    id: &str,
) -> Result<Notification, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let notification = workspace
        .notifications
        .iter_mut()
        .find(|notification| notification.id == id && notification.user_id == session.user_id)
        .ok_or_else(|| AppError::not_found("notification not found"))?;

    if notification.read {
        return Ok(notification.clone());
    }

    notification.read = true;
    let updated = notification.clone();
    json_store::save_workspace(path, &workspace)?;

    Ok(updated)
}

pub fn mark_all_read(session: &Session) -> Result<usize, AppError> {
    let path = json_store::store_path()?;
    mark_all_read_with_path(&path, session)
}

/// Marks all of the caller's unread notifications read and reports how
/// many changed. Never touches another user's rows.
pub fn mark_all_read_with_path(path: &Path, session: &Session) -> Result<usize, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let mut changed = 0;

    for notification in &mut workspace.notifications {
        if notification.user_id == session.user_id && !notification.read {
            notification.read = true;
            changed += 1;
        }
    }

    if changed > 0 {
        json_store::save_workspace(path, &workspace)?;
    }

    Ok(changed)
}
