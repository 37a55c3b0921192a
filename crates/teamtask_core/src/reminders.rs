use crate::error::AppError;
use crate::mail::Mailer;
use crate::model::TodoStatus;
use crate::stamp;
use crate::storage::json_store;
use std::path::Path;
use time::{Duration, OffsetDateTime};

#[derive(Debug)]
pub struct ReminderOutcome {
    /// Todos newly reminded in this invocation, not a cumulative total.
    pub due_soon: usize,
    pub overdue: usize,
    pub failures: Vec<ReminderFailure>,
}

#[derive(Debug)]
pub struct ReminderFailure {
    pub todo_id: String,
    pub error: AppError,
}

enum Window {
    DueSoon,
    Overdue,
}

/// One scheduler tick. The tick cadence itself lives outside the engine;
/// invocations must be serialized at the deployment level.
pub fn process_reminders(mailer: &dyn Mailer) -> Result<ReminderOutcome, AppError> {
    let path = json_store::store_path()?;
    process_reminders_at(&path, mailer, OffsetDateTime::now_utc())
}

/// Scan for due-soon and overdue pending todos and email each one's
/// creator exactly once per condition. `now` is injected so the window
/// boundaries are testable.
///
/// The reminded-at timestamp is the idempotency guard: it is written only
/// after a successful send, so a failed send leaves the todo eligible for
/// the next tick, and an already-flagged todo is skipped even while still
/// inside its window. Both windows exclude their 24-hour boundary.
pub fn process_reminders_at(
    path: &Path,
    mailer: &dyn Mailer,
    now: OffsetDateTime,
) -> Result<ReminderOutcome, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let users = workspace.users.clone();
    let now_stamp = stamp::format_rfc3339(now)?;

    let mut due_soon = 0;
    let mut overdue = 0;
    let mut failures = Vec::new();

    for todo in &mut workspace.todos {
        if todo.status != TodoStatus::Pending {
            continue;
        }
        let Some(due_at) = todo.due_at.as_deref() else {
            continue;
        };

        let due = match stamp::parse_rfc3339(due_at, "due_at") {
            Ok(value) => value,
            Err(err) => {
                failures.push(ReminderFailure {
                    todo_id: todo.id.clone(),
                    error: err,
                });
                continue;
            }
        };

        let window = if now + Duration::hours(24) < due
            && due < now + Duration::hours(48)
            && todo.due_soon_reminded_at.is_none()
        {
            Window::DueSoon
        } else if now - Duration::hours(24) < due
            && due < now
            && todo.overdue_reminded_at.is_none()
        {
            Window::Overdue
        } else {
            continue;
        };

        let Some(creator) = users
            .iter()
            .find(|user| user.id == todo.creator_id && user.tenant_id == todo.tenant_id)
        else {
            failures.push(ReminderFailure {
                todo_id: todo.id.clone(),
                error: AppError::invalid_data("creator not found"),
            });
            continue;
        };
        if !creator.email_reminders {
            continue;
        }

        let (subject, body) = match window {
            Window::DueSoon => (
                format!("Due soon: {}", todo.title),
                format!("\"{}\" is due at {due_at}.", todo.title),
            ),
            Window::Overdue => (
                format!("Overdue: {}", todo.title),
                format!("\"{}\" was due at {due_at}.", todo.title),
            ),
        };

        match mailer.send(&creator.email, &subject, &body) {
            Ok(()) => match window {
                Window::DueSoon => {
                    todo.due_soon_reminded_at = Some(now_stamp.clone());
                    due_soon += 1;
                }
                Window::Overdue => {
                    todo.overdue_reminded_at = Some(now_stamp.clone());
                    overdue += 1;
                }
            },
            Err(err) => failures.push(ReminderFailure {
                todo_id: todo.id.clone(),
                error: err,
            }),
        }
    }

    if due_soon + overdue > 0 {
        json_store::save_workspace(path, &workspace)?;
    }

    Ok(ReminderOutcome {
        due_soon,
        overdue,
        failures,
    })
}
