pub mod activity;
pub mod config;
pub mod error;
pub mod mail;
pub mod model;
pub mod notifications;
pub mod recurrence;
pub mod recurring;
pub mod reminders;
pub mod stamp;
pub mod storage;
pub mod todo_api;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Todo, TodoStatus};
    use crate::recurrence::Repeat;

    #[test]
    fn todo_has_required_fields() {
        let todo = Todo {
            id: "todo-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            title: "demo".to_string(),
            description: None,
            status: TodoStatus::Pending,
            due_at: None,
            repeat: Repeat::None,
            assignee_id: None,
            creator_id: "user-1".to_string(),
            due_soon_reminded_at: None,
            overdue_reminded_at: None,
            label_ids: Vec::new(),
            created_at: "2026-08-01T00:00:00Z".to_string(),
            completed_at: None,
        };

        assert_eq!(todo.id, "todo-1");
        assert_eq!(todo.tenant_id, "tenant-1");
        assert_eq!(todo.status, TodoStatus::Pending);
        assert_eq!(todo.repeat, Repeat::None);
        assert!(todo.label_ids.is_empty());
        assert_eq!(todo.due_soon_reminded_at, None);
        assert_eq!(todo.overdue_reminded_at, None);
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::not_found("todo not found");
        assert_eq!(err.code(), "not_found");
    }
}
