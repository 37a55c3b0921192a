use crate::config::Session;
use crate::error::AppError;
use crate::model::{Activity, ActivityAction};
use crate::stamp;
use crate::storage::json_store::{self, Workspace};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RecordInput {
    pub todo_id: String,
    pub actor_id: String,
    pub action: ActivityAction,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Append one audit entry to an already-loaded workspace. The caller owns
/// the save; mutation handlers bundle this with their own change into one
/// store write.
pub fn append(workspace: &mut Workspace, input: RecordInput) -> Result<Activity, AppError> {
    let activity = Activity {
        id: stamp::new_id("act"),
        todo_id: input.todo_id,
        actor_id: input.actor_id,
        action: input.action,
        field: input.field,
        old_value: input.old_value,
        new_value: input.new_value,
        created_at: stamp::now_rfc3339()?,
    };
    workspace.activities.push(activity.clone());
    Ok(activity)
}

pub fn record(input: RecordInput) -> Result<Activity, AppError> {
    let path = json_store::store_path()?;
    record_with_path(&path, input)
}

pub fn record_with_path(path: &Path, input: RecordInput) -> Result<Activity, AppError> {
    let mut workspace = json_store::load_workspace(path)?;
    let activity = append(&mut workspace, input)?;
    json_store::save_workspace(path, &workspace)?;
    Ok(activity)
}

pub fn feed(session: &Session, todo_id: &str) -> Result<Vec<Activity>, AppError> {
    let path = json_store::store_path()?;
    feed_with_path(&path, session, todo_id)
}

/// Audit trail for one todo, newest entry first. Entries are appended in
/// chronological order, so the feed is the filtered list reversed.
pub fn feed_with_path(
    path: &Path,
    session: &Session,
    todo_id: &str,
) -> Result<Vec<Activity>, AppError> {
    let workspace = json_store::load_workspace(path)?;
    if workspace
        .todo_in_tenant(&session.tenant_id, todo_id)
        .is_none()
    {
        return Err(AppError::not_found("todo not found"));
    }

    Ok(workspace
        .activities
        .iter()
        .filter(|activity| activity.todo_id == todo_id)
        .rev()
        .cloned()
        .collect())
}

pub fn rendered_feed(session: &Session, todo_id: &str) -> Result<Vec<String>, AppError> {
    let path = json_store::store_path()?;
    rendered_feed_with_path(&path, session, todo_id)
}

/// The feed with actor names resolved and each entry rendered to a
/// sentence. A deleted actor falls back to their raw id.
pub fn rendered_feed_with_path(
    path: &Path,
    session: &Session,
    todo_id: &str,
) -> Result<Vec<String>, AppError> {
    let workspace = json_store::load_workspace(path)?;
    if workspace
        .todo_in_tenant(&session.tenant_id, todo_id)
        .is_none()
    {
        return Err(AppError::not_found("todo not found"));
    }

    Ok(workspace
        .activities
        .iter()
        .filter(|activity| activity.todo_id == todo_id)
        .rev()
        .map(|activity| {
            let actor_name = workspace
                .user(&activity.actor_id)
                .map(|user| user.name.as_str())
                .unwrap_or(activity.actor_id.as_str());
            render(activity, actor_name)
        })
        .collect())
}

/// Human-readable sentence for one audit entry. Pure function of the
/// action, the diff values, and the actor's display name.
pub fn render(activity: &Activity, actor_name: &str) -> String {
    match activity.action {
        ActivityAction::Created => format!("{actor_name} created this task"),
        ActivityAction::StatusChanged => {
            match (activity.old_value.as_deref(), activity.new_value.as_deref()) {
                (Some(old), Some(new)) => {
                    format!("{actor_name} changed status from {old} to {new}")
                }
                _ => format!("{actor_name} changed status"),
            }
        }
        ActivityAction::AssigneeChanged => {
            match (activity.old_value.as_deref(), activity.new_value.as_deref()) {
                (None, Some(_)) => format!("{actor_name} assigned this task"),
                (Some(_), None) => format!("{actor_name} removed assignee"),
                _ => format!("{actor_name} changed assignee"),
            }
        }
        ActivityAction::DueDateChanged => {
            match (activity.old_value.as_deref(), activity.new_value.as_deref()) {
                (None, Some(_)) => format!("{actor_name} set due date"),
                (Some(_), None) => format!("{actor_name} removed due date"),
                _ => format!("{actor_name} changed due date"),
            }
        }
        ActivityAction::LabelsChanged => {
            match (activity.old_value.as_deref(), activity.new_value.as_deref()) {
                (None, Some(name)) => format!("{actor_name} added label \"{name}\""),
                (Some(name), None) => format!("{actor_name} removed label \"{name}\""),
                _ => format!("{actor_name} updated labels"),
            }
        }
        ActivityAction::DescriptionChanged => format!("{actor_name} updated the description"),
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordInput, append, feed_with_path, record_with_path, render};
    use crate::config::Session;
    use crate::model::{Activity, ActivityAction, Tenant, Todo, TodoStatus, User};
    use crate::recurrence::Repeat;
    use crate::storage::json_store::{self, Workspace};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("teamtask-{nanos}-{file_name}"))
    }

    fn entry(
        action: ActivityAction,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Activity {
        Activity {
            id: "act-1".to_string(),
            todo_id: "todo-1".to_string(),
            actor_id: "user-1".to_string(),
            action,
            field: "field".to_string(),
            old_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
            created_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }

    fn seeded_workspace() -> Workspace {
        Workspace {
            tenants: vec![Tenant {
                id: "tenant-1".to_string(),
                name: "acme".to_string(),
            }],
            users: vec![User {
                id: "user-1".to_string(),
                tenant_id: "tenant-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@acme.test".to_string(),
                email_reminders: true,
            }],
            todos: vec![Todo {
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
            }],
            ..Workspace::default()
        }
    }

    fn session() -> Session {
        Session {
            user_id: "user-1".to_string(),
            tenant_id: "tenant-1".to_string(),
        }
    }

    #[test]
    fn render_created() {
        let activity = entry(ActivityAction::Created, None, None);
        assert_eq!(render(&activity, "Ada"), "Ada created this task");
    }

    #[test]
    fn render_status_change_includes_both_values() {
        let activity = entry(ActivityAction::StatusChanged, Some("pending"), Some("completed"));
        assert_eq!(
            render(&activity, "Ada"),
            "Ada changed status from pending to completed"
        );
    }

    #[test]
    fn render_assignee_transitions() {
        let assigned = entry(ActivityAction::AssigneeChanged, None, Some("user-2"));
        assert_eq!(render(&assigned, "Ada"), "Ada assigned this task");

        let removed = entry(ActivityAction::AssigneeChanged, Some("user-2"), None);
        assert_eq!(render(&removed, "Ada"), "Ada removed assignee");

        let changed = entry(ActivityAction::AssigneeChanged, Some("user-2"), Some("user-3"));
        assert_eq!(render(&changed, "Ada"), "Ada changed assignee");
    }

    #[test]
    fn render_due_date_transitions() {
        let set = entry(ActivityAction::DueDateChanged, None, Some("2026-09-01T00:00:00Z"));
        assert_eq!(render(&set, "Ada"), "Ada set due date");

        let removed = entry(ActivityAction::DueDateChanged, Some("2026-09-01T00:00:00Z"), None);
        assert_eq!(render(&removed, "Ada"), "Ada removed due date");

        let changed = entry(
            ActivityAction::DueDateChanged,
            Some("2026-09-01T00:00:00Z"),
            Some("2026-09-02T00:00:00Z"),
        );
        assert_eq!(render(&changed, "Ada"), "Ada changed due date");
    }

    #[test]
    fn render_label_transitions_quote_the_name() {
        let added = entry(ActivityAction::LabelsChanged, None, Some("Urgent"));
        assert_eq!(render(&added, "Ada"), "Ada added label \"Urgent\"");

        let removed = entry(ActivityAction::LabelsChanged, Some("Urgent"), None);
        assert_eq!(render(&removed, "Ada"), "Ada removed label \"Urgent\"");
    }

    #[test]
    fn render_description_change_hides_the_diff() {
        let activity = entry(ActivityAction::DescriptionChanged, Some("a"), Some("b"));
        assert_eq!(render(&activity, "Ada"), "Ada updated the description");
    }

    #[test]
    fn record_appends_to_the_store() {
        let path = temp_path("record.json");
        json_store::save_workspace(&path, &seeded_workspace()).unwrap();

        record_with_path(
            &path,
            RecordInput {
                todo_id: "todo-1".to_string(),
                actor_id: "user-1".to_string(),
                action: ActivityAction::Created,
                field: "todo".to_string(),
                old_value: None,
                new_value: None,
            },
        )
        .unwrap();

        let loaded = json_store::load_workspace(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.activities.len(), 1);
        assert_eq!(loaded.activities[0].action, ActivityAction::Created);
    }

    #[test]
    fn feed_is_newest_first_with_one_entry_per_record() {
        let path = temp_path("feed.json");
        let mut workspace = seeded_workspace();

        for (index, field) in ["status", "assignee", "due_at"].iter().enumerate() {
            append(
                &mut workspace,
                RecordInput {
                    todo_id: "todo-1".to_string(),
                    actor_id: "user-1".to_string(),
                    action: ActivityAction::StatusChanged,
                    field: field.to_string(),
                    old_value: Some(format!("old-{index}")),
                    new_value: Some(format!("new-{index}")),
                },
            )
            .unwrap();
        }
        json_store::save_workspace(&path, &workspace).unwrap();

        let feed = feed_with_path(&path, &session(), "todo-1").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].field, "due_at");
        assert_eq!(feed[2].field, "status");
    }

    #[test]
    fn rendered_feed_resolves_actor_names() {
        let path = temp_path("rendered-feed.json");
        let mut workspace = seeded_workspace();
        append(
            &mut workspace,
            RecordInput {
                todo_id: "todo-1".to_string(),
                actor_id: "user-1".to_string(),
                action: ActivityAction::Created,
                field: "todo".to_string(),
                old_value: None,
                new_value: None,
            },
        )
        .unwrap();
        json_store::save_workspace(&path, &workspace).unwrap();

        let rendered = super::rendered_feed_with_path(&path, &session(), "todo-1").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rendered, vec!["Ada created this task".to_string()]);
    }

    #[test]
    fn feed_rejects_todo_outside_tenant() {
        let path = temp_path("feed-cross-tenant.json");
        json_store::save_workspace(&path, &seeded_workspace()).unwrap();

        let foreign = Session {
            user_id: "user-9".to_string(),
            tenant_id: "tenant-9".to_string(),
        };
        let err = feed_with_path(&path, &foreign, "todo-1").unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "not_found");
    }
}
