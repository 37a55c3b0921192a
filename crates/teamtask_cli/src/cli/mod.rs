use clap::{Parser, Subcommand};
use teamtask_core::recurrence::Repeat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this user id (overrides TEAMTASK_USER and the configured default)
    #[arg(long = "as", value_name = "USER_ID", global = true)]
    pub acting_user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage tenants
    ///
    /// Example: teamtask tenant add "Acme Inc"
    Tenant {
        #[command(subcommand)]
        tenant: TenantCommand,
    },
    /// Manage users
    ///
    /// Example: teamtask user add tenant-1 "Ada" ada@acme.test
    User {
        #[command(subcommand)]
        user: UserCommand,
    },
    /// Add a new todo
    ///
    /// Example: teamtask add "Water the plants" --due 2026-09-01T09:00:00Z --repeat weekly
    Add {
        title: String,
        #[arg(long)]
        due: Option<String>,
        /// One of: none, daily, weekly, biweekly, monthly, yearly
        #[arg(long, default_value = "none")]
        repeat: String,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the tenant's todos
    List,
    /// Show one todo
    ///
    /// Example: teamtask show todo-1
    Show {
        id: String,
    },
    /// Assign a todo to a user, or clear the assignee
    ///
    /// Example: teamtask assign todo-1 user-2
    /// Example: teamtask assign todo-1 --clear
    Assign {
        id: String,
        assignee: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Comment on a todo
    ///
    /// Example: teamtask comment todo-1 "done by friday?"
    Comment {
        id: String,
        body: String,
    },
    /// Mark a todo completed (spawns the next occurrence of a repeating todo)
    ///
    /// Example: teamtask done todo-1
    Done {
        id: String,
    },
    /// Move or clear a todo's due date
    ///
    /// Example: teamtask reschedule todo-1 2026-09-05T09:00:00Z
    /// Example: teamtask reschedule todo-1 --clear
    Reschedule {
        id: String,
        due: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Update a todo's description
    ///
    /// Example: teamtask describe todo-1 "quarterly numbers"
    Describe {
        id: String,
        text: Option<String>,
    },
    /// Manage labels
    ///
    /// Example: teamtask label add Urgent
    /// Example: teamtask label attach todo-1 label-1
    Label {
        #[command(subcommand)]
        label: LabelCommand,
    },
    /// Run one reminder scan (intended to be invoked by a scheduler)
    ///
    /// Example: teamtask remind
    Remind,
    /// List your notifications
    ///
    /// Example: teamtask inbox --limit 5
    Inbox {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Mark one notification read
    ///
    /// Example: teamtask read ntf-1
    Read {
        id: String,
    },
    /// Mark all your notifications read
    ReadAll,
    /// Show a todo's audit trail, newest first
    ///
    /// Example: teamtask activity todo-1
    Activity {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TenantCommand {
    /// Create a tenant
    Add { name: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user inside a tenant
    Add {
        tenant_id: String,
        name: String,
        email: String,
        /// Opt the user out of due-soon and overdue reminder emails
        #[arg(long)]
        no_reminders: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Create a label in your tenant
    Add { name: String },
    /// Attach a label to a todo
    Attach { id: String, label_id: String },
    /// Detach a label from a todo
    Detach { id: String, label_id: String },
}

pub fn parse_repeat(raw: &str) -> Result<Repeat, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(Repeat::None),
        "daily" => Ok(Repeat::Daily),
        "weekly" => Ok(Repeat::Weekly),
        "biweekly" => Ok(Repeat::Biweekly),
        "monthly" => Ok(Repeat::Monthly),
        "yearly" => Ok(Repeat::Yearly),
        other => Err(format!("unknown repeat interval '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_repeat;
    use teamtask_core::recurrence::Repeat;

    #[test]
    fn parse_repeat_accepts_known_intervals() {
        assert_eq!(parse_repeat("none").unwrap(), Repeat::None);
        assert_eq!(parse_repeat(" Weekly ").unwrap(), Repeat::Weekly);
        assert_eq!(parse_repeat("BIWEEKLY").unwrap(), Repeat::Biweekly);
        assert_eq!(parse_repeat("monthly").unwrap(), Repeat::Monthly);
    }

    #[test]
    fn parse_repeat_rejects_unknown_intervals() {
        let err = parse_repeat("fortnightly").unwrap_err();
        assert!(err.contains("unknown repeat interval"));
    }
}
