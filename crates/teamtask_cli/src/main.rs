use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::{Table, Tabled};
use teamtask_cli::cli::{Cli, Command, LabelCommand, TenantCommand, UserCommand, parse_repeat};
use teamtask_core::config::{self, Session};
use teamtask_core::error::AppError;
use teamtask_core::mail::{self, Mailer, SpoolMailer};
use teamtask_core::model::{Notification, Todo};
use teamtask_core::storage::json_store;
use teamtask_core::todo_api::{self, NewTodo, status_label};
use teamtask_core::{activity, notifications, reminders};

fn resolve_session(acting_user: Option<&str>) -> Result<Session, AppError> {
    let config = config::load_config(&config::config_path()?)?;
    let user_id = config::acting_user(acting_user, &config)?;
    let workspace = json_store::load_workspace(&json_store::store_path()?)?;
    config::resolve_session(&workspace, &user_id)
}

fn mailer_from_config() -> Result<Box<dyn Mailer>, AppError> {
    let config = config::load_config(&config::config_path()?)?;
    if let Some(spool) = config.mail_spool
        && !spool.trim().is_empty()
    {
        return Ok(Box::new(SpoolMailer::new(spool)));
    }
    mail::mailer_from_env()
}

#[derive(Tabled)]
struct TodoRow {
    id: String,
    title: String,
    status: String,
    due: String,
    repeat: String,
    assignee: String,
}

impl TodoRow {
    fn from_todo(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: todo.title.clone(),
            status: status_label(todo.status).to_string(),
            due: todo.due_at.clone().unwrap_or_else(|| "-".to_string()),
            repeat: todo.repeat.label().to_string(),
            assignee: todo
                .assignee_id
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct InboxRow {
    id: String,
    state: String,
    message: String,
    created_at: String,
}

impl InboxRow {
    fn from_notification(notification: &Notification) -> Self {
        Self {
            id: notification.id.clone(),
            state: if notification.read { "read" } else { "unread" }.to_string(),
            message: notification.message.clone(),
            created_at: notification.created_at.clone(),
        }
    }
}

fn print_todos_plain(todos: &[Todo]) {
    let rows: Vec<TodoRow> = todos.iter().map(TodoRow::from_todo).collect();
    println!("{}", Table::new(rows));
}

fn todo_json(todo: &Todo) -> serde_json::Value {
    serde_json::json!({
        "id": todo.id,
        "title": todo.title,
        "description": todo.description,
        "status": status_label(todo.status),
        "due_at": todo.due_at,
        "repeat": todo.repeat.label(),
        "assignee_id": todo.assignee_id,
        "creator_id": todo.creator_id,
        "label_ids": todo.label_ids,
    })
}

fn print_todo(todo: &Todo, json: bool) {
    if json {
        println!("{}", todo_json(todo));
    } else {
        println!("{} | {} | {}", todo.id, todo.title, status_label(todo.status));
    }
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Tenant { tenant } => match tenant {
            TenantCommand::Add { name } => {
                let tenant = todo_api::add_tenant(&name)?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({ "id": tenant.id, "name": tenant.name })
                    );
                } else {
                    println!("Added tenant: {} ({})", tenant.name, tenant.id);
                }
            }
        },
        Command::User { user } => match user {
            UserCommand::Add {
                tenant_id,
                name,
                email,
                no_reminders,
            } => {
                let user = todo_api::add_user(&tenant_id, &name, &email, !no_reminders)?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "id": user.id,
                            "tenant_id": user.tenant_id,
                            "name": user.name,
                            "email": user.email,
                            "email_reminders": user.email_reminders,
                        })
                    );
                } else {
                    println!("Added user: {} ({})", user.name, user.id);
                }
            }
        },
        Command::Add {
            title,
            due,
            repeat,
            assignee,
            description,
        } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let repeat = parse_repeat(&repeat).map_err(AppError::invalid_input)?;
            let todo = todo_api::create_todo(
                &session,
                NewTodo {
                    title,
                    description,
                    due_at: due,
                    repeat,
                    assignee_id: assignee,
                    label_ids: Vec::new(),
                },
            )?;
            if cli.json {
                println!("{}", todo_json(&todo));
            } else {
                println!("Added todo: {} ({})", todo.title, todo.id);
            }
        }
        Command::List => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let todos = todo_api::list_todos(&session)?;
            if cli.json {
                let payload: Vec<_> = todos.iter().map(todo_json).collect();
                println!("{}", serde_json::Value::Array(payload));
            } else {
                print_todos_plain(&todos);
            }
        }
        Command::Show { id } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let todo = todo_api::get_todo(&session, &id)?;
            if cli.json {
                println!("{}", todo_json(&todo));
            } else {
                println!("{} | {} | {}", todo.id, todo.title, status_label(todo.status));
                if let Some(description) = todo.description.as_deref() {
                    println!("  {description}");
                }
                println!("  due: {}", todo.due_at.as_deref().unwrap_or("-"));
                println!("  repeat: {}", todo.repeat.label());
                println!("  assignee: {}", todo.assignee_id.as_deref().unwrap_or("-"));
            }
        }
        Command::Assign { id, assignee, clear } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let assignee = match (assignee, clear) {
                (Some(_), true) => {
                    return Err(AppError::invalid_input(
                        "give an assignee or --clear, not both",
                    ));
                }
                (None, false) => {
                    return Err(AppError::invalid_input("assignee is required (or --clear)"));
                }
                (value, _) => value,
            };
            let todo = todo_api::assign_todo(&session, &id, assignee.as_deref())?;
            if cli.json {
                println!("{}", todo_json(&todo));
            } else {
                match todo.assignee_id.as_deref() {
                    Some(assignee_id) => {
                        println!("Assigned {} to {}", todo.id, assignee_id)
                    }
                    None => println!("Cleared assignee of {}", todo.id),
                }
            }
        }
        Command::Comment { id, body } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let comment = todo_api::comment_todo(&session, &id, &body)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": comment.id,
                        "todo_id": comment.todo_id,
                        "body": comment.body,
                    })
                );
            } else {
                println!("Commented on {} ({})", comment.todo_id, comment.id);
            }
        }
        Command::Done { id } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let (completed, successor) = todo_api::complete_todo(&session, &id)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "completed": todo_json(&completed),
                        "successor": successor.as_ref().map(todo_json),
                    })
                );
            } else {
                println!("Completed todo: {} ({})", completed.title, completed.id);
                if let Some(next) = successor {
                    println!(
                        "Next occurrence: {} (due {})",
                        next.id,
                        next.due_at.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Command::Reschedule { id, due, clear } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let due = match (due, clear) {
                (Some(_), true) => {
                    return Err(AppError::invalid_input("give a due date or --clear, not both"));
                }
                (None, false) => {
                    return Err(AppError::invalid_input("due date is required (or --clear)"));
                }
                (value, _) => value,
            };
            let todo = todo_api::reschedule_todo(&session, &id, due.as_deref())?;
            if cli.json {
                println!("{}", todo_json(&todo));
            } else {
                println!(
                    "Rescheduled {} to {}",
                    todo.id,
                    todo.due_at.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Describe { id, text } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let todo = todo_api::update_description(&session, &id, text.as_deref())?;
            print_todo(&todo, cli.json);
        }
        Command::Label { label } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            match label {
                LabelCommand::Add { name } => {
                    let label = todo_api::add_label(&session, &name)?;
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::json!({ "id": label.id, "name": label.name })
                        );
                    } else {
                        println!("Added label: {} ({})", label.name, label.id);
                    }
                }
                LabelCommand::Attach { id, label_id } => {
                    let todo = todo_api::attach_label(&session, &id, &label_id)?;
                    print_todo(&todo, cli.json);
                }
                LabelCommand::Detach { id, label_id } => {
                    let todo = todo_api::detach_label(&session, &id, &label_id)?;
                    print_todo(&todo, cli.json);
                }
            }
        }
        Command::Remind => {
            let mailer = mailer_from_config()?;
            let outcome = reminders::process_reminders(mailer.as_ref())?;
            if cli.json {
                let failures: Vec<_> = outcome
                    .failures
                    .iter()
                    .map(|failure| {
                        serde_json::json!({
                            "todo_id": failure.todo_id,
                            "error": failure.error.to_string(),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "due_soon": outcome.due_soon,
                        "overdue": outcome.overdue,
                        "failures": failures,
                    })
                );
            } else {
                println!(
                    "Reminded {} due-soon and {} overdue todos",
                    outcome.due_soon, outcome.overdue
                );
                for failure in &outcome.failures {
                    eprintln!("WARN: {}: {}", failure.todo_id, failure.error);
                }
            }
        }
        Command::Inbox { limit } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let listed = notifications::list(&session, limit)?;
            let unread = notifications::unread_count(&session)?;
            if cli.json {
                let payload: Vec<_> = listed
                    .iter()
                    .map(|notification| {
                        serde_json::json!({
                            "id": notification.id,
                            "message": notification.message,
                            "todo_id": notification.todo_id,
                            "read": notification.read,
                            "created_at": notification.created_at,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({ "unread": unread, "notifications": payload })
                );
            } else {
                let rows: Vec<InboxRow> =
                    listed.iter().map(InboxRow::from_notification).collect();
                println!("{}", Table::new(rows));
                println!("{unread} unread");
            }
        }
        Command::Read { id } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let notification = notifications::mark_read(&session, &id)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "id": notification.id, "read": notification.read })
                );
            } else {
                println!("Marked read: {}", notification.id);
            }
        }
        Command::ReadAll => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let changed = notifications::mark_all_read(&session)?;
            if cli.json {
                println!("{}", serde_json::json!({ "marked_read": changed }));
            } else {
                println!("Marked {changed} notifications read");
            }
        }
        Command::Activity { id } => {
            let session = resolve_session(cli.acting_user.as_deref())?;
            let rendered = activity::rendered_feed(&session, &id)?;
            if cli.json {
                println!("{}", serde_json::json!(rendered));
            } else {
                for line in rendered {
                    println!("{line}");
                }
            }
        }
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("teamtask".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
