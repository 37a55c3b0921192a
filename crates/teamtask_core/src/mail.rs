use crate::error::AppError;
use crate::stamp;
use std::io::Write;
use std::path::PathBuf;

const SPOOL_FILE_NAME: &str = "outbox.jsonl";

/// Outbound email, by contract only. The reminder scan treats any `Err`
/// as "not sent": the reminded-at flag stays unset and the todo is
/// retried on the next tick.
pub trait Mailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

pub struct NoopMailer;

impl Mailer for NoopMailer {
    fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Appends one JSON line per message to a spool file; a delivery daemon
/// (or a test) drains it.
pub struct SpoolMailer {
    path: PathBuf,
}

impl SpoolMailer {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Mailer for SpoolMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        let line = serde_json::json!({
            "to": to,
            "subject": subject,
            "body": body,
            "sent_at": stamp::now_rfc3339()?,
        });
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| AppError::io(err.to_string()))?;
        writeln!(file, "{line}").map_err(|err| AppError::io(err.to_string()))?;

        Ok(())
    }
}

pub fn mailer_from_env() -> Result<Box<dyn Mailer>, AppError> {
    if std::env::var("TEAMTASK_DISABLE_MAIL").is_ok() {
        return Ok(Box::new(NoopMailer));
    }

    if let Ok(path) = std::env::var("TEAMTASK_MAIL_SPOOL")
        && !path.trim().is_empty()
    {
        return Ok(Box::new(SpoolMailer::new(path)));
    }

    Ok(Box::new(SpoolMailer::new(default_spool_path()?)))
}

fn default_spool_path() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("teamtask")
            .join(SPOOL_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("teamtask")
            .join(SPOOL_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::{Mailer, SpoolMailer};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("teamtask-{nanos}-{file_name}"))
    }

    #[test]
    fn spool_mailer_appends_one_line_per_message() {
        let path = temp_path("outbox.jsonl");
        let mailer = SpoolMailer::new(&path);

        mailer.send("ada@acme.test", "first", "body one").unwrap();
        mailer.send("bob@acme.test", "second", "body two").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["to"], "ada@acme.test");
        assert_eq!(first["subject"], "first");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["body"], "body two");
    }
}
