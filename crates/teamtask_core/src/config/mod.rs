use crate::error::AppError;
use crate::storage::json_store::Workspace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TEAMTASK_CONFIG_PATH";
const USER_ENV_VAR: &str = "TEAMTASK_USER";

/// Resolved caller identity. Every caller-scoped engine operation trusts
/// this pair and checks referenced entities against `tenant_id` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub tenant_id: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Acting user when neither `--as` nor TEAMTASK_USER is given.
    #[serde(default)]
    pub default_user: Option<String>,
    #[serde(default)]
    pub mail_spool: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("teamtask")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("teamtask")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config(path: &Path) -> Result<Config, AppError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Pick the acting user id: explicit override, then TEAMTASK_USER, then
/// the configured default.
pub fn acting_user(override_id: Option<&str>, config: &Config) -> Result<String, AppError> {
    if let Some(id) = override_id {
        let trimmed = id.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    if let Ok(id) = std::env::var(USER_ENV_VAR)
        && !id.trim().is_empty()
    {
        return Ok(id.trim().to_string());
    }

    config
        .default_user
        .clone()
        .ok_or_else(|| AppError::invalid_input("no acting user (use --as or set default_user)"))
}

/// Look the acting user up in the store and derive the tenant scope from
/// their membership.
pub fn resolve_session(workspace: &Workspace, user_id: &str) -> Result<Session, AppError> {
    let user = workspace
        .user(user_id)
        .ok_or_else(|| AppError::not_found("user not found"))?;
    Ok(Session {
        user_id: user.id.clone(),
        tenant_id: user.tenant_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::{Config, Session, acting_user, load_config, resolve_session};
    use crate::model::User;
    use crate::storage::json_store::Workspace;
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
    fn missing_config_file_falls_back_to_default() {
        let path = temp_path("missing-config.json");
        let config = load_config(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_reads_fields() {
        let path = temp_path("config.json");
        std::fs::write(
            &path,
            "{\n  \"default_user\": \"user-1\",\n  \"mail_spool\": \"/tmp/outbox.jsonl\"\n}",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.default_user.as_deref(), Some("user-1"));
        assert_eq!(config.mail_spool.as_deref(), Some("/tmp/outbox.jsonl"));
    }

    #[test]
    fn acting_user_prefers_explicit_override() {
        let config = Config {
            default_user: Some("user-config".to_string()),
            mail_spool: None,
        };
        assert_eq!(acting_user(Some("user-cli"), &config).unwrap(), "user-cli");
    }

    #[test]
    fn acting_user_requires_some_source() {
        let err = acting_user(None, &Config::default()).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn resolve_session_derives_tenant_from_membership() {
        let workspace = Workspace {
            users: vec![User {
                id: "user-1".to_string(),
                tenant_id: "tenant-1".to_string(),
                name: "ada".to_string(),
                email: "ada@acme.test".to_string(),
                email_reminders: true,
            }],
            ..Workspace::default()
        };

        let session = resolve_session(&workspace, "user-1").unwrap();
        assert_eq!(
            session,
            Session {
                user_id: "user-1".to_string(),
                tenant_id: "tenant-1".to_string(),
            }
        );
    }

    #[test]
    fn resolve_session_rejects_unknown_user() {
        let err = resolve_session(&Workspace::default(), "user-9").unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}
