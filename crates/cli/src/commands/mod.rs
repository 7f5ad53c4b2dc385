pub mod doctor;
pub mod migrate;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum CommandStatus {
    Ok,
    Error,
}

/// JSON line printed by every non-doctor command.
#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied_migrations: Option<i64>,
    message: String,
}

impl CommandResult {
    /// Successful `migrate` run; `applied` counts only migrations this run applied.
    pub fn migrated(database_url: &str, applied: i64) -> Self {
        let payload = CommandOutcome {
            command: "migrate",
            status: CommandStatus::Ok,
            error_class: None,
            database_url: Some(database_url),
            applied_migrations: Some(applied),
            message: format!("applied {applied} pending migration(s) to `{database_url}`"),
        };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: CommandStatus::Error,
            error_class: Some(error_class),
            database_url: None,
            applied_migrations: None,
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }
}

fn serialize_payload(payload: &CommandOutcome<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        serde_json::json!({
            "command": payload.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}
