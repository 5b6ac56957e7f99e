//! Environment-backed settings and the built-in source table.
//!
//! Settings are resolved once at startup and passed into the workflow
//! constructors; nothing reads the environment after this point.

use crate::models::RecordStatus;
use crate::services::MessageStyle;

pub const ENV_SPREADSHEET_ID: &str = "JOBWIRE_SPREADSHEET_ID";
pub const ENV_SHEETS_TOKEN: &str = "JOBWIRE_SHEETS_TOKEN";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    #[error("unknown source {0:?} (known: wanted, sideproject)")]
    UnknownSource(String),
}

/// One collectable source platform.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    /// Stable source identifier used on the command line.
    pub id: &'static str,
    /// Worksheet tab holding this source's rows.
    pub worksheet: &'static str,
    /// Status assigned to freshly collected rows.
    pub initial_status: RecordStatus,
    /// Payload shape for published messages.
    pub style: MessageStyle,
}

/// Built-in source table.
pub const SOURCES: &[SourceSpec] = &[
    SourceSpec {
        id: "wanted",
        worksheet: "wanted",
        initial_status: RecordStatus::New,
        style: MessageStyle::Text,
    },
    SourceSpec {
        id: "sideproject",
        worksheet: "sideproject",
        initial_status: RecordStatus::New,
        style: MessageStyle::Blocks,
    },
];

pub fn source(id: &str) -> Result<&'static SourceSpec, ConfigError> {
    SOURCES
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ConfigError::UnknownSource(id.to_string()))
}

/// Credentials for the spreadsheet backend, shared by both workflows.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub spreadsheet_id: String,
    pub token: String,
}

impl StoreSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            spreadsheet_id: require_env(ENV_SPREADSHEET_ID)?,
            token: require_env(ENV_SHEETS_TOKEN)?,
        })
    }
}

/// Publisher-side credentials.
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub openai_api_key: String,
    pub slack_webhook_url: String,
}

impl PublisherSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: require_env(ENV_OPENAI_API_KEY)?,
            slack_webhook_url: require_env(ENV_SLACK_WEBHOOK_URL)?,
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_lookup() {
        assert_eq!(source("wanted").unwrap().worksheet, "wanted");
        assert_eq!(source("sideproject").unwrap().style, MessageStyle::Blocks);
        assert!(matches!(
            source("unknown"),
            Err(ConfigError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_require_env_rejects_missing_and_blank() {
        std::env::remove_var("JOBWIRE_TEST_MISSING");
        assert!(require_env("JOBWIRE_TEST_MISSING").is_err());

        std::env::set_var("JOBWIRE_TEST_BLANK", "  ");
        assert!(require_env("JOBWIRE_TEST_BLANK").is_err());

        std::env::set_var("JOBWIRE_TEST_SET", "value");
        assert_eq!(require_env("JOBWIRE_TEST_SET").unwrap(), "value");
    }
}
