//! Record model and lifecycle status.
//!
//! A Record is one listing row tracked through collection and publication.
//! Status only moves forward: a row starts as `new` or `archived` and ends in
//! exactly one of `published`, `dropped`, or `failed`, after which it is
//! permanently excluded from publisher passes.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    New,
    Archived,
    Published,
    Dropped,
    Failed,
}

/// Error returned when a status cell does not hold a recognized label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized status label: {0:?}")]
pub struct ParseStatusError(pub String);

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Archived => "archived",
            Self::Published => "published",
            Self::Dropped => "dropped",
            Self::Failed => "failed",
        }
    }

    /// Parse a status cell, normalizing case and surrounding whitespace.
    ///
    /// Unrecognized labels are an explicit error rather than a silent
    /// non-match, so callers can log rows holding garbage.
    pub fn parse(s: &str) -> Result<Self, ParseStatusError> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "archived" => Ok(Self::Archived),
            "published" => Ok(Self::Published),
            "dropped" => Ok(Self::Dropped),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Dropped | Self::Failed)
    }

    /// Total transition predicate: `new`/`archived` may move to any terminal
    /// state; nothing moves backward or out of a terminal state.
    pub fn can_transition_to(&self, next: RecordStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check the `publish` opt-in flag: truthy iff the trimmed cell equals
/// `TRUE` case-insensitively (how the sheet's checkbox column renders).
pub fn publish_flag_set(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("true")
}

/// One listing row tracked through collection and publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Human-readable label, non-empty when valid.
    pub title: String,
    /// Canonical identifier; natural (non-enforced) dedup key.
    pub url: String,
    /// Company or origin, present only for some sources.
    pub company: Option<String>,
    /// Region info, present only for some sources.
    pub location: Option<String>,
    /// Required experience, present only for some sources.
    pub experience: Option<String>,
    /// Creation date (`%Y-%m-%d`), set once at insertion, never mutated.
    pub scraped_at: String,
    /// Lifecycle state.
    pub status: RecordStatus,
}

impl Record {
    /// Value of a field by column name, empty string for unset optionals.
    /// Returns `None` for names this model does not carry, so unknown sheet
    /// columns stay blank on append.
    pub fn field(&self, column: &str) -> Option<String> {
        match column {
            "title" => Some(self.title.clone()),
            "url" => Some(self.url.clone()),
            "company" => Some(self.company.clone().unwrap_or_default()),
            "location" => Some(self.location.clone().unwrap_or_default()),
            "experience" => Some(self.experience.clone().unwrap_or_default()),
            "scraped_at" => Some(self.scraped_at.clone()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        assert_eq!(RecordStatus::parse(" archived "), Ok(RecordStatus::Archived));
        assert_eq!(RecordStatus::parse("Published"), Ok(RecordStatus::Published));
        assert_eq!(RecordStatus::parse("NEW"), Ok(RecordStatus::New));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RecordStatus::parse("archvied").is_err());
        assert!(RecordStatus::parse("").is_err());
    }

    #[test]
    fn test_transitions_only_move_forward() {
        assert!(RecordStatus::New.can_transition_to(RecordStatus::Published));
        assert!(RecordStatus::Archived.can_transition_to(RecordStatus::Dropped));
        assert!(RecordStatus::Archived.can_transition_to(RecordStatus::Failed));
        assert!(!RecordStatus::Published.can_transition_to(RecordStatus::Failed));
        assert!(!RecordStatus::Dropped.can_transition_to(RecordStatus::Published));
        assert!(!RecordStatus::New.can_transition_to(RecordStatus::Archived));
    }

    #[test]
    fn test_publish_flag() {
        assert!(publish_flag_set("TRUE"));
        assert!(publish_flag_set(" true "));
        assert!(!publish_flag_set("FALSE"));
        assert!(!publish_flag_set(""));
        assert!(!publish_flag_set("yes"));
    }

    #[test]
    fn test_field_lookup() {
        let record = Record {
            title: "Backend Engineer".to_string(),
            url: "https://www.wanted.co.kr/wd/12345".to_string(),
            company: Some("Acme".to_string()),
            location: None,
            experience: None,
            scraped_at: "2026-08-23".to_string(),
            status: RecordStatus::New,
        };
        assert_eq!(record.field("company").as_deref(), Some("Acme"));
        assert_eq!(record.field("location").as_deref(), Some(""));
        assert_eq!(record.field("status").as_deref(), Some("new"));
        assert_eq!(record.field("publish"), None);
    }
}
