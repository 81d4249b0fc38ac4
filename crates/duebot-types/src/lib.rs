//! duebot-types: shared data model for the deadline tracker.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How a deadline repeats. Only weekly repetition is supported; absent
/// means one-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Weekly,
}

impl Recurrence {
    /// Parse a user-supplied recurrence token, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("weekly") {
            Some(Recurrence::Weekly)
        } else {
            None
        }
    }

    /// Storage/display token for this recurrence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Weekly => "weekly",
        }
    }
}

/// A stored deadline row.
///
/// The start and due anchors are naive local times. For weekly records the
/// due anchor's weekday and time-of-day are the recurrence template;
/// concrete occurrences are always recomputed from the anchors, never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineRecord {
    /// Unique identifier, assigned by the store.
    pub id: i64,
    /// Deadline name (e.g. "Problem set 4").
    pub name: String,
    /// Class/category label the deadline belongs to.
    pub class_name: String,
    /// Start anchor.
    pub start: NaiveDateTime,
    /// Due anchor.
    pub due: NaiveDateTime,
    /// Optional link to the assignment page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Optional recurrence mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
}

/// Insert payload for a new deadline; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeadline {
    pub name: String,
    pub class_name: String,
    pub start: NaiveDateTime,
    pub due: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
}
