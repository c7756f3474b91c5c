use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of recordable activity types
///
/// The database schema carries a matching check constraint, so a write that
/// bypasses application validation is still rejected at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Logout,
    GiveRecognition,
    ReceiveRecognition,
    ProfileUpdate,
    AdminAction,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        ActivityType::Login,
        ActivityType::Logout,
        ActivityType::GiveRecognition,
        ActivityType::ReceiveRecognition,
        ActivityType::ProfileUpdate,
        ActivityType::AdminAction,
    ];

    /// String representation used for database storage and wire payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::GiveRecognition => "give_recognition",
            Self::ReceiveRecognition => "receive_recognition",
            Self::ProfileUpdate => "profile_update",
            Self::AdminAction => "admin_action",
        }
    }

    /// Parse a caller-supplied name, tolerating case and surrounding whitespace
    pub fn parse(value: &str) -> Option<ActivityType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "give_recognition" => Some(Self::GiveRecognition),
            "receive_recognition" => Some(Self::ReceiveRecognition),
            "profile_update" => Some(Self::ProfileUpdate),
            "admin_action" => Some(Self::AdminAction),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata keys that must never reach storage
pub const SENSITIVE_METADATA_KEYS: [&str; 6] =
    ["password", "token", "secret", "api_key", "credit_card", "ssn"];

/// Strip block-listed keys from an activity metadata map
///
/// Offending keys are silently removed, not rejected; every other key passes
/// through unchanged. Applying the function twice yields the same map.
pub fn sanitize_metadata(mut metadata: Map<String, Value>) -> Map<String, Value> {
    for key in SENSITIVE_METADATA_KEYS {
        metadata.remove(key);
    }
    metadata
}

/// A validated-and-enriched activity payload awaiting persistence
///
/// This is the data contract shared by the synchronous write path and the
/// deferred dispatch queue: both must produce the same stored record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub user_id: i64,
    pub company_id: i64,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Set by the pipeline; the store fills in "now" when absent and never
    /// overwrites it on later updates to the same record.
    pub occurred_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod activity_tests;
