//! Chat message model shared by the store, the controller and the UIs.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in the conversation thread.
///
/// Serialized with camelCase keys (`isUser`) and an ISO-8601 millisecond
/// timestamp, which is also the on-disk shape of the persisted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub is_user: bool,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Message typed by the user. Returns `None` when the text is blank.
    pub fn user(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self::build(text, true))
    }

    /// Message authored by the bot (replies, errors, greetings).
    pub fn bot(text: &str) -> Self {
        Self::build(text.trim(), false)
    }

    fn build(text: &str, is_user: bool) -> Self {
        Self {
            id: new_message_id(),
            text: text.to_string(),
            is_user,
            timestamp: now_millis(),
        }
    }
}

/// Random rendering key for a message.
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current instant truncated to the precision the store keeps.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `DateTime<Utc>` <-> `"2024-05-01T12:30:00.123Z"`
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
