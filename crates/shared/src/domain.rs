use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(pub String);

impl BotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Last known state of a remote bot agent.
///
/// Replaced wholesale by every poll outcome. A failed poll keeps the
/// remote-reported identifiers of the previous status and only flips
/// `is_ready` / `last_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStatus {
    pub is_ready: bool,
    pub is_authenticated: bool,
    pub remote_display_name: Option<String>,
    pub last_error: Option<String>,
    pub has_friend_token: bool,
    pub device_id: Option<String>,
    pub account_id: Option<String>,
    pub expires_at: Option<String>,
}

impl BotStatus {
    pub fn is_operational(&self) -> bool {
        self.is_ready && self.is_authenticated
    }

    /// Session expiry as a timestamp, when the remote sent RFC 3339.
    pub fn expires_at_parsed(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Display-only check; nothing else consults the expiry.
    pub fn session_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_parsed().is_some_and(|expires| expires <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRecord {
    pub id: BotId,
    pub display_name: String,
    pub status: BotStatus,
}

impl BotRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: BotId::new(id),
            display_name: display_name.into(),
            status: BotStatus::default(),
        }
    }
}
