//! API entity types.
//!
//! Accounts and statuses are read-only snapshots deserialized straight from
//! the wire; they are never mutated after construction and carry no identity
//! beyond their id.

use serde::{Deserialize, Serialize};

use crate::ratelimit::QuotaStatus;

/// A decoded API response together with the quota the service reported
/// alongside it.
///
/// The quota is read exactly once by [`crate::RequestExecutor`] and then
/// discarded; it is never cached across calls.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// The decoded payload.
    pub data: T,

    /// Quota status for the window this call was counted against, when the
    /// service reported one.
    pub quota: Option<QuotaStatus>,
}

/// An account snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: u64,

    /// Handle, without the leading `@`
    pub screen_name: String,

    /// Number of accounts following this one
    #[serde(default)]
    pub followers_count: u32,

    /// Number of accounts this one follows
    #[serde(default)]
    pub friends_count: u32,

    /// Whether the account's statuses are restricted to approved followers
    #[serde(default)]
    pub protected: bool,

    /// Profile description
    #[serde(default)]
    pub description: Option<String>,

    /// The account's most recent status, when the service includes one
    #[serde(default, rename = "status")]
    pub most_recent_status: Option<Box<Status>>,
}

/// A status (post) snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Status ID
    pub id: u64,

    /// Text content
    #[serde(default)]
    pub text: String,

    /// ID of the status this replies to; absent or `-1` means not a reply
    #[serde(default)]
    pub in_reply_to_status_id: Option<i64>,

    /// Author, when expanded by the service
    #[serde(default)]
    pub user: Option<StatusAuthor>,

    /// Entities (mentions etc.)
    #[serde(default)]
    pub entities: Option<Entities>,
}

impl Status {
    /// Whether this status is a reply to another status.
    ///
    /// The wire format uses both an absent field and the sentinel `-1` for
    /// "not a reply"; negative IDs are treated as absent.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        matches!(self.in_reply_to_status_id, Some(id) if id >= 0)
    }

    /// The author's handle, when the service expanded the author.
    #[must_use]
    pub fn author_screen_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.screen_name.as_str())
    }

    /// Handles mentioned in the status text.
    pub fn mentioned_screen_names(&self) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .flat_map(|e| e.user_mentions.iter())
            .map(|m| m.screen_name.as_str())
    }
}

/// Expanded status author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusAuthor {
    /// Handle, without the leading `@`
    pub screen_name: String,
}

/// Status entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    /// Mentioned accounts
    #[serde(default)]
    pub user_mentions: Vec<UserMention>,
}

/// A mention inside a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMention {
    /// Mentioned handle
    pub screen_name: String,
}

/// One page of account IDs from a cursored listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdPage {
    /// The IDs in this page
    #[serde(default)]
    pub ids: Vec<u64>,

    /// Cursor for the next page; `0` means no further pages
    #[serde(default)]
    pub next_cursor: i64,
}
