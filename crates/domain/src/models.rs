use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlogId(String);

impl BlogId {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Blog ID cannot be empty.".to_string());
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err("Blog ID contains invalid characters.".to_string());
        }
        if s.len() > 64 {
            return Err("Blog ID is too long (max 64 chars).".to_string());
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `is_blurred` is decided once, when the comment is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub count: i64,
    pub is_blurred: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub blog_id: BlogId,
    pub author_id: String,
    pub content: String,
    pub flags: Flags,
    pub is_hidden: bool,
    pub created_at: NaiveDateTime,
}

/// Moderation view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStanding {
    pub user_id: String,
    pub warnings: i64,
    pub is_active: bool,
    /// Comments this user wrote that the slang filter blurred.
    pub blurred_comments: Vec<String>,
    /// Comments this user has flagged.
    pub flagged_comments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    pub admin_id: String,
    pub members: Vec<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Insertion sequence; also the paging cursor for history.
    pub seq: i64,
    pub room_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Oldest first.
    pub messages: Vec<Message>,
    /// Pass as `before` to fetch the preceding page.
    pub next_cursor: Option<i64>,
}
