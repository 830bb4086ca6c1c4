use thiserror::Error;

/// Conditions surfaced by the moderation and messaging operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("comment already flagged by this user")]
    DuplicateFlag,

    #[error("user is already a member of this room")]
    AlreadyMember,

    #[error("user is not a member of this room")]
    NotMember,

    #[error("invalid message: {0}")]
    InvalidMessage(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Internal fault inside the slang filter. Callers decide whether to fail open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("slang dictionary lock poisoned")]
    Poisoned,
}
