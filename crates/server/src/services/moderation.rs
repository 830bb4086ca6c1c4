use adapter::NotificationQueue;
use anyhow::Context;
use chrono::Utc;
use domain::{
    normalize_word, parse_word_list, BlogId, Comment, CoreError, FilterError, Filtered, Flags,
    NotifyCommand, SlangFilter, UserStanding,
};
use std::path::Path;
use std::sync::Arc;
use storage::{Db, FlagOutcome, HideOutcome, InsertCommentOutcome};
use tracing::{info, warn};

use super::ensure_active;

const MAX_COMMENT_CHARS: usize = 10_000;

/// Comment intake, flagging, hiding and warning escalation.
#[derive(Clone)]
pub struct Moderation {
    db: Db,
    filter: Arc<SlangFilter>,
    notifier: NotificationQueue,
    escalation_interval: i64,
}

impl Moderation {
    pub fn new(
        db: Db,
        filter: Arc<SlangFilter>,
        notifier: NotificationQueue,
        escalation_interval: i64,
    ) -> Self {
        Self {
            db,
            filter,
            notifier,
            escalation_interval: escalation_interval.max(1),
        }
    }

    /// Loads the persisted dictionary, seeding it from `seed_path` when the
    /// store is empty. Returns the number of words now active.
    pub async fn load_dictionary(&self, seed_path: Option<&Path>) -> anyhow::Result<usize> {
        let mut words = self.db.load_slang_words().await?;

        if words.is_empty() {
            if let Some(path) = seed_path {
                if path.exists() {
                    let raw = tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("Failed to read word list {}", path.display()))?;
                    let seeded = parse_word_list(&raw);
                    let added = self.db.seed_slang_words(&seeded).await?;
                    info!("Seeded {} slang words from {}", added, path.display());
                    words = self.db.load_slang_words().await?;
                } else {
                    warn!("Slang word list {} not found, starting empty", path.display());
                }
            }
        }

        self.filter.configure(&words)?;
        Ok(words.len())
    }

    pub async fn submit_comment(
        &self,
        author_id: &str,
        blog_id: BlogId,
        text: &str,
    ) -> Result<Comment, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::InvalidInput("Comment cannot be empty"));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(CoreError::InvalidInput("Comment is too long"));
        }
        ensure_active(&self.db, author_id).await?;

        let filtered = fail_open(text, self.filter.filter(text));
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            blog_id,
            author_id: author_id.to_string(),
            content: filtered.text,
            flags: Flags {
                count: 0,
                is_blurred: filtered.is_blurred,
            },
            is_hidden: false,
            created_at: Utc::now().naive_utc(),
        };

        match self.db.insert_comment(&comment).await? {
            InsertCommentOutcome::AuthorNotFound => Err(CoreError::not_found("user", author_id)),
            InsertCommentOutcome::Stored { author_warnings } => {
                info!(
                    comment_id = %comment.id,
                    blog_id = %comment.blog_id,
                    blurred = comment.flags.is_blurred,
                    "Comment stored"
                );
                if let Some(warnings) = author_warnings {
                    self.on_warning(author_id, warnings);
                }
                Ok(comment)
            }
        }
    }

    /// Returns the comment's flag count after this flag.
    pub async fn flag_comment(&self, user_id: &str, comment_id: &str) -> Result<i64, CoreError> {
        ensure_active(&self.db, user_id).await?;

        match self
            .db
            .flag_comment(comment_id, user_id, self.escalation_interval)
            .await?
        {
            FlagOutcome::Flagged {
                flag_count,
                author_id,
                author_warnings,
            } => {
                info!(comment_id, flagged_by = user_id, flag_count, "Comment flagged");
                if let Some(warnings) = author_warnings {
                    self.on_warning(&author_id, warnings);
                }
                Ok(flag_count)
            }
            FlagOutcome::Duplicate => {
                warn!(comment_id, flagged_by = user_id, "Duplicate flag rejected");
                Err(CoreError::DuplicateFlag)
            }
            FlagOutcome::CommentNotFound => Err(CoreError::not_found("comment", comment_id)),
            FlagOutcome::UserNotFound => Err(CoreError::not_found("user", user_id)),
        }
    }

    /// Returns `true` if the comment was already hidden.
    pub async fn hide_comment(&self, comment_id: &str) -> Result<bool, CoreError> {
        match self.db.hide_comment(comment_id).await? {
            HideOutcome::Hidden => {
                info!(comment_id, "Comment hidden");
                Ok(false)
            }
            HideOutcome::AlreadyHidden => Ok(true),
            HideOutcome::NotFound => Err(CoreError::not_found("comment", comment_id)),
        }
    }

    pub async fn list_comments(
        &self,
        blog_id: &BlogId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), CoreError> {
        Ok(self
            .db
            .list_comments(blog_id.as_str(), limit.clamp(1, 200), offset.max(0))
            .await?)
    }

    pub fn slang_words(&self) -> Result<Vec<String>, CoreError> {
        self.filter.words().map_err(filter_fault)
    }

    /// Persists first, then swaps the in-memory dictionary.
    pub async fn add_slang_word(&self, raw: &str) -> Result<bool, CoreError> {
        let word = normalize_word(raw).ok_or(CoreError::InvalidInput("Not a single word"))?;
        let added = self.db.add_slang_word(&word).await?;
        self.filter.add_word(&word).map_err(filter_fault)?;
        if added {
            info!(word = %word, "Slang word added");
        }
        Ok(added)
    }

    pub async fn remove_slang_word(&self, raw: &str) -> Result<bool, CoreError> {
        let word = normalize_word(raw).ok_or(CoreError::InvalidInput("Not a single word"))?;
        let removed = self.db.remove_slang_word(&word).await?;
        self.filter.remove_word(&word).map_err(filter_fault)?;
        if removed {
            info!(word = %word, "Slang word removed");
        }
        Ok(removed)
    }

    pub async fn user_standing(&self, user_id: &str) -> Result<UserStanding, CoreError> {
        self.db
            .get_user_standing(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", user_id))
    }

    pub async fn set_user_active(&self, user_id: &str, active: bool) -> Result<(), CoreError> {
        if !self.db.set_user_active(user_id, active).await? {
            return Err(CoreError::not_found("user", user_id));
        }
        info!(user_id, active, "Account status changed");
        Ok(())
    }

    // Every warning notifies the user; every interval-th one also goes to admins.
    fn on_warning(&self, user_id: &str, warnings: i64) {
        info!(user_id, warnings, "Warning issued");
        self.notifier.dispatch(NotifyCommand::CommentRemoval {
            user_id: user_id.to_string(),
        });
        if warnings > 0 && warnings % self.escalation_interval == 0 {
            warn!(user_id, warnings, "Warning threshold crossed, escalating");
            self.notifier.dispatch(NotifyCommand::AccountReview {
                user_id: user_id.to_string(),
                warnings,
            });
        }
    }
}

/// Filtering faults must not block commenting: fall back to the raw text.
fn fail_open(text: &str, result: Result<Filtered, FilterError>) -> Filtered {
    match result {
        Ok(filtered) => filtered,
        Err(e) => {
            warn!("Slang filter failed, storing unfiltered text: {}", e);
            Filtered {
                text: text.to_string(),
                is_blurred: false,
            }
        }
    }
}

fn filter_fault(e: FilterError) -> CoreError {
    CoreError::Store(anyhow::Error::new(e))
}
