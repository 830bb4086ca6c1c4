use crate::{models::SqlComment, repo::users::bump_warnings, Db};
use chrono::Utc;
use domain::Comment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertCommentOutcome {
    /// `author_warnings` is the author's new warning count when the comment was blurred.
    Stored { author_warnings: Option<i64> },
    AuthorNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagOutcome {
    Flagged {
        flag_count: i64,
        author_id: String,
        /// Set when this flag crossed an escalation boundary.
        author_warnings: Option<i64>,
    },
    Duplicate,
    CommentNotFound,
    UserNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden,
    AlreadyHidden,
    NotFound,
}

const COMMENT_COLUMNS: &str =
    "id, blog_id, author_id, content, flag_count, is_blurred, is_hidden, created_at";

impl Db {
    /// Writes the comment and, if it was blurred, the author's warning in one transaction.
    pub async fn insert_comment(&self, c: &Comment) -> anyhow::Result<InsertCommentOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO comments (
                id, blog_id, author_id, content,
                flag_count, is_blurred, is_hidden, created_at
            )
            SELECT ?, ?, ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE id = ?)
            "#,
        )
        .bind(&c.id)
        .bind(c.blog_id.as_str())
        .bind(&c.author_id)
        .bind(&c.content)
        .bind(c.flags.count)
        .bind(c.flags.is_blurred)
        .bind(c.is_hidden)
        .bind(c.created_at)
        .bind(&c.author_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Ok(InsertCommentOutcome::AuthorNotFound);
        }

        let author_warnings = if c.flags.is_blurred {
            bump_warnings(&mut *tx, &c.author_id).await?
        } else {
            None
        };

        tx.commit().await?;
        Ok(InsertCommentOutcome::Stored { author_warnings })
    }

    pub async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Visible comments for a blog, oldest first, plus the visible total.
    pub async fn list_comments(
        &self,
        blog_id: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Comment>, i64)> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE blog_id = ? AND is_hidden = FALSE
            ORDER BY created_at ASC, id ASC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(blog_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE blog_id = ? AND is_hidden = FALSE",
        )
        .bind(blog_id)
        .fetch_one(&self.pool)
        .await?;

        let comments = rows.into_iter().map(Into::into).collect();
        Ok((comments, count))
    }

    /// Records one flag from `user_id` and bumps the counter. Every
    /// `escalation_interval`-th flag also warns the comment's author.
    pub async fn flag_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        escalation_interval: i64,
    ) -> anyhow::Result<FlagOutcome> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction takes the write lock up front.
        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO comment_flags (comment_id, user_id, created_at)
            SELECT ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM comments WHERE id = ?)
              AND EXISTS (SELECT 1 FROM users WHERE id = ?)
            "#,
        )
        .bind(comment_id)
        .bind(user_id)
        .bind(Utc::now().naive_utc())
        .bind(comment_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            let comment_exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE id = ?")
                    .bind(comment_id)
                    .fetch_one(&mut *tx)
                    .await?
                    > 0;
            if !comment_exists {
                return Ok(FlagOutcome::CommentNotFound);
            }
            let user_exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?
                    > 0;
            if !user_exists {
                return Ok(FlagOutcome::UserNotFound);
            }
            return Ok(FlagOutcome::Duplicate);
        }

        let (flag_count, author_id) = sqlx::query_as::<_, (i64, String)>(
            r#"
            UPDATE comments SET flag_count = flag_count + 1
            WHERE id = ?
            RETURNING flag_count, author_id
            "#,
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        let author_warnings = if escalation_interval > 0 && flag_count % escalation_interval == 0 {
            bump_warnings(&mut *tx, &author_id).await?
        } else {
            None
        };

        tx.commit().await?;
        Ok(FlagOutcome::Flagged {
            flag_count,
            author_id,
            author_warnings,
        })
    }

    pub async fn hide_comment(&self, comment_id: &str) -> anyhow::Result<HideOutcome> {
        let res = sqlx::query(
            "UPDATE comments SET is_hidden = TRUE WHERE id = ? AND is_hidden = FALSE",
        )
        .bind(comment_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 1 {
            return Ok(HideOutcome::Hidden);
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await?
            > 0;
        Ok(if exists {
            HideOutcome::AlreadyHidden
        } else {
            HideOutcome::NotFound
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::test_support::db_with_users;
    use domain::{BlogId, Flags};

    fn comment(id: &str, author: &str, blurred: bool) -> Comment {
        Comment {
            id: id.to_string(),
            blog_id: BlogId::new_unchecked("blog-1".into()),
            author_id: author.to_string(),
            content: "hello".into(),
            flags: Flags {
                count: 0,
                is_blurred: blurred,
            },
            is_hidden: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_blurred_comment_warns_author_in_same_write() {
        let db = db_with_users(&["alice"]).await;

        let clean = db.insert_comment(&comment("c1", "alice", false)).await.unwrap();
        assert_eq!(clean, InsertCommentOutcome::Stored { author_warnings: None });

        let dirty = db.insert_comment(&comment("c2", "alice", true)).await.unwrap();
        assert_eq!(dirty, InsertCommentOutcome::Stored { author_warnings: Some(1) });

        let standing = db.get_user_standing("alice").await.unwrap().unwrap();
        assert_eq!(standing.warnings, 1);
        assert_eq!(standing.blurred_comments, vec!["c2".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_author_leaves_nothing_behind() {
        let db = db_with_users(&[]).await;
        let out = db.insert_comment(&comment("c1", "ghost", true)).await.unwrap();
        assert_eq!(out, InsertCommentOutcome::AuthorNotFound);
        assert!(db.get_comment("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_flag_is_rejected_without_change() {
        let db = db_with_users(&["author", "bob"]).await;
        db.insert_comment(&comment("c1", "author", false)).await.unwrap();

        let first = db.flag_comment("c1", "bob", 3).await.unwrap();
        assert_eq!(
            first,
            FlagOutcome::Flagged {
                flag_count: 1,
                author_id: "author".into(),
                author_warnings: None
            }
        );
        assert_eq!(db.flag_comment("c1", "bob", 3).await.unwrap(), FlagOutcome::Duplicate);

        let c = db.get_comment("c1").await.unwrap().unwrap();
        assert_eq!(c.flags.count, 1);
        let bob = db.get_user_standing("bob").await.unwrap().unwrap();
        assert_eq!(bob.flagged_comments, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_flag_missing_records() {
        let db = db_with_users(&["bob"]).await;
        assert_eq!(
            db.flag_comment("nope", "bob", 3).await.unwrap(),
            FlagOutcome::CommentNotFound
        );

        db.insert_comment(&comment("c1", "bob", false)).await.unwrap();
        assert_eq!(
            db.flag_comment("c1", "ghost", 3).await.unwrap(),
            FlagOutcome::UserNotFound
        );
        assert_eq!(db.get_comment("c1").await.unwrap().unwrap().flags.count, 0);
    }

    #[tokio::test]
    async fn test_every_third_flag_warns_author() {
        let flaggers = ["f1", "f2", "f3", "f4", "f5", "f6"];
        let mut users = vec!["author"];
        users.extend(flaggers);
        let db = db_with_users(&users).await;
        db.insert_comment(&comment("c1", "author", false)).await.unwrap();

        let mut warnings = Vec::new();
        for f in flaggers {
            match db.flag_comment("c1", f, 3).await.unwrap() {
                FlagOutcome::Flagged { author_warnings, .. } => warnings.push(author_warnings),
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(warnings, vec![None, None, Some(1), None, None, Some(2)]);
        assert_eq!(db.get_user_standing("author").await.unwrap().unwrap().warnings, 2);
        assert_eq!(db.get_comment("c1").await.unwrap().unwrap().flags.count, 6);
    }

    #[tokio::test]
    async fn test_hide_is_idempotent_and_filters_listing() {
        let db = db_with_users(&["alice"]).await;
        db.insert_comment(&comment("c1", "alice", false)).await.unwrap();
        db.insert_comment(&comment("c2", "alice", false)).await.unwrap();

        assert_eq!(db.hide_comment("c1").await.unwrap(), HideOutcome::Hidden);
        assert_eq!(db.hide_comment("c1").await.unwrap(), HideOutcome::AlreadyHidden);
        assert_eq!(db.hide_comment("zz").await.unwrap(), HideOutcome::NotFound);
        assert!(db.get_comment("c1").await.unwrap().unwrap().is_hidden);

        let (visible, total) = db.list_comments("blog-1", 50, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "c2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_flags_on_file_db_lose_no_updates() {
        const FLAGGERS: usize = 30;
        let path = std::env::temp_dir().join(format!("parley-flags-{}.db", uuid::Uuid::new_v4()));
        let db = Db::new(&format!("sqlite://{}", path.display())).await.unwrap();

        db.ensure_user("author").await.unwrap();
        for i in 0..FLAGGERS {
            db.ensure_user(&format!("u{}", i)).await.unwrap();
        }
        db.insert_comment(&comment("c1", "author", false)).await.unwrap();

        let tasks: Vec<_> = (0..FLAGGERS)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { db.flag_comment("c1", &format!("u{}", i), 3).await })
            })
            .collect();
        for task in tasks {
            let outcome = task.await.unwrap().unwrap();
            assert!(matches!(outcome, FlagOutcome::Flagged { .. }));
        }

        let stored = db.get_comment("c1").await.unwrap().unwrap();
        assert_eq!(stored.flags.count, FLAGGERS as i64);
        let standing = db.get_user_standing("author").await.unwrap().unwrap();
        assert_eq!(standing.warnings, (FLAGGERS / 3) as i64);

        db.pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
