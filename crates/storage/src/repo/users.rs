use crate::{models::SqlUser, Db};
use chrono::Utc;
use domain::UserStanding;
use sqlx::SqliteConnection;

impl Db {
    /// Records a caller the first time the token check sees them.
    pub async fn ensure_user(&self, user_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, warnings, is_active, created_at)
            VALUES (?, 0, TRUE, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_user_active(&self, user_id: &str) -> anyhow::Result<Option<bool>> {
        let active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(active)
    }

    /// Returns `false` if the user does not exist.
    pub async fn set_user_active(&self, user_id: &str, active: bool) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn get_user_standing(&self, user_id: &str) -> anyhow::Result<Option<UserStanding>> {
        let user = sqlx::query_as::<_, SqlUser>(
            "SELECT id, warnings, is_active FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let blurred_comments = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM comments
            WHERE author_id = ? AND is_blurred = TRUE
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let flagged_comments = sqlx::query_scalar::<_, String>(
            r#"
            SELECT comment_id FROM comment_flags
            WHERE user_id = ?
            ORDER BY created_at ASC, comment_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(UserStanding {
            user_id: user.id,
            warnings: user.warnings,
            is_active: user.is_active,
            blurred_comments,
            flagged_comments,
        }))
    }
}

/// Atomic `warnings += 1`, returning the new value. `None` if the user is unknown.
pub(crate) async fn bump_warnings(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> anyhow::Result<Option<i64>> {
    let warnings = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET warnings = warnings + 1 WHERE id = ? RETURNING warnings",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use crate::repo::test_support::db_with_users;

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let db = db_with_users(&["alice"]).await;
        db.ensure_user("alice").await.unwrap();

        let standing = db.get_user_standing("alice").await.unwrap().unwrap();
        assert_eq!(standing.warnings, 0);
        assert!(standing.is_active);
        assert!(standing.blurred_comments.is_empty());
        assert!(standing.flagged_comments.is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let db = db_with_users(&["bob"]).await;
        assert!(db.set_user_active("bob", false).await.unwrap());
        assert_eq!(db.is_user_active("bob").await.unwrap(), Some(false));
        assert!(db.set_user_active("bob", true).await.unwrap());
        assert_eq!(db.is_user_active("bob").await.unwrap(), Some(true));

        assert!(!db.set_user_active("ghost", false).await.unwrap());
        assert_eq!(db.is_user_active("ghost").await.unwrap(), None);
        assert!(db.get_user_standing("ghost").await.unwrap().is_none());
    }
}
