use crate::Db;
use chrono::Utc;

impl Db {
    /// Persisted dictionary in insertion order.
    pub async fn load_slang_words(&self) -> anyhow::Result<Vec<String>> {
        let words =
            sqlx::query_scalar::<_, String>("SELECT word FROM slang_words ORDER BY rowid ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(words)
    }

    /// Returns `true` if the word was new.
    pub async fn add_slang_word(&self, word: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("INSERT OR IGNORE INTO slang_words (word, added_at) VALUES (?, ?)")
            .bind(word)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Returns `true` if the word existed.
    pub async fn remove_slang_word(&self, word: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM slang_words WHERE word = ?")
            .bind(word)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Bulk insert used to seed an empty dictionary at startup.
    pub async fn seed_slang_words(&self, words: &[String]) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().naive_utc();
        let mut added = 0;
        for w in words {
            added += sqlx::query("INSERT OR IGNORE INTO slang_words (word, added_at) VALUES (?, ?)")
                .bind(w)
                .bind(now)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(added)
    }
}
