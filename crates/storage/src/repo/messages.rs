use crate::{models::SqlMessage, Db};
use chrono::NaiveDateTime;
use domain::Message;

impl Db {
    /// Persists a message. `None` if the room does not exist.
    pub async fn insert_message(
        &self,
        id: &str,
        room_id: &str,
        author_id: &str,
        text: &str,
        created_at: NaiveDateTime,
    ) -> anyhow::Result<Option<Message>> {
        let row = sqlx::query_as::<_, SqlMessage>(
            r#"
            INSERT INTO messages (id, room_id, author_id, text, created_at)
            SELECT ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM rooms WHERE id = ?)
            RETURNING seq, id, room_id, author_id, text, created_at
            "#,
        )
        .bind(id)
        .bind(room_id)
        .bind(author_id)
        .bind(text)
        .bind(created_at)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Up to `limit` messages with `seq < before`, returned oldest first.
    pub async fn list_messages(
        &self,
        room_id: &str,
        before: Option<i64>,
        limit: i64,
    ) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, SqlMessage>(
            r#"
            SELECT seq, id, room_id, author_id, text, created_at
            FROM messages
            WHERE room_id = ? AND seq < ?
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(room_id)
        .bind(before.unwrap_or(i64::MAX))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<Message> = rows.into_iter().map(Into::into).collect();
        messages.reverse();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use crate::repo::test_support::db_with_users;
    use chrono::Utc;
    use domain::Room;

    #[tokio::test]
    async fn test_history_pages_oldest_first() {
        let db = db_with_users(&["alice"]).await;
        let now = Utc::now().naive_utc();
        db.create_room(&Room {
            id: "r1".into(),
            name: "general".into(),
            description: String::new(),
            admin_id: "alice".into(),
            members: vec!["alice".into()],
            created_at: now,
        })
        .await
        .unwrap();

        for i in 0..5 {
            let id = uuid::Uuid::new_v4().to_string();
            db.insert_message(&id, "r1", "alice", &format!("m{}", i), now)
                .await
                .unwrap()
                .expect("room exists");
        }

        let latest = db.list_messages("r1", None, 2).await.unwrap();
        let texts: Vec<_> = latest.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m3", "m4"]);

        let older = db.list_messages("r1", Some(latest[0].seq), 10).await.unwrap();
        let texts: Vec<_> = older.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m0", "m1", "m2"]);
    }

    #[tokio::test]
    async fn test_message_to_missing_room_is_not_stored() {
        let db = db_with_users(&["alice"]).await;
        let stored = db
            .insert_message("m1", "nope", "alice", "hi", Utc::now().naive_utc())
            .await
            .unwrap();
        assert!(stored.is_none());
        assert!(db.list_messages("nope", None, 10).await.unwrap().is_empty());
    }
}
