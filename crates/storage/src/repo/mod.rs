pub mod comments;
pub mod messages;
pub mod rooms;
pub mod slang;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::Db;

    pub async fn db_with_users(users: &[&str]) -> Db {
        let db = Db::connect_in_memory().await.expect("in-memory db");
        for u in users {
            db.ensure_user(u).await.expect("seed user");
        }
        db
    }
}
