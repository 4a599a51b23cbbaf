use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::error::AppError;

/// Maximum warble length, matching the 140-character column bound of the
/// original schema.
pub const MAX_TEXT_LEN: usize = 140;

/// A warble. Owned by exactly one user; immutable once created.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub user_id: i64,
}

impl Message {
    /// Validates the text, then inserts. An unknown `user_id` is rejected by
    /// the foreign key and comes back as `AppError::Integrity`.
    pub async fn create(db: &SqlitePool, user_id: i64, text: &str) -> Result<Message, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("warble text must not be empty"));
        }
        if text.chars().count() > MAX_TEXT_LEN {
            return Err(AppError::validation(format!(
                "warble text must be at most {MAX_TEXT_LEN} characters"
            )));
        }

        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (text, created_at, user_id) VALUES (?, ?, ?) \
             RETURNING id, text, created_at, user_id",
        )
        .bind(text)
        .bind(OffsetDateTime::now_utc())
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(message)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>(
            "SELECT id, text, created_at, user_id FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(message)
    }

    /// A user's warbles, newest first.
    pub async fn for_user(db: &SqlitePool, user_id: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, text, created_at, user_id FROM messages \
             WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(messages)
    }

    /// Recent warbles by `user_id` and everyone they follow, newest first.
    pub async fn timeline(
        db: &SqlitePool,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.text, m.created_at, m.user_id
            FROM messages m
            WHERE m.user_id = ?
               OR m.user_id IN (
                    SELECT user_being_followed_id FROM follows
                    WHERE user_following_id = ?
               )
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(messages)
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::users::repo::{Like, User};

    async fn seed_user(db: &SqlitePool) -> User {
        User::signup("John Doe", "jdoe@email.com", "123456", Some("mujpg.jpg"))
            .expect("valid signup")
            .commit(db)
            .await
            .expect("commit user")
    }

    #[tokio::test]
    async fn message_belongs_to_its_author() {
        let db = test_pool().await;
        let u = seed_user(&db).await;

        let m = Message::create(&db, u.id, "The warble!!!").await.unwrap();

        let messages = Message::for_user(&db, u.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, m.id);
        assert_eq!(messages[0].text, "The warble!!!");
        assert_eq!(messages[0].user_id, u.id);
    }

    #[tokio::test]
    async fn create_rejects_empty_text() {
        let db = test_pool().await;
        let u = seed_user(&db).await;

        let err = Message::create(&db, u.id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_text_over_the_limit() {
        let db = test_pool().await;
        let u = seed_user(&db).await;

        let long = "w".repeat(MAX_TEXT_LEN + 1);
        let err = Message::create(&db, u.id, &long).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_with_unknown_owner_is_an_integrity_error() {
        let db = test_pool().await;

        let err = Message::create(&db, 9999, "orphan warble").await.unwrap_err();
        assert!(matches!(err, AppError::Integrity(_)));
    }

    #[tokio::test]
    async fn liking_a_message_records_one_edge() {
        let db = test_pool().await;
        let u = seed_user(&db).await;
        let m = Message::create(&db, u.id, "The warble!!!").await.unwrap();

        User::add_like(&db, u.id, m.id).await.unwrap();

        let likes = Like::for_user(&db, u.id).await.unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].message_id, m.id);
    }

    #[tokio::test]
    async fn liking_twice_is_idempotent() {
        let db = test_pool().await;
        let u = seed_user(&db).await;
        let m = Message::create(&db, u.id, "The warble!!!").await.unwrap();

        let first = User::add_like(&db, u.id, m.id).await.unwrap();
        let second = User::add_like(&db, u.id, m.id).await.unwrap();

        assert_eq!(first.message_id, second.message_id);
        assert_eq!(Like::for_message(&db, m.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn liked_messages_are_queryable_from_the_user() {
        let db = test_pool().await;
        let u = seed_user(&db).await;
        let other = User::signup("Jane Smith", "jsmith@email.com", "654321", None)
            .unwrap()
            .commit(&db)
            .await
            .unwrap();
        let m = Message::create(&db, other.id, "like me").await.unwrap();

        User::add_like(&db, u.id, m.id).await.unwrap();

        let liked = User::likes(&db, u.id).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, m.id);
    }

    #[tokio::test]
    async fn unlike_removes_the_edge() {
        let db = test_pool().await;
        let u = seed_user(&db).await;
        let m = Message::create(&db, u.id, "The warble!!!").await.unwrap();

        User::add_like(&db, u.id, m.id).await.unwrap();
        User::remove_like(&db, u.id, m.id).await.unwrap();

        assert!(Like::for_message(&db, m.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn timeline_covers_self_and_followed_users_only() {
        let db = test_pool().await;
        let u = seed_user(&db).await;
        let followed = User::signup("Jane Smith", "jsmith@email.com", "654321", None)
            .unwrap()
            .commit(&db)
            .await
            .unwrap();
        let stranger = User::signup("Nobody", "nobody@email.com", "password", None)
            .unwrap()
            .commit(&db)
            .await
            .unwrap();

        User::follow(&db, u.id, followed.id).await.unwrap();
        let own = Message::create(&db, u.id, "mine").await.unwrap();
        let theirs = Message::create(&db, followed.id, "theirs").await.unwrap();
        Message::create(&db, stranger.id, "unseen").await.unwrap();

        let timeline = Message::timeline(&db, u.id, 100).await.unwrap();
        let ids: Vec<i64> = timeline.iter().map(|m| m.id).collect();
        assert_eq!(timeline.len(), 2);
        assert!(ids.contains(&own.id));
        assert!(ids.contains(&theirs.id));
    }

    #[tokio::test]
    async fn deleting_a_message_removes_its_likes() {
        let db = test_pool().await;
        let u = seed_user(&db).await;
        let m = Message::create(&db, u.id, "short lived").await.unwrap();
        User::add_like(&db, u.id, m.id).await.unwrap();

        Message::delete(&db, m.id).await.unwrap();

        assert!(Message::get(&db, m.id).await.unwrap().is_none());
        assert!(Like::for_user(&db, u.id).await.unwrap().is_empty());
    }
}
