use sqlx::{FromRow, SqlitePool};

use crate::auth::{is_valid_email, password};
use crate::error::AppError;
use crate::messages::repo::Message;

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

const USER_COLUMNS: &str =
    "id, username, email, password_hash, image_url, header_image_url, bio, location";

/// User row. `password_hash` always holds an argon2 PHC string, never the
/// raw password.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// A signup that has passed validation but has not been written yet.
/// Uniqueness of username and email is only checked by the database when
/// this is committed.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    password_hash: String,
    pub image_url: String,
}

/// Directed like edge: `user_id` marked `message_id` as liked.
#[derive(Debug, Clone, FromRow)]
pub struct Like {
    pub user_id: i64,
    pub message_id: i64,
}

impl User {
    /// Stage a signup. Validation failures (empty username, malformed email,
    /// empty password) surface here, before any persistence attempt.
    pub fn signup(
        username: &str,
        email: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<NewUser, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("username must not be empty"));
        }
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::validation("invalid email address"));
        }
        if password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }
        let password_hash = password::hash_password(password).map_err(AppError::Internal)?;
        Ok(NewUser {
            username: username.to_string(),
            email,
            password_hash,
            image_url: image_url.unwrap_or(DEFAULT_IMAGE_URL).to_string(),
        })
    }

    /// Look up a user by username and check the password against the stored
    /// hash. Unknown username and wrong password both yield `None`.
    pub async fn authenticate(
        db: &SqlitePool,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(user) = User::find_by_username(db, username).await? else {
            return Ok(None);
        };
        let ok = password::verify_password(password, &user.password_hash)
            .map_err(AppError::Internal)?;
        Ok(ok.then_some(user))
    }

    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// All users, optionally filtered by a username substring.
    pub async fn all(db: &SqlitePool, q: Option<&str>) -> Result<Vec<User>, AppError> {
        let users = match q {
            Some(q) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE username LIKE '%' || ? || '%' ORDER BY id"
                ))
                .bind(q)
                .fetch_all(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY id"
                ))
                .fetch_all(db)
                .await?
            }
        };
        Ok(users)
    }

    /// Users this user follows, in insertion order of the edges.
    pub async fn following(db: &SqlitePool, id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash,
                   u.image_url, u.header_image_url, u.bio, u.location
            FROM users u
            JOIN follows f ON f.user_being_followed_id = u.id
            WHERE f.user_following_id = ?
            ORDER BY f.rowid
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Users following this user. Same edge table as `following`, filtered by
    /// the other column.
    pub async fn followers(db: &SqlitePool, id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash,
                   u.image_url, u.header_image_url, u.bio, u.location
            FROM users u
            JOIN follows f ON f.user_following_id = u.id
            WHERE f.user_being_followed_id = ?
            ORDER BY f.rowid
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// True iff a follows edge `follower -> followed` exists.
    pub async fn is_following(
        db: &SqlitePool,
        follower_id: i64,
        followed_id: i64,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM follows \
             WHERE user_following_id = ? AND user_being_followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(db)
        .await?;
        Ok(count > 0)
    }

    /// True iff `other` follows `id`. Not a mirror of `is_following`; the two
    /// predicates check opposite directions of the same edge table.
    pub async fn is_followed_by(
        db: &SqlitePool,
        id: i64,
        other_id: i64,
    ) -> Result<bool, AppError> {
        User::is_following(db, other_id, id).await
    }

    /// Record `follower -> followed`. Re-following is a no-op; a dangling
    /// endpoint is an integrity error.
    pub async fn follow(
        db: &SqlitePool,
        follower_id: i64,
        followed_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id) \
             VALUES (?, ?)",
        )
        .bind(followed_id)
        .bind(follower_id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn unfollow(
        db: &SqlitePool,
        follower_id: i64,
        followed_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM follows \
             WHERE user_following_id = ? AND user_being_followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Record a like. Idempotent: liking the same message twice keeps a
    /// single edge and returns it.
    pub async fn add_like(
        db: &SqlitePool,
        user_id: i64,
        message_id: i64,
    ) -> Result<Like, AppError> {
        sqlx::query("INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(message_id)
            .execute(db)
            .await?;
        let like = sqlx::query_as::<_, Like>(
            "SELECT user_id, message_id FROM likes WHERE user_id = ? AND message_id = ?",
        )
        .bind(user_id)
        .bind(message_id)
        .fetch_one(db)
        .await?;
        Ok(like)
    }

    pub async fn remove_like(
        db: &SqlitePool,
        user_id: i64,
        message_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM likes WHERE user_id = ? AND message_id = ?")
            .bind(user_id)
            .bind(message_id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Messages this user has liked, in like order.
    pub async fn likes(db: &SqlitePool, user_id: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.text, m.created_at, m.user_id
            FROM messages m
            JOIN likes l ON l.message_id = m.id
            WHERE l.user_id = ?
            ORDER BY l.rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(messages)
    }

    /// Delete the user. Owned messages and both kinds of relationship edges
    /// go with it via the cascading foreign keys.
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl NewUser {
    /// Write the staged signup. Duplicate username/email surfaces here as
    /// `AppError::Integrity`, not at staging time.
    pub async fn commit(self, db: &SqlitePool) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, image_url, header_image_url) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&self.username)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.image_url)
        .bind(DEFAULT_HEADER_IMAGE_URL)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

impl Like {
    pub async fn for_message(db: &SqlitePool, message_id: i64) -> Result<Vec<Like>, AppError> {
        let likes = sqlx::query_as::<_, Like>(
            "SELECT user_id, message_id FROM likes WHERE message_id = ? ORDER BY rowid",
        )
        .bind(message_id)
        .fetch_all(db)
        .await?;
        Ok(likes)
    }

    pub async fn for_user(db: &SqlitePool, user_id: i64) -> Result<Vec<Like>, AppError> {
        let likes = sqlx::query_as::<_, Like>(
            "SELECT user_id, message_id FROM likes WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(likes)
    }
}
