use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::session::{access_unauthorized, session_user, CurrentUser};
use crate::error::AppError;
use crate::messages::dto::{MessageResponse, NewMessageRequest, TimelineResponse};
use crate::messages::repo::Message;
use crate::state::AppState;

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/messages", post(create_message))
        .route("/messages/:message_id", get(show_message))
        .route("/messages/:message_id/delete", post(delete_message))
}

fn message_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Message not found." })),
    )
        .into_response()
}

/// Logged-in home is the timeline; anonymous home is the signup pitch.
#[instrument(skip(state, jar))]
pub async fn home(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    match session_user(&jar) {
        Some(user_id) => {
            let messages = Message::timeline(&state.db, user_id, 100).await?;
            Ok(Json(TimelineResponse {
                messages: messages.iter().map(MessageResponse::from).collect(),
            })
            .into_response())
        }
        None => Ok(Json(json!({
            "message": "What's Happening? Sign up now to get your own personalized timeline!",
        }))
        .into_response()),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_message(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<NewMessageRequest>,
) -> Result<Response, AppError> {
    let message = Message::create(&state.db, user_id, &payload.text).await?;
    info!(user_id, message_id = message.id, "message created");
    Ok((StatusCode::CREATED, Json(MessageResponse::from(&message))).into_response())
}

#[instrument(skip(state))]
pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    match Message::get(&state.db, message_id).await? {
        Some(message) => Ok(Json(MessageResponse::from(&message)).into_response()),
        None => Ok(message_not_found()),
    }
}

/// Only the owner may delete a warble; anyone else gets the same denial as
/// an anonymous request.
#[instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(message) = Message::get(&state.db, message_id).await? else {
        return Ok(message_not_found());
    };
    if message.user_id != user_id {
        return Ok(access_unauthorized());
    }

    Message::delete(&state.db, message_id).await?;
    info!(user_id, message_id, "message deleted");
    Ok(Json(json!({ "deleted": message_id })).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::config::AppConfig;
    use crate::db::test_pool;
    use crate::messages::repo::Message;
    use crate::state::AppState;
    use crate::users::repo::User;

    async fn test_app() -> (Router, SqlitePool) {
        let db = test_pool().await;
        let state = AppState::from_parts(db.clone(), Arc::new(AppConfig::for_tests()))
            .expect("test state");
        (build_app(state), db)
    }

    async fn seed_user(db: &SqlitePool, username: &str, email: &str, password: &str) -> User {
        User::signup(username, email, password, None)
            .expect("valid signup")
            .commit(db)
            .await
            .expect("commit user")
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": password });
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "login should succeed");
        res.headers()
            .get(header::SET_COOKIE)
            .expect("login sets the session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn body_string(res: axum::response::Response) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn create_message_persists_for_the_session_user() {
        let (app, db) = test_app().await;
        let user = seed_user(&db, "testuser", "test@test.com", "testuser").await;
        let cookie = login(&app, "testuser", "testuser").await;

        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::COOKIE, cookie)
                    .body(Body::from(r#"{"text":"Hello warbler"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let messages = Message::for_user(&db, user.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello warbler");
    }

    #[tokio::test]
    async fn create_message_without_session_is_denied() {
        let (app, db) = test_app().await;
        let user = seed_user(&db, "testuser", "test@test.com", "testuser").await;

        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"text":"Hello warbler"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("Access unauthorized"));

        assert!(Message::for_user(&db, user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_denied() {
        let (app, db) = test_app().await;
        let author = seed_user(&db, "abc", "test1@test.com", "password").await;
        seed_user(&db, "testuser", "test@test.com", "testuser").await;
        let m = Message::create(&db, author.id, "keep me").await.unwrap();

        let cookie = login(&app, "testuser", "testuser").await;
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages/{}/delete", m.id))
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("Access unauthorized"));

        assert!(Message::get(&db, m.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn owner_can_delete_their_message() {
        let (app, db) = test_app().await;
        let author = seed_user(&db, "testuser", "test@test.com", "testuser").await;
        let m = Message::create(&db, author.id, "short lived").await.unwrap();

        let cookie = login(&app, "testuser", "testuser").await;
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages/{}/delete", m.id))
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(Message::get(&db, m.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn home_timeline_shows_followed_users_messages() {
        let (app, db) = test_app().await;
        let viewer = seed_user(&db, "testuser", "test@test.com", "testuser").await;
        let followed = seed_user(&db, "abc", "test1@test.com", "password").await;
        let stranger = seed_user(&db, "efg", "test2@test.com", "password").await;
        User::follow(&db, viewer.id, followed.id).await.unwrap();
        Message::create(&db, followed.id, "followed warble").await.unwrap();
        Message::create(&db, stranger.id, "stranger warble").await.unwrap();

        let cookie = login(&app, "testuser", "testuser").await;
        let res = app
            .oneshot(
                Request::get("/")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_string(res).await;
        assert!(body.contains("followed warble"));
        assert!(!body.contains("stranger warble"));
    }

    #[tokio::test]
    async fn anonymous_home_is_the_signup_pitch() {
        let (app, _db) = test_app().await;

        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("Sign up now"));
    }
}
