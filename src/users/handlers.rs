use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::session::{removal_cookie, CurrentUser};
use crate::error::AppError;
use crate::messages::dto::MessageResponse;
use crate::messages::repo::Message;
use crate::state::AppState;
use crate::users::dto::{
    FollowersResponse, FollowingResponse, LikesResponse, ListParams, UserListResponse,
    UserProfile, UserSummary,
};
use crate::users::repo::User;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id", get(show_user))
        .route("/users/:user_id/followers", get(show_followers))
        .route("/users/:user_id/following", get(show_following))
        .route("/users/:user_id/likes", get(show_likes))
        .route("/users/follow/:user_id", post(follow_user))
        .route("/users/stop-following/:user_id", post(stop_following))
        .route("/users/add_like/:message_id", post(add_like))
        .route("/users/delete", post(delete_user))
}

fn user_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "User not found." })),
    )
        .into_response()
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = User::all(&state.db, params.q.as_deref()).await?;
    Ok(Json(UserListResponse {
        users: users.iter().map(UserSummary::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(user) = User::get(&state.db, user_id).await? else {
        return Ok(user_not_found());
    };
    let messages = Message::for_user(&state.db, user.id).await?;
    Ok(Json(UserProfile::new(&user, &messages)).into_response())
}

#[instrument(skip(state))]
pub async fn show_followers(
    State(state): State<AppState>,
    CurrentUser(_viewer_id): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(user) = User::get(&state.db, user_id).await? else {
        return Ok(user_not_found());
    };
    let followers = User::followers(&state.db, user.id).await?;
    Ok(Json(FollowersResponse {
        user: UserSummary::from(&user),
        followers: followers.iter().map(UserSummary::from).collect(),
    })
    .into_response())
}

#[instrument(skip(state))]
pub async fn show_following(
    State(state): State<AppState>,
    CurrentUser(_viewer_id): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(user) = User::get(&state.db, user_id).await? else {
        return Ok(user_not_found());
    };
    let following = User::following(&state.db, user.id).await?;
    Ok(Json(FollowingResponse {
        user: UserSummary::from(&user),
        following: following.iter().map(UserSummary::from).collect(),
    })
    .into_response())
}

#[instrument(skip(state))]
pub async fn show_likes(
    State(state): State<AppState>,
    CurrentUser(_viewer_id): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(user) = User::get(&state.db, user_id).await? else {
        return Ok(user_not_found());
    };
    let likes = User::likes(&state.db, user.id).await?;
    Ok(Json(LikesResponse {
        user: UserSummary::from(&user),
        likes: likes.iter().map(MessageResponse::from).collect(),
    })
    .into_response())
}

#[instrument(skip(state))]
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(viewer_id): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    if User::get(&state.db, user_id).await?.is_none() {
        return Ok(user_not_found());
    }
    if viewer_id == user_id && !state.config.allow_self_follows {
        return Err(AppError::validation("cannot follow yourself"));
    }

    User::follow(&state.db, viewer_id, user_id).await?;
    info!(follower_id = viewer_id, followed_id = user_id, "follow added");

    let following = User::following(&state.db, viewer_id).await?;
    Ok(Json(json!({
        "following": following.iter().map(UserSummary::from).collect::<Vec<_>>(),
    }))
    .into_response())
}

#[instrument(skip(state))]
pub async fn stop_following(
    State(state): State<AppState>,
    CurrentUser(viewer_id): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    User::unfollow(&state.db, viewer_id, user_id).await?;
    info!(follower_id = viewer_id, followed_id = user_id, "follow removed");

    let following = User::following(&state.db, viewer_id).await?;
    Ok(Json(json!({
        "following": following.iter().map(UserSummary::from).collect::<Vec<_>>(),
    }))
    .into_response())
}

#[instrument(skip(state))]
pub async fn add_like(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(message) = Message::get(&state.db, message_id).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Message not found." })),
        )
            .into_response());
    };
    if message.user_id == user_id && !state.config.allow_self_likes {
        return Err(AppError::validation("cannot like your own warble"));
    }

    let like = User::add_like(&state.db, user_id, message_id).await?;
    info!(user_id, message_id, "message liked");
    Ok(Json(json!({
        "user_id": like.user_id,
        "message_id": like.message_id,
    }))
    .into_response())
}

#[instrument(skip(state, jar))]
pub async fn delete_user(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, AppError> {
    User::delete(&state.db, user_id).await?;
    info!(user_id, "user deleted");

    let jar = jar.remove(removal_cookie());
    Ok((
        jar,
        Json(json!({ "flash": "Account deleted.", "category": "success" })),
    )
        .into_response())
}
