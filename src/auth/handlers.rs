use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, SignupRequest};
use crate::auth::session::{removal_cookie, session_cookie};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::dto::UserSummary;
use crate::users::repo::User;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Two-phase signup: `User::signup` validates and hashes (never touching the
/// database), `commit` writes the row. A duplicate username or email only
/// fails at the commit step.
#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let staged = User::signup(
        &payload.username,
        &payload.email,
        &payload.password,
        payload.image_url.as_deref(),
    )?;
    let user = staged.commit(&state.db).await?;

    info!(user_id = user.id, username = %user.username, "user signed up");
    let jar = jar.add(session_cookie(user.id));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: UserSummary::from(&user),
        }),
    )
        .into_response())
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    // Lookup contract: unknown username and wrong password both come back as
    // "no match", never as an error.
    match User::authenticate(&state.db, &payload.username, &payload.password).await? {
        Some(user) => {
            info!(user_id = user.id, username = %user.username, "user logged in");
            let jar = jar.add(session_cookie(user.id));
            Ok((
                jar,
                Json(AuthResponse {
                    user: UserSummary::from(&user),
                }),
            )
                .into_response())
        }
        None => {
            warn!(username = %payload.username, "login rejected");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials." })),
            )
                .into_response())
        }
    }
}

#[instrument(skip(jar))]
pub async fn logout(jar: SignedCookieJar) -> Response {
    let jar = jar.remove(removal_cookie());
    (
        jar,
        Json(json!({ "flash": "You have successfully logged out.", "category": "success" })),
    )
        .into_response()
}
