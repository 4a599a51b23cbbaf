use serde::{Deserialize, Serialize};

use crate::messages::dto::MessageResponse;
use crate::messages::repo::Message;
use crate::users::repo::User;

/// Public projection of a user. The password hash never leaves the repo
/// layer; `handle` is the `@`-prefixed username the user pages render.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub handle: String,
    pub image_url: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            handle: format!("@{}", user.username),
            image_url: user.image_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub handle: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub messages: Vec<MessageResponse>,
}

impl UserProfile {
    pub fn new(user: &User, messages: &[Message]) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            handle: format!("@{}", user.username),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
            header_image_url: user.header_image_url.clone(),
            bio: user.bio.clone(),
            location: user.location.clone(),
            messages: messages.iter().map(MessageResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Optional username substring filter, like the index page's search box.
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct FollowersResponse {
    pub user: UserSummary,
    pub followers: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct FollowingResponse {
    pub user: UserSummary,
    pub following: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub user: UserSummary,
    pub likes: Vec<MessageResponse>,
}
