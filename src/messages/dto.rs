use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::messages::repo::Message;

/// Request body for posting a new warble.
#[derive(Debug, Deserialize)]
pub struct NewMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: i64,
}

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            text: message.text.clone(),
            created_at: message.created_at,
            user_id: message.user_id,
        }
    }
}

/// Home feed: recent warbles by the current user and everyone they follow.
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub messages: Vec<MessageResponse>,
}
