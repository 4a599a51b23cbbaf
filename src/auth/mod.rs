use axum::Router;
use lazy_static::lazy_static;
use regex::Regex;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod password;
pub mod session;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
