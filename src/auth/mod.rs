use crate::state::AppState;
use axum::Router;

pub mod chat;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod mailer;
pub mod otp;
pub mod password;
pub mod repo;
pub mod service;
mod validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
