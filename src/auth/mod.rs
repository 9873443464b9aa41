use crate::state::AppState;
use axum::Router;

pub mod attempts;
mod dto;
pub mod email;
pub mod handlers;
pub mod lockout;
pub mod repo;
mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
