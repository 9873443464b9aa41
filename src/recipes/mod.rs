pub mod client;
pub mod dto;
mod handlers;
pub mod reconcile;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::recipe_routes())
}
