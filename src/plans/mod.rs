use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod materialize;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::plan_routes()
}
