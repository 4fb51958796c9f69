use crate::state::AppState;
use axum::Router;

pub mod analyze;
pub mod dto;
pub mod handlers;
pub mod intake;

pub fn router() -> Router<AppState> {
    handlers::nutrition_routes()
}
