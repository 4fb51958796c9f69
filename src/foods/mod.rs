use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;

pub use dto::Nutrients;

pub fn router() -> Router<AppState> {
    handlers::food_routes()
}
