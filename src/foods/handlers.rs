use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::AuthUser,
    foods::dto::{CreateFoodRequest, FoodCategory, FoodQuery, FoodResponse, ServingSize},
    foods::repo,
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new().route("/foods", get(list_foods).post(create_food))
}

#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodResponse>), (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Food name is required".into()));
    }
    let Some(category) = FoodCategory::parse(&payload.category) else {
        return Err((StatusCode::BAD_REQUEST, "Unknown food category".into()));
    };
    if !payload.nutrients.is_non_negative() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Nutrient values must be non-negative".into(),
        ));
    }
    let serving: ServingSize = payload.serving_size.unwrap_or_default();
    if !(serving.amount.is_finite() && serving.amount > 0.0) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Serving amount must be positive".into(),
        ));
    }

    let item = repo::insert(
        &state.db,
        Some(user_id),
        name,
        category,
        &payload.nutrients,
        &serving,
        true,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "create food failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(user_id = %user_id, food_id = %item.id, "food created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<FoodQuery>,
) -> Result<Json<Vec<FoodResponse>>, (StatusCode, String)> {
    let items = repo::search_visible(
        &state.db,
        user_id,
        q.search.as_deref(),
        q.limit.clamp(1, 100),
        q.offset.max(0),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "list foods failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(items.into_iter().map(FoodResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serving_defaults_to_100_g() {
        let s = ServingSize::default();
        assert_eq!(s.amount, 100.0);
        assert_eq!(s.unit, "g");
    }
}
