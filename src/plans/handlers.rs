use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    chat::repo::ChatKind,
    plans::dto::{
        filter_restrictions, validate_goal, CreatePlanRequest, Pagination, PlanResponse,
        RecommendationRequest, RecommendationResponse,
    },
    plans::materialize::{fetch_recommendation, materialize_meals},
    plans::repo,
    state::AppState,
};

const TARGET_CALORIES_RANGE: std::ops::RangeInclusive<f64> = 800.0..=5000.0;
const DEFAULT_TARGET_CALORIES: f64 = 2000.0;

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/ai-assistant/nutrition-recommendation", post(recommend))
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:id", get(get_plan).delete(delete_plan))
        .route("/meals/:id", get(get_meal))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "plan persistence error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn recommend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecommendationRequest>,
) -> Result<(StatusCode, Json<RecommendationResponse>), (StatusCode, String)> {
    let Some(goal) = validate_goal(&payload.goal) else {
        return Err((StatusCode::BAD_REQUEST, "Invalid goal".into()));
    };
    let restrictions = filter_restrictions(&payload.dietary_restrictions);

    let target_calories = payload.target_calories.unwrap_or(DEFAULT_TARGET_CALORIES);
    if !TARGET_CALORIES_RANGE.contains(&target_calories) {
        return Err((
            StatusCode::BAD_REQUEST,
            "targetCalories must be between 800 and 5000".into(),
        ));
    }
    let meal_count = payload.meal_count.unwrap_or(3).clamp(1, 6);

    let (recommendation, source) = fetch_recommendation(
        state.advisor.as_ref(),
        goal,
        &restrictions,
        target_calories,
        meal_count,
    )
    .await;

    let outcome = materialize_meals(&state.db, user_id, goal, &recommendation).await;
    let meal_ids: Vec<Uuid> = outcome.succeeded.iter().map(|m| m.id).collect();

    // The plan always spans a single day, whatever the request asked for.
    let plan_meals = json!([{ "day": 1, "meals": meal_ids }]);
    let split = recommendation.macro_split;
    let clamp_pct = |v: f64| v.clamp(0.0, 100.0);
    let plan = repo::insert_plan(
        &state.db,
        user_id,
        &format!("AI {goal} plan"),
        goal,
        target_calories,
        (
            clamp_pct(split.protein),
            clamp_pct(split.carbohydrates),
            clamp_pct(split.fats),
        ),
        &plan_meals,
        &json!(restrictions),
        false,
    )
    .await
    .map_err(internal)?;

    if let Err(e) = crate::chat::repo::append(
        &state.db,
        user_id,
        ChatKind::NutritionRecommendation,
        &json!({
            "goal": goal,
            "plan_id": plan.id,
            "recommendation": recommendation,
        }),
        &json!({
            "source": source.as_str(),
            "meals_attempted": recommendation.meals.len(),
            "meals_created": outcome.succeeded.len(),
        }),
    )
    .await
    {
        warn!(error = %e, "failed to record recommendation in chat history");
    }

    info!(
        user_id = %user_id,
        plan_id = %plan.id,
        source = source.as_str(),
        created = outcome.succeeded.len(),
        attempted = recommendation.meals.len(),
        "nutrition plan materialized"
    );

    let meals_attempted = recommendation.meals.len();
    Ok((
        StatusCode::CREATED,
        Json(RecommendationResponse {
            recommendation,
            recommendation_source: source.as_str(),
            plan_id: plan.id,
            meals_created: outcome.succeeded.len(),
            meals_attempted,
            created_meals: outcome.succeeded,
            failed_meals: outcome.failed,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), (StatusCode, String)> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".into()));
    }
    let Some(goal) = validate_goal(&payload.goal) else {
        return Err((StatusCode::BAD_REQUEST, "Invalid goal".into()));
    };
    if !TARGET_CALORIES_RANGE.contains(&payload.target_calories) {
        return Err((
            StatusCode::BAD_REQUEST,
            "target_calories must be between 800 and 5000".into(),
        ));
    }
    let split = payload.macro_split;
    // Each percentage must sit in 0..=100; nothing constrains their sum.
    for pct in [split.protein, split.carbohydrates, split.fats] {
        if !(0.0..=100.0).contains(&pct) {
            return Err((
                StatusCode::BAD_REQUEST,
                "Macro split percentages must be between 0 and 100".into(),
            ));
        }
    }
    if payload.meals.iter().any(|d| !(1..=7).contains(&d.day)) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Plan day numbers must be between 1 and 7".into(),
        ));
    }

    let restrictions = filter_restrictions(&payload.restrictions);
    let plan = repo::insert_plan(
        &state.db,
        user_id,
        title,
        goal,
        payload.target_calories,
        (split.protein, split.carbohydrates, split.fats),
        &serde_json::to_value(&payload.meals).unwrap_or_else(|_| json!([])),
        &json!(restrictions),
        payload.is_public,
    )
    .await
    .map_err(internal)?;

    info!(user_id = %user_id, plan_id = %plan.id, "nutrition plan created");
    Ok((StatusCode::CREATED, Json(plan.into())))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PlanResponse>>, (StatusCode, String)> {
    let plans = repo::list_visible(&state.db, user_id, p.limit.clamp(1, 100), p.offset.max(0))
        .await
        .map_err(internal)?;
    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    let plan = repo::get_plan(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Plan not found".to_string()))?;

    if !plan.is_public && plan.created_by != Some(user_id) {
        return Err((StatusCode::FORBIDDEN, "Not your plan".into()));
    }
    Ok(Json(plan.into()))
}

/// Only the owner may delete, and deletion is explicit — plans are never
/// removed as a side effect of anything else.
#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let plan = repo::get_plan(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Plan not found".to_string()))?;

    if plan.created_by != Some(user_id) {
        return Err((StatusCode::FORBIDDEN, "Not your plan".into()));
    }

    repo::delete_plan(&state.db, id).await.map_err(internal)?;
    info!(user_id = %user_id, plan_id = %id, "nutrition plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<repo::Meal>, (StatusCode, String)> {
    let meal = repo::get_meal(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Meal not found".to_string()))?;
    Ok(Json(meal))
}
