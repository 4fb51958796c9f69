use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use base64::Engine;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use tracing::{error, instrument, warn};

use crate::{
    auth::{repo::User, AuthUser},
    chat::repo::ChatKind,
    clock::{local_day, local_now},
    foods,
    foods::dto::FoodCategory,
    nutrition::analyze::{self, Verdict},
    nutrition::dto::{
        meal_type_or_default, AddFoodRequest, AnalyzeFoodRequest, AnalyzeFoodResponse,
        IntakeResponse, TargetsRequest,
    },
    nutrition::intake,
    state::AppState,
};

pub fn nutrition_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/daily-intake/add-food", post(add_food))
        .route("/nutrition/daily-intake/today", get(today))
        .route("/nutrition/daily-intake/targets", put(update_targets))
        .route("/nutrition/analyze-food", post(analyze_food))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "nutrition persistence error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn add_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddFoodRequest>,
) -> Result<Json<IntakeResponse>, (StatusCode, String)> {
    let name = payload.food_name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Food name is required".into()));
    }
    if !payload.nutrients.is_non_negative() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Nutrient values must be non-negative".into(),
        ));
    }

    let tz = User::tz_offset(&state.db, user_id).await.map_err(internal)?;
    let day = local_day(state.clock.as_ref(), tz);
    let at = local_now(state.clock.as_ref(), tz)
        .format(&Rfc3339)
        .unwrap_or_default();

    let meal_type = meal_type_or_default(payload.meal_type.as_deref());
    let entry = json!({
        "name": name,
        "nutrients": payload.nutrients,
        "meal_type": meal_type,
        "at": at,
    });

    let row = intake::add_consumed_food(&state.db, user_id, day, &payload.nutrients, &entry)
        .await
        .map_err(internal)?;

    Ok(Json(IntakeResponse::from_row(row)))
}

#[instrument(skip(state))]
pub async fn today(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<IntakeResponse>, (StatusCode, String)> {
    let tz = User::tz_offset(&state.db, user_id).await.map_err(internal)?;
    let day = local_day(state.clock.as_ref(), tz);

    let response = match intake::fetch_day(&state.db, user_id, day)
        .await
        .map_err(internal)?
    {
        Some(row) => IntakeResponse::from_row(row),
        // Read-time default; nothing is persisted for an untouched day.
        None => IntakeResponse::empty(day),
    };
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn update_targets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TargetsRequest>,
) -> Result<Json<IntakeResponse>, (StatusCode, String)> {
    let patch = payload.patch;
    for value in [patch.calories, patch.protein, patch.carbohydrates, patch.fats]
        .into_iter()
        .flatten()
    {
        if !value.is_finite() || value < 0.0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "Targets must be non-negative numbers".into(),
            ));
        }
    }

    let tz = User::tz_offset(&state.db, user_id).await.map_err(internal)?;
    let day = local_day(state.clock.as_ref(), tz);

    let row = intake::update_targets(&state.db, user_id, day, &patch)
        .await
        .map_err(internal)?;
    Ok(Json(IntakeResponse::from_row(row)))
}

#[instrument(skip(state, payload))]
pub async fn analyze_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AnalyzeFoodRequest>,
) -> Result<(StatusCode, Json<AnalyzeFoodResponse>), (StatusCode, String)> {
    if payload.image_base64.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Image is required".into()));
    }
    if base64::engine::general_purpose::STANDARD
        .decode(payload.image_base64.trim())
        .is_err()
    {
        return Err((StatusCode::BAD_REQUEST, "Invalid base64 image".into()));
    }
    let mime_type = payload
        .mime_type
        .unwrap_or_else(|| "image/jpeg".to_string());

    let verdict = analyze::classify_image(
        state.advisor.as_ref(),
        payload.image_base64.trim().to_string(),
        mime_type,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "image classification upstream failure");
        (StatusCode::BAD_GATEWAY, "Food classification failed".into())
    })?;

    let analysis = match verdict {
        Verdict::NotFood { message } => {
            return Err((StatusCode::BAD_REQUEST, message));
        }
        Verdict::Food(a) => a,
    };

    let name = analysis
        .food_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Unknown food".to_string());
    let category = FoodCategory::parse_or_default(analysis.category.as_deref().unwrap_or(""));
    let nutrients = foods::Nutrients {
        calories: analysis.calories,
        protein: analysis.protein,
        carbohydrates: analysis.carbohydrates,
        fats: analysis.fats,
        fiber: analysis.fiber,
        sugar: analysis.sugar,
        sodium: analysis.sodium,
    }
    .clamped();

    let item = foods::repo::insert(
        &state.db,
        Some(user_id),
        &name,
        category,
        &nutrients,
        &foods::dto::ServingSize::default(),
        true,
    )
    .await
    .map_err(internal)?;

    // Interaction history is best-effort; classification already succeeded.
    if let Err(e) = crate::chat::repo::append(
        &state.db,
        user_id,
        ChatKind::FoodAnalysis,
        &json!({"food_id": item.id, "analysis": analysis.clone()}),
        &json!({"confidence": analysis.confidence}),
    )
    .await
    {
        warn!(error = %e, "failed to record food analysis in chat history");
    }

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeFoodResponse {
            food: item.into(),
            analysis,
        }),
    ))
}
