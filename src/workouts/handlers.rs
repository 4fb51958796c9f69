use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    state::AppState,
    workouts::dto::{
        validate_category, validate_difficulty, CreateWorkoutRequest, ExerciseQuery, Pagination,
        RateRequest,
    },
    workouts::repo::{self, Exercise, Workout},
};

pub fn workout_routes() -> Router<AppState> {
    Router::new()
        .route("/exercises", get(list_exercises))
        .route("/workouts", get(list_workouts).post(create_workout))
        .route("/workouts/:id", get(get_workout))
        .route("/workouts/:id/rate", post(rate_workout))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "workout persistence error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state))]
pub async fn list_exercises(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<ExerciseQuery>,
) -> Result<Json<Vec<Exercise>>, (StatusCode, String)> {
    let category = match q.category.as_deref() {
        None => None,
        Some(raw) => match validate_category(raw) {
            Some(c) => Some(c),
            None => return Err((StatusCode::BAD_REQUEST, "Unknown exercise category".into())),
        },
    };
    let difficulty = match q.difficulty.as_deref() {
        None => None,
        Some(raw) => match validate_difficulty(raw) {
            Some(d) => Some(d),
            None => return Err((StatusCode::BAD_REQUEST, "Unknown difficulty".into())),
        },
    };

    let rows = repo::list_exercises(
        &state.db,
        category,
        difficulty,
        q.muscle_group.as_deref(),
        q.limit.clamp(1, 100),
        q.offset.max(0),
    )
    .await
    .map_err(internal)?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn list_workouts(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Workout>>, (StatusCode, String)> {
    let rows = repo::list_workouts(&state.db, p.limit.clamp(1, 100), p.offset.max(0))
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_workout(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Workout>, (StatusCode, String)> {
    let workout = repo::get_workout(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Workout not found".to_string()))?;
    Ok(Json(workout))
}

#[instrument(skip(state, payload))]
pub async fn create_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<Workout>), (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Workout name is required".into()));
    }
    let Some(difficulty) = validate_difficulty(&payload.difficulty) else {
        return Err((StatusCode::BAD_REQUEST, "Unknown difficulty".into()));
    };
    if payload.duration_minutes <= 0 {
        return Err((StatusCode::BAD_REQUEST, "Duration must be positive".into()));
    }
    if payload.exercises.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Workout needs at least one exercise".into(),
        ));
    }
    if payload
        .exercises
        .iter()
        .any(|e| e.sets <= 0 || e.reps <= 0 || e.rest_seconds < 0)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Sets and reps must be positive, rest non-negative".into(),
        ));
    }

    let exercises = serde_json::to_value(&payload.exercises)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let workout = repo::insert_workout(
        &state.db,
        user_id,
        name,
        payload.description.as_deref(),
        difficulty,
        payload.duration_minutes,
        &exercises,
    )
    .await
    .map_err(internal)?;

    info!(user_id = %user_id, workout_id = %workout.id, "workout created");
    Ok((StatusCode::CREATED, Json(workout)))
}

#[instrument(skip(state, payload))]
pub async fn rate_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateRequest>,
) -> Result<Json<Workout>, (StatusCode, String)> {
    if !(1.0..=5.0).contains(&payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }

    let workout = repo::rate(&state.db, id, payload.rating)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Workout not found".to_string()))?;

    info!(user_id = %user_id, workout_id = %id, rating = payload.rating, "workout rated");
    Ok(Json(workout))
}
