use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::AuthUser,
    chat::dto::{AdviceRequest, AdviceResponse, ClearResponse, HistoryQuery},
    chat::repo::{self, ChatEntry, ChatKind},
    state::AppState,
};

/// Returned when the text service cannot produce advice; the endpoint never
/// fails on upstream errors.
const FALLBACK_ADVICE: &str = "Keep it simple: train consistently, eat mostly whole \
foods with enough protein, drink water through the day and sleep seven to nine hours. \
Small habits repeated daily beat any quick fix.";

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/history", get(history).delete(clear_history))
        .route("/ai-assistant/fitness-advice", post(fitness_advice))
}

#[instrument(skip(state, payload))]
pub async fn fitness_advice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>, (StatusCode, String)> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".into()));
    }

    let prompt = format!(
        "You are a certified fitness and nutrition coach. Answer the question \
         below in a few short, practical sentences. Do not prescribe medication \
         or diagnose conditions.\n\nQuestion: {question}"
    );

    let (answer, source) = match state.advisor.generate(&prompt, None).await {
        Ok(text) => (text.trim().to_string(), "service"),
        Err(e) => {
            warn!(error = %e, "advice service unavailable, returning fallback");
            (FALLBACK_ADVICE.to_string(), "fallback")
        }
    };

    if let Err(e) = repo::append(
        &state.db,
        user_id,
        ChatKind::FitnessAdvice,
        &json!({"question": question, "answer": answer}),
        &json!({"source": source}),
    )
    .await
    {
        warn!(error = %e, "failed to record advice in chat history");
    }

    Ok(Json(AdviceResponse { answer, source }))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatEntry>>, (StatusCode, String)> {
    let kind = match q.kind.as_deref() {
        None => None,
        Some(raw) => match ChatKind::parse(raw) {
            Some(k) => Some(k),
            None => return Err((StatusCode::BAD_REQUEST, "Unknown history kind".into())),
        },
    };

    let rows = repo::list(
        &state.db,
        user_id,
        kind,
        q.limit.clamp(1, 200),
        q.offset.max(0),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "chat history query failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn clear_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ClearResponse>, (StatusCode, String)> {
    let deleted = repo::delete_all(&state.db, user_id).await.map_err(|e| {
        error!(error = %e, "chat history delete failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    info!(user_id = %user_id, deleted, "chat history cleared");
    Ok(Json(ClearResponse { deleted }))
}
