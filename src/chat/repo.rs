use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of AI interaction recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    NutritionRecommendation,
    WorkoutRecommendation,
    FitnessAdvice,
    FoodAnalysis,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::NutritionRecommendation => "nutrition-recommendation",
            ChatKind::WorkoutRecommendation => "workout-recommendation",
            ChatKind::FitnessAdvice => "fitness-advice",
            ChatKind::FoodAnalysis => "food-analysis",
        }
    }

    pub fn parse(s: &str) -> Option<ChatKind> {
        match s {
            "nutrition-recommendation" => Some(ChatKind::NutritionRecommendation),
            "workout-recommendation" => Some(ChatKind::WorkoutRecommendation),
            "fitness-advice" => Some(ChatKind::FitnessAdvice),
            "food-analysis" => Some(ChatKind::FoodAnalysis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub content: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: OffsetDateTime,
}

/// Entries are append-only; there is no update path.
pub async fn append(
    db: &PgPool,
    user_id: Uuid,
    kind: ChatKind,
    content: &serde_json::Value,
    metadata: &serde_json::Value,
) -> anyhow::Result<ChatEntry> {
    let entry = sqlx::query_as::<_, ChatEntry>(
        r#"
        INSERT INTO chat_entries (user_id, kind, content, metadata)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, kind, content, metadata, created_at
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(content)
    .bind(metadata)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

pub async fn list(
    db: &PgPool,
    user_id: Uuid,
    kind: Option<ChatKind>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ChatEntry>> {
    let rows = sqlx::query_as::<_, ChatEntry>(
        r#"
        SELECT id, user_id, kind, content, metadata, created_at
        FROM chat_entries
        WHERE user_id = $1
          AND ($2::text IS NULL OR kind = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(kind.map(|k| k.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Bulk per-user delete is the only way entries ever leave the log.
pub async fn delete_all(db: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM chat_entries WHERE user_id = $1"#)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips() {
        for kind in [
            ChatKind::NutritionRecommendation,
            ChatKind::WorkoutRecommendation,
            ChatKind::FitnessAdvice,
            ChatKind::FoodAnalysis,
        ] {
            assert_eq!(ChatKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ChatKind::parse("small-talk"), None);
    }
}
