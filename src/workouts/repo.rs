use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub muscle_groups: serde_json::Value,
    pub equipment: serde_json::Value,
    pub difficulty: String,
    pub instructions: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: String,
    pub duration_minutes: i32,
    /// Entries: [{"exercise_id", "sets", "reps", "rest_seconds", "weight"}]
    pub exercises: serde_json::Value,
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

const WORKOUT_COLUMNS: &str = "id, name, description, difficulty, duration_minutes, \
     exercises, rating_average, rating_count, created_by, created_at";

/// Running mean applied when one more rating arrives. Mirrors the SQL in
/// `rate`, kept as a pure function so the arithmetic is testable.
pub fn next_rating(average: f64, count: i32, rating: f64) -> f64 {
    (average * count as f64 + rating) / (count as f64 + 1.0)
}

pub async fn list_exercises(
    db: &PgPool,
    category: Option<&str>,
    difficulty: Option<&str>,
    muscle_group: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Exercise>> {
    let rows = sqlx::query_as::<_, Exercise>(
        r#"
        SELECT id, name, category, muscle_groups, equipment, difficulty, instructions, created_at
        FROM exercises
        WHERE ($1::text IS NULL OR category = $1)
          AND ($2::text IS NULL OR difficulty = $2)
          AND ($3::text IS NULL OR muscle_groups @> jsonb_build_array($3::text))
        ORDER BY name ASC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(category)
    .bind(difficulty)
    .bind(muscle_group)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_workouts(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Workout>> {
    let rows = sqlx::query_as::<_, Workout>(&format!(
        r#"
        SELECT {WORKOUT_COLUMNS}
        FROM workouts
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_workout(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Workout>> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        r#"
        SELECT {WORKOUT_COLUMNS}
        FROM workouts
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(workout)
}

pub async fn insert_workout(
    db: &PgPool,
    created_by: Uuid,
    name: &str,
    description: Option<&str>,
    difficulty: &str,
    duration_minutes: i32,
    exercises: &serde_json::Value,
) -> anyhow::Result<Workout> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        r#"
        INSERT INTO workouts (name, description, difficulty, duration_minutes, exercises, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {WORKOUT_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(description)
    .bind(difficulty)
    .bind(duration_minutes)
    .bind(exercises)
    .bind(created_by)
    .fetch_one(db)
    .await?;
    Ok(workout)
}

/// Incremental mean update in a single statement, so concurrent ratings
/// cannot interleave a stale read between load and store.
pub async fn rate(db: &PgPool, id: Uuid, rating: f64) -> anyhow::Result<Option<Workout>> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        r#"
        UPDATE workouts
        SET rating_average = (rating_average * rating_count + $2) / (rating_count + 1),
            rating_count = rating_count + 1
        WHERE id = $1
        RETURNING {WORKOUT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(rating)
    .fetch_optional(db)
    .await?;
    Ok(workout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rating_becomes_the_average() {
        assert_eq!(next_rating(0.0, 0, 4.0), 4.0);
    }

    #[test]
    fn running_mean_matches_arithmetic_mean() {
        let ratings = [5.0, 3.0, 4.0, 2.0, 5.0];
        let mut avg = 0.0;
        for (i, r) in ratings.iter().enumerate() {
            avg = next_rating(avg, i as i32, *r);
        }
        let expected = ratings.iter().sum::<f64>() / ratings.len() as f64;
        assert!((avg - expected).abs() < 1e-9);
    }
}
