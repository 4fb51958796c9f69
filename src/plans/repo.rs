use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub meal_type: String,
    /// Ordered entries: [{"food_id", "quantity", "unit"}]
    pub foods: serde_json::Value,
    pub total_calories: f64,
    pub tags: serde_json::Value,
    pub created_at: OffsetDateTime,
}

const MEAL_COLUMNS: &str = "id, user_id, name, meal_type, foods, total_calories, tags, created_at";

pub async fn insert_meal(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    meal_type: &str,
    foods: &serde_json::Value,
    total_calories: f64,
    tags: &serde_json::Value,
) -> anyhow::Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(&format!(
        r#"
        INSERT INTO meals (user_id, name, meal_type, foods, total_calories, tags)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(meal_type)
    .bind(foods)
    .bind(total_calories)
    .bind(tags)
    .fetch_one(db)
    .await?;
    Ok(meal)
}

pub async fn get_meal(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM meals
        WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(meal)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionPlan {
    pub id: Uuid,
    pub title: String,
    pub goal: String,
    pub target_calories: f64,
    pub split_protein: f64,
    pub split_carbohydrates: f64,
    pub split_fats: f64,
    /// Nested days: [{"day": 1, "meals": [<meal ids>]}]
    pub meals: serde_json::Value,
    pub restrictions: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
    pub is_template: bool,
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_at: OffsetDateTime,
}

const PLAN_COLUMNS: &str = "id, title, goal, target_calories, \
     split_protein, split_carbohydrates, split_fats, \
     meals, restrictions, created_by, is_public, is_template, \
     rating_average, rating_count, created_at";

#[allow(clippy::too_many_arguments)]
pub async fn insert_plan(
    db: &PgPool,
    created_by: Uuid,
    title: &str,
    goal: &str,
    target_calories: f64,
    split: (f64, f64, f64),
    meals: &serde_json::Value,
    restrictions: &serde_json::Value,
    is_public: bool,
) -> anyhow::Result<NutritionPlan> {
    let plan = sqlx::query_as::<_, NutritionPlan>(&format!(
        r#"
        INSERT INTO nutrition_plans
            (title, goal, target_calories, split_protein, split_carbohydrates, split_fats,
             meals, restrictions, created_by, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(goal)
    .bind(target_calories)
    .bind(split.0)
    .bind(split.1)
    .bind(split.2)
    .bind(meals)
    .bind(restrictions)
    .bind(created_by)
    .bind(is_public)
    .fetch_one(db)
    .await?;
    Ok(plan)
}

/// Caller's own plans plus public ones, newest first.
pub async fn list_visible(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<NutritionPlan>> {
    let rows = sqlx::query_as::<_, NutritionPlan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM nutrition_plans
        WHERE created_by = $1 OR is_public
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_plan(db: &PgPool, id: Uuid) -> anyhow::Result<Option<NutritionPlan>> {
    let plan = sqlx::query_as::<_, NutritionPlan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM nutrition_plans
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(plan)
}

pub async fn delete_plan(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM nutrition_plans WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
