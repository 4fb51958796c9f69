use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::foods::dto::{FoodCategory, Nutrients, ServingSize};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub serving_amount: f64,
    pub serving_unit: String,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, category, calories, protein, carbohydrates, fats, \
     fiber, sugar, sodium, serving_amount, serving_unit, is_custom, created_by, created_at";

pub async fn insert(
    db: &PgPool,
    created_by: Option<Uuid>,
    name: &str,
    category: FoodCategory,
    nutrients: &Nutrients,
    serving: &ServingSize,
    is_custom: bool,
) -> anyhow::Result<FoodItem> {
    let item = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        INSERT INTO food_items
            (name, category, calories, protein, carbohydrates, fats, fiber, sugar, sodium,
             serving_amount, serving_unit, is_custom, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(name)
    .bind(category.as_str())
    .bind(nutrients.calories)
    .bind(nutrients.protein)
    .bind(nutrients.carbohydrates)
    .bind(nutrients.fats)
    .bind(nutrients.fiber)
    .bind(nutrients.sugar)
    .bind(nutrients.sodium)
    .bind(serving.amount)
    .bind(&serving.unit)
    .bind(is_custom)
    .bind(created_by)
    .fetch_one(db)
    .await?;
    Ok(item)
}

/// Case-insensitive name lookup scoped to the creating user; creates a custom
/// item on miss. Recommendation payloads only carry calories, so newly created
/// items get a zeroed remainder of the nutrient vector.
pub async fn find_or_create(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    calories: f64,
) -> anyhow::Result<FoodItem> {
    let existing = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM food_items
        WHERE created_by = $1 AND name ILIKE '%' || $2 || '%'
        ORDER BY created_at ASC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .bind(name)
    .fetch_optional(db)
    .await?;

    if let Some(item) = existing {
        return Ok(item);
    }

    let nutrients = Nutrients {
        calories: calories.max(0.0),
        ..Default::default()
    };
    insert(
        db,
        Some(user_id),
        name,
        FoodCategory::Protein,
        &nutrients,
        &ServingSize::default(),
        true,
    )
    .await
}

/// Built-in catalog plus the caller's own custom items.
pub async fn search_visible(
    db: &PgPool,
    user_id: Uuid,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM food_items
        WHERE (NOT is_custom OR created_by = $1)
          AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
        ORDER BY name ASC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(user_id)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
