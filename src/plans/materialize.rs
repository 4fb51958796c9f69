use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::foods;
use crate::genai::{extract_json_block, TextGenerator};
use crate::plans::dto::{
    CreatedMealSummary, FailedMeal, MacroSplit, Recommendation, RecommendationSource,
    RecommendedFood, RecommendedMeal,
};
use crate::plans::repo;

/// Result of turning a recommendation into persisted meals. Per-meal failures
/// are first-class data, not exceptions: the request succeeds as long as the
/// plan itself can be written.
#[derive(Debug, Default)]
pub struct MaterializeOutcome {
    pub succeeded: Vec<CreatedMealSummary>,
    pub failed: Vec<FailedMeal>,
}

pub fn recommendation_prompt(
    goal: &str,
    restrictions: &[String],
    target_calories: f64,
    meal_count: u32,
) -> String {
    let restrictions_line = if restrictions.is_empty() {
        "none".to_string()
    } else {
        restrictions.join(", ")
    };
    format!(
        "Design a one-day nutrition plan for the goal \"{goal}\" at about \
         {target_calories:.0} kcal across {meal_count} meals. Dietary \
         restrictions: {restrictions_line}.\n\
         Respond with EXACTLY ONE JSON object and no other text, shaped as:\n\
         {{\"macroSplit\": {{\"protein\": <pct>, \"carbohydrates\": <pct>, \"fats\": <pct>}}, \
         \"meals\": [{{\"name\": \"<meal name>\", \"type\": \
         \"<breakfast|lunch|dinner|snack>\", \"foods\": [{{\"name\": \"<food>\", \
         \"calories\": <kcal>, \"quantity\": <number>, \"unit\": \"<g|ml|piece>\"}}], \
         \"totalCalories\": <kcal>}}].\n\
         Use realistic foods and calorie figures. Do not wrap the JSON in \
         markdown fences."
    )
}

/// Deterministic recommendation used when the text service is unreachable or
/// returns something unusable: fixed 30/40/30 split, three meals of three
/// foods, calories apportioned from the target.
pub fn builtin_recommendation(target_calories: f64) -> Recommendation {
    fn meal(
        name: &str,
        meal_type: &str,
        share: f64,
        target: f64,
        foods: [(&str, f64); 3],
    ) -> RecommendedMeal {
        let total = target * share;
        RecommendedMeal {
            name: name.to_string(),
            meal_type: meal_type.to_string(),
            foods: foods
                .iter()
                .map(|(food, portion)| RecommendedFood {
                    name: food.to_string(),
                    calories: (total * portion).round(),
                    quantity: Some(1.0),
                    unit: Some("serving".to_string()),
                })
                .collect(),
            total_calories: total.round(),
        }
    }

    Recommendation {
        macro_split: MacroSplit {
            protein: 30.0,
            carbohydrates: 40.0,
            fats: 30.0,
        },
        meals: vec![
            meal(
                "Oatmeal Power Breakfast",
                "breakfast",
                0.30,
                target_calories,
                [
                    ("Rolled oats with milk", 0.5),
                    ("Banana", 0.25),
                    ("Peanut butter", 0.25),
                ],
            ),
            meal(
                "Grilled Chicken Lunch",
                "lunch",
                0.40,
                target_calories,
                [
                    ("Grilled chicken breast", 0.4),
                    ("Brown rice", 0.4),
                    ("Steamed broccoli", 0.2),
                ],
            ),
            meal(
                "Salmon Dinner",
                "dinner",
                0.30,
                target_calories,
                [
                    ("Baked salmon fillet", 0.5),
                    ("Quinoa", 0.3),
                    ("Mixed green salad", 0.2),
                ],
            ),
        ],
    }
}

/// Asks the text service for a plan; falls back to the built-in
/// recommendation on any upstream or parse failure. The same fail-closed
/// discipline as image classification: garbage is never half-trusted.
pub async fn fetch_recommendation(
    advisor: &dyn TextGenerator,
    goal: &str,
    restrictions: &[String],
    target_calories: f64,
    meal_count: u32,
) -> (Recommendation, RecommendationSource) {
    let prompt = recommendation_prompt(goal, restrictions, target_calories, meal_count);
    let raw = match advisor.generate(&prompt, None).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "recommendation service unavailable, using builtin plan");
            return (
                builtin_recommendation(target_calories),
                RecommendationSource::Builtin,
            );
        }
    };

    let parsed = extract_json_block(&raw)
        .and_then(|block| serde_json::from_str::<Recommendation>(block).ok())
        .filter(|rec| !rec.meals.is_empty());

    match parsed {
        Some(rec) => (rec, RecommendationSource::Service),
        None => {
            warn!("recommendation response unparseable, using builtin plan");
            (
                builtin_recommendation(target_calories),
                RecommendationSource::Builtin,
            )
        }
    }
}

/// Structural check applied before any writes for a meal.
pub fn validate_meal(meal: &RecommendedMeal) -> Result<(), String> {
    if meal.name.trim().is_empty() {
        return Err("meal name is empty".into());
    }
    if meal.foods.is_empty() {
        return Err("meal has no foods".into());
    }
    if meal.foods.iter().any(|f| f.name.trim().is_empty()) {
        return Err("meal contains an unnamed food".into());
    }
    Ok(())
}

/// Persists one Meal per recommendation meal, resolving each food through
/// find-or-create scoped to the requesting user. A failure inside one meal
/// is logged and recorded; the loop moves on to the next meal.
pub async fn materialize_meals(
    db: &PgPool,
    user_id: Uuid,
    goal: &str,
    recommendation: &Recommendation,
) -> MaterializeOutcome {
    let mut outcome = MaterializeOutcome::default();

    for meal in &recommendation.meals {
        if let Err(reason) = validate_meal(meal) {
            error!(meal = %meal.name, %reason, "skipping invalid recommended meal");
            outcome.failed.push(FailedMeal {
                name: meal.name.clone(),
                error: reason,
            });
            continue;
        }

        match materialize_one(db, user_id, goal, meal).await {
            Ok(summary) => outcome.succeeded.push(summary),
            Err(e) => {
                error!(meal = %meal.name, error = %e, "meal materialization failed");
                outcome.failed.push(FailedMeal {
                    name: meal.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        created = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "plan meals materialized"
    );
    outcome
}

async fn materialize_one(
    db: &PgPool,
    user_id: Uuid,
    goal: &str,
    meal: &RecommendedMeal,
) -> anyhow::Result<CreatedMealSummary> {
    let mut entries = Vec::with_capacity(meal.foods.len());
    let mut food_ids = Vec::with_capacity(meal.foods.len());

    for food in &meal.foods {
        let item = foods::repo::find_or_create(db, user_id, &food.name, food.calories).await?;
        entries.push(json!({
            "food_id": item.id,
            "quantity": food.quantity.unwrap_or(1.0),
            "unit": food.unit.clone().unwrap_or_else(|| "serving".to_string()),
        }));
        food_ids.push(item.id);
    }

    let meal_type = crate::nutrition::dto::meal_type_or_default(Some(&meal.meal_type));
    let tags = json!([goal, meal_type, "ai-generated"]);
    let row = repo::insert_meal(
        db,
        user_id,
        &meal.name,
        meal_type,
        &serde_json::Value::Array(entries),
        meal.total_calories,
        &tags,
    )
    .await?;

    Ok(CreatedMealSummary {
        id: row.id,
        name: row.name,
        meal_type: row.meal_type,
        food_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::{GenAiError, InlineImage};
    use axum::async_trait;

    struct ScriptedAdvisor(Result<String, ()>);

    #[async_trait]
    impl TextGenerator for ScriptedAdvisor {
        async fn generate(
            &self,
            _prompt: &str,
            _image: Option<InlineImage>,
        ) -> Result<String, GenAiError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(GenAiError::Empty),
            }
        }
    }

    #[test]
    fn builtin_recommendation_is_deterministic() {
        let a = builtin_recommendation(2000.0);
        let b = builtin_recommendation(2000.0);
        assert_eq!(a, b);
        assert_eq!(a.meals.len(), 3);
        assert_eq!(a.macro_split.protein, 30.0);
        assert_eq!(a.macro_split.carbohydrates, 40.0);
        assert_eq!(a.macro_split.fats, 30.0);
        let types: Vec<&str> = a.meals.iter().map(|m| m.meal_type.as_str()).collect();
        assert_eq!(types, ["breakfast", "lunch", "dinner"]);
        for meal in &a.meals {
            assert_eq!(meal.foods.len(), 3);
        }
    }

    #[test]
    fn builtin_meal_calories_follow_the_target() {
        let rec = builtin_recommendation(2000.0);
        assert_eq!(rec.meals[0].total_calories, 600.0);
        assert_eq!(rec.meals[1].total_calories, 800.0);
        assert_eq!(rec.meals[2].total_calories, 600.0);
    }

    #[test]
    fn prompt_mentions_goal_restrictions_and_shape() {
        let p = recommendation_prompt(
            "muscle-gain",
            &["vegan".to_string(), "nut-free".to_string()],
            2500.0,
            4,
        );
        assert!(p.contains("muscle-gain"));
        assert!(p.contains("vegan, nut-free"));
        assert!(p.contains("2500 kcal"));
        assert!(p.contains("4 meals"));
        assert!(p.contains("macroSplit"));
        assert!(p.contains("EXACTLY ONE JSON object"));
    }

    #[tokio::test]
    async fn service_recommendation_is_used_when_parseable() {
        let advisor = ScriptedAdvisor(Ok(r#"Here is your plan:
            {"macroSplit": {"protein": 35, "carbohydrates": 35, "fats": 30},
             "meals": [{"name": "Tofu Scramble", "type": "breakfast",
                        "foods": [{"name": "Tofu", "calories": 180}],
                        "totalCalories": 420}]}"#
            .to_string()));
        let (rec, source) =
            fetch_recommendation(&advisor, "health", &[], 2000.0, 3).await;
        assert_eq!(source, RecommendationSource::Service);
        assert_eq!(rec.meals[0].name, "Tofu Scramble");
        assert_eq!(rec.macro_split.protein, 35.0);
    }

    #[tokio::test]
    async fn unparseable_service_output_falls_back_to_builtin() {
        let advisor = ScriptedAdvisor(Ok("I'd recommend eating healthy!".to_string()));
        let (rec, source) =
            fetch_recommendation(&advisor, "health", &[], 1800.0, 3).await;
        assert_eq!(source, RecommendationSource::Builtin);
        assert_eq!(rec, builtin_recommendation(1800.0));
    }

    #[tokio::test]
    async fn empty_meal_list_from_service_falls_back_to_builtin() {
        let advisor = ScriptedAdvisor(Ok(
            r#"{"macroSplit": {"protein": 30, "carbohydrates": 40, "fats": 30}, "meals": []}"#
                .to_string(),
        ));
        let (_, source) = fetch_recommendation(&advisor, "health", &[], 2000.0, 3).await;
        assert_eq!(source, RecommendationSource::Builtin);
    }

    #[tokio::test]
    async fn upstream_error_falls_back_to_builtin() {
        let advisor = ScriptedAdvisor(Err(()));
        let (rec, source) =
            fetch_recommendation(&advisor, "weight-loss", &[], 1500.0, 3).await;
        assert_eq!(source, RecommendationSource::Builtin);
        assert_eq!(rec.meals.len(), 3);
    }

    #[tokio::test]
    async fn meal_failures_accumulate_without_aborting() {
        // Lazy pool: any meal that reaches the store fails, which is exactly
        // the partial-failure path under test.
        let state = crate::state::AppState::fake();
        let user_id = Uuid::new_v4();

        let mut rec = builtin_recommendation(2000.0);
        rec.meals[0].name = "".into(); // structurally invalid
        rec.meals[1].foods.clear(); // structurally invalid
                                    // meals[2] is valid and dies on the unreachable store

        let outcome = materialize_meals(&state.db, user_id, "health", &rec).await;
        assert!(outcome.succeeded.is_empty());
        assert_eq!(outcome.failed.len(), 3);
        assert_eq!(outcome.failed[1].name, "Grilled Chicken Lunch");
    }

    #[test]
    fn meal_validation_catches_structural_problems() {
        let mut meal = builtin_recommendation(2000.0).meals[0].clone();
        assert!(validate_meal(&meal).is_ok());

        meal.name = "  ".into();
        assert!(validate_meal(&meal).is_err());

        let mut no_foods = builtin_recommendation(2000.0).meals[1].clone();
        no_foods.foods.clear();
        assert!(validate_meal(&no_foods).is_err());

        let mut unnamed = builtin_recommendation(2000.0).meals[2].clone();
        unnamed.foods[0].name = "".into();
        assert!(validate_meal(&unnamed).is_err());
    }
}
