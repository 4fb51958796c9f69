use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::plans::repo::NutritionPlan;

pub const GOALS: [&str; 6] = [
    "weight-loss",
    "weight-gain",
    "maintenance",
    "muscle-gain",
    "performance",
    "health",
];

pub const RESTRICTIONS: [&str; 9] = [
    "vegetarian",
    "vegan",
    "gluten-free",
    "dairy-free",
    "nut-free",
    "low-sodium",
    "low-carb",
    "keto",
    "paleo",
];

/// Canonical goal string, or `None` for anything off the list.
pub fn validate_goal(raw: &str) -> Option<&'static str> {
    let wanted = raw.trim().to_lowercase();
    GOALS.iter().find(|g| **g == wanted).copied()
}

/// Unknown restrictions are silently dropped, never rejected.
pub fn filter_restrictions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| RESTRICTIONS.contains(&r.as_str()))
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub goal: String,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub target_calories: Option<f64>,
    #[serde(default)]
    pub meal_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFood {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedMeal {
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: String,
    pub foods: Vec<RecommendedFood>,
    #[serde(default)]
    pub total_calories: f64,
}

/// Recommendation payload: produced by the text service or, when that call
/// fails or returns garbage, by the deterministic built-in generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub macro_split: MacroSplit,
    pub meals: Vec<RecommendedMeal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Service,
    Builtin,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSource::Service => "service",
            RecommendationSource::Builtin => "builtin",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedMealSummary {
    pub id: Uuid,
    pub name: String,
    pub meal_type: String,
    pub food_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedMeal {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendation: Recommendation,
    pub recommendation_source: &'static str,
    pub plan_id: Uuid,
    pub created_meals: Vec<CreatedMealSummary>,
    pub meals_attempted: usize,
    pub meals_created: usize,
    pub failed_meals: Vec<FailedMeal>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PlanDay {
    pub day: i32,
    pub meals: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub title: String,
    pub goal: String,
    pub target_calories: f64,
    pub macro_split: MacroSplit,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub meals: Vec<PlanDay>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: Uuid,
    pub title: String,
    pub goal: String,
    pub target_calories: f64,
    pub macro_split: MacroSplit,
    pub meals: serde_json::Value,
    pub restrictions: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
    pub is_template: bool,
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_at: OffsetDateTime,
}

impl From<NutritionPlan> for PlanResponse {
    fn from(p: NutritionPlan) -> Self {
        Self {
            id: p.id,
            title: p.title,
            goal: p.goal,
            target_calories: p.target_calories,
            macro_split: MacroSplit {
                protein: p.split_protein,
                carbohydrates: p.split_carbohydrates,
                fats: p.split_fats,
            },
            meals: p.meals,
            restrictions: p.restrictions,
            created_by: p.created_by,
            is_public: p.is_public,
            is_template: p.is_template,
            rating_average: p.rating_average,
            rating_count: p.rating_count,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_validation_is_case_insensitive() {
        assert_eq!(validate_goal("Muscle-Gain"), Some("muscle-gain"));
        assert_eq!(validate_goal(" health "), Some("health"));
        assert_eq!(validate_goal("get-swole"), None);
        assert_eq!(validate_goal(""), None);
    }

    #[test]
    fn unknown_restrictions_are_dropped_silently() {
        let input = vec![
            "vegan".to_string(),
            "carnivore".to_string(),
            "GLUTEN-FREE".to_string(),
            "".to_string(),
        ];
        let filtered = filter_restrictions(&input);
        assert_eq!(filtered, vec!["vegan".to_string(), "gluten-free".to_string()]);
    }

    #[test]
    fn recommendation_round_trips_camel_case() {
        let raw = r#"{
            "macroSplit": {"protein": 30, "carbohydrates": 40, "fats": 30},
            "meals": [{
                "name": "Oatmeal Bowl",
                "type": "breakfast",
                "foods": [{"name": "Oats", "calories": 150, "quantity": 50, "unit": "g"}],
                "totalCalories": 420
            }]
        }"#;
        let rec: Recommendation = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.macro_split.protein, 30.0);
        assert_eq!(rec.meals[0].meal_type, "breakfast");
        assert_eq!(rec.meals[0].total_calories, 420.0);
        assert_eq!(rec.meals[0].foods[0].quantity, Some(50.0));

        let json = serde_json::to_value(&rec).unwrap();
        assert!(json["macroSplit"].is_object());
        assert_eq!(json["meals"][0]["type"], "breakfast");
        assert_eq!(json["meals"][0]["totalCalories"], 420.0);
    }

    #[test]
    fn recommended_food_defaults() {
        let food: RecommendedFood = serde_json::from_str(r#"{"name": "Rice"}"#).unwrap();
        assert_eq!(food.calories, 0.0);
        assert_eq!(food.quantity, None);
        assert_eq!(food.unit, None);
    }
}
