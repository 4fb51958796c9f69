use serde::{Deserialize, Serialize};
use time::Date;

use crate::foods::dto::FoodResponse;
use crate::foods::Nutrients;
use crate::nutrition::analyze::FoodAnalysis;
use crate::nutrition::intake::{DailyIntake, Macros, TargetsPatch};

pub const MEAL_TYPES: [&str; 4] = ["breakfast", "lunch", "dinner", "snack"];

/// Unknown or absent meal types collapse to "snack".
pub fn meal_type_or_default(raw: Option<&str>) -> &'static str {
    match raw.map(|s| s.trim().to_lowercase()) {
        Some(s) => MEAL_TYPES
            .iter()
            .find(|t| **t == s)
            .copied()
            .unwrap_or("snack"),
        None => "snack",
    }
}

#[derive(Debug, Deserialize)]
pub struct AddFoodRequest {
    pub food_name: String,
    pub nutrients: Nutrients,
    #[serde(default)]
    pub meal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TargetsRequest {
    #[serde(flatten)]
    pub patch: TargetsPatch,
}

/// Totals, targets and the derived views for one calendar day.
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub date: Date,
    pub totals: Nutrients,
    pub targets: Macros,
    pub progress: Macros,
    pub remaining: Macros,
    pub consumed_foods: serde_json::Value,
}

impl IntakeResponse {
    pub fn from_row(row: DailyIntake) -> Self {
        let totals = row.totals();
        let targets = row.targets();
        Self {
            date: row.day,
            progress: crate::nutrition::intake::progress(&totals, &targets),
            remaining: crate::nutrition::intake::remaining(&totals, &targets),
            totals,
            targets,
            consumed_foods: row.consumed_foods,
        }
    }

    /// Read-time default for a day with no persisted record: all-zero totals
    /// against default targets. Nothing is written.
    pub fn empty(date: Date) -> Self {
        let totals = Nutrients::default();
        let targets = Macros::default();
        Self {
            date,
            progress: crate::nutrition::intake::progress(&totals, &targets),
            remaining: crate::nutrition::intake::remaining(&totals, &targets),
            totals,
            targets,
            consumed_foods: serde_json::Value::Array(vec![]),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeFoodRequest {
    pub image_base64: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeFoodResponse {
    pub food: FoodResponse,
    pub analysis: FoodAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_defaults_to_snack() {
        assert_eq!(meal_type_or_default(None), "snack");
        assert_eq!(meal_type_or_default(Some("BREAKFAST")), "breakfast");
        assert_eq!(meal_type_or_default(Some("brunch")), "snack");
        assert_eq!(meal_type_or_default(Some("dinner")), "dinner");
    }

    #[test]
    fn empty_response_has_zero_totals_and_default_targets() {
        let r = IntakeResponse::empty(time::macros::date!(2024 - 03 - 10));
        assert_eq!(r.totals.calories, 0.0);
        assert_eq!(r.targets.calories, 2000.0);
        assert_eq!(r.remaining.calories, 2000.0);
        assert_eq!(r.progress.calories, 0.0);
    }

    #[test]
    fn targets_request_flattens_macros() {
        let r: TargetsRequest = serde_json::from_str(r#"{"calories": 1800, "fats": 70}"#).unwrap();
        assert_eq!(r.patch.calories, Some(1800.0));
        assert_eq!(r.patch.protein, None);
        assert_eq!(r.patch.fats, Some(70.0));
    }
}
