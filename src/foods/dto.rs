use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::foods::repo::FoodItem;

/// The seven-field nutrient vector. Absent fields deserialize to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Nutrients {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub sodium: f64,
}

impl Nutrients {
    pub fn add(&self, other: &Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbohydrates: self.carbohydrates + other.carbohydrates,
            fats: self.fats + other.fats,
            fiber: self.fiber + other.fiber,
            sugar: self.sugar + other.sugar,
            sodium: self.sodium + other.sodium,
        }
    }

    pub fn is_non_negative(&self) -> bool {
        [
            self.calories,
            self.protein,
            self.carbohydrates,
            self.fats,
            self.fiber,
            self.sugar,
            self.sodium,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Negative or non-finite components dropped to 0.
    pub fn clamped(&self) -> Nutrients {
        fn clamp(v: f64) -> f64 {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                0.0
            }
        }
        Nutrients {
            calories: clamp(self.calories),
            protein: clamp(self.protein),
            carbohydrates: clamp(self.carbohydrates),
            fats: clamp(self.fats),
            fiber: clamp(self.fiber),
            sugar: clamp(self.sugar),
            sodium: clamp(self.sodium),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodCategory {
    Protein,
    Carbohydrate,
    Vegetable,
    Fruit,
    Dairy,
    Fat,
    Beverage,
    Snack,
}

impl FoodCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Protein => "protein",
            FoodCategory::Carbohydrate => "carbohydrate",
            FoodCategory::Vegetable => "vegetable",
            FoodCategory::Fruit => "fruit",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Fat => "fat",
            FoodCategory::Beverage => "beverage",
            FoodCategory::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<FoodCategory> {
        match s.trim().to_lowercase().as_str() {
            "protein" => Some(FoodCategory::Protein),
            "carbohydrate" | "carbs" | "grain" => Some(FoodCategory::Carbohydrate),
            "vegetable" => Some(FoodCategory::Vegetable),
            "fruit" => Some(FoodCategory::Fruit),
            "dairy" => Some(FoodCategory::Dairy),
            "fat" => Some(FoodCategory::Fat),
            "beverage" | "drink" => Some(FoodCategory::Beverage),
            "snack" => Some(FoodCategory::Snack),
            _ => None,
        }
    }

    /// Classifier output is untrusted; unknown categories collapse to protein.
    pub fn parse_or_default(s: &str) -> FoodCategory {
        Self::parse(s).unwrap_or(FoodCategory::Protein)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServingSize {
    pub amount: f64,
    pub unit: String,
}

impl Default for ServingSize {
    fn default() -> Self {
        Self {
            amount: 100.0,
            unit: "g".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFoodRequest {
    pub name: String,
    pub category: String,
    pub nutrients: Nutrients,
    #[serde(default)]
    pub serving_size: Option<ServingSize>,
}

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct FoodResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub nutrients: Nutrients,
    pub serving_size: ServingSize,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

impl From<FoodItem> for FoodResponse {
    fn from(f: FoodItem) -> Self {
        Self {
            id: f.id,
            name: f.name,
            category: f.category,
            nutrients: Nutrients {
                calories: f.calories,
                protein: f.protein,
                carbohydrates: f.carbohydrates,
                fats: f.fats,
                fiber: f.fiber,
                sugar: f.sugar,
                sodium: f.sodium,
            },
            serving_size: ServingSize {
                amount: f.serving_amount,
                unit: f.serving_unit,
            },
            is_custom: f.is_custom,
            created_by: f.created_by,
            created_at: f.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutrients_accumulate_componentwise() {
        let v1 = Nutrients {
            calories: 105.0,
            protein: 1.1,
            carbohydrates: 27.0,
            fats: 0.3,
            ..Default::default()
        };
        let v2 = Nutrients {
            calories: 200.0,
            protein: 10.0,
            carbohydrates: 5.0,
            fats: 8.0,
            fiber: 2.0,
            sugar: 1.0,
            sodium: 300.0,
        };
        let sum = v1.add(&v2);
        assert_eq!(sum.calories, 305.0);
        assert_eq!(sum.protein, 11.1);
        assert_eq!(sum.carbohydrates, 32.0);
        assert_eq!(sum.fats, 8.3);
        assert_eq!(sum.fiber, 2.0);
        assert_eq!(sum.sugar, 1.0);
        assert_eq!(sum.sodium, 300.0);
    }

    #[test]
    fn missing_fields_deserialize_to_zero() {
        let v: Nutrients = serde_json::from_str(r#"{"calories": 105, "protein": 1.1}"#).unwrap();
        assert_eq!(v.calories, 105.0);
        assert_eq!(v.fiber, 0.0);
        assert_eq!(v.sodium, 0.0);
    }

    #[test]
    fn non_negative_check() {
        assert!(Nutrients::default().is_non_negative());
        let bad = Nutrients {
            protein: -1.0,
            ..Default::default()
        };
        assert!(!bad.is_non_negative());
        assert_eq!(bad.clamped().protein, 0.0);
    }

    #[test]
    fn category_parse_and_fallback() {
        assert_eq!(FoodCategory::parse("Fruit"), Some(FoodCategory::Fruit));
        assert_eq!(FoodCategory::parse("grain"), Some(FoodCategory::Carbohydrate));
        assert_eq!(FoodCategory::parse("mystery"), None);
        assert_eq!(
            FoodCategory::parse_or_default("mystery"),
            FoodCategory::Protein
        );
    }
}
