use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EXERCISE_CATEGORIES: [&str; 5] =
    ["strength", "cardio", "flexibility", "balance", "plyometric"];

pub const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];

pub fn validate_category(raw: &str) -> Option<&'static str> {
    let wanted = raw.trim().to_lowercase();
    EXERCISE_CATEGORIES.iter().find(|c| **c == wanted).copied()
}

pub fn validate_difficulty(raw: &str) -> Option<&'static str> {
    let wanted = raw.trim().to_lowercase();
    DIFFICULTIES.iter().find(|d| **d == wanted).copied()
}

#[derive(Debug, Deserialize)]
pub struct ExerciseQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
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

/// One exercise occurrence inside a workout, with per-occurrence overrides.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub exercise_id: Uuid,
    pub sets: i32,
    pub reps: i32,
    pub rest_seconds: i32,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: String,
    pub duration_minutes: i32,
    pub exercises: Vec<WorkoutEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_and_difficulty_validation() {
        assert_eq!(validate_category("Strength"), Some("strength"));
        assert_eq!(validate_category("yoga"), None);
        assert_eq!(validate_difficulty("ADVANCED"), Some("advanced"));
        assert_eq!(validate_difficulty("expert"), None);
    }
}
