use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::foods::Nutrients;

/// Macro targets tracked against the day's totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
}

impl Default for Macros {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbohydrates: 250.0,
            fats: 65.0,
        }
    }
}

/// Partial target update; absent or zero fields keep their previous value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TargetsPatch {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
}

/// One ledger row per (user, local day).
#[derive(Debug, Clone, FromRow)]
pub struct DailyIntake {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day: Date,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbohydrates: f64,
    pub total_fats: f64,
    pub total_fiber: f64,
    pub total_sugar: f64,
    pub total_sodium: f64,
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbohydrates: f64,
    pub target_fats: f64,
    pub consumed_foods: serde_json::Value,
    pub updated_at: OffsetDateTime,
}

impl DailyIntake {
    pub fn totals(&self) -> Nutrients {
        Nutrients {
            calories: self.total_calories,
            protein: self.total_protein,
            carbohydrates: self.total_carbohydrates,
            fats: self.total_fats,
            fiber: self.total_fiber,
            sugar: self.total_sugar,
            sodium: self.total_sodium,
        }
    }

    pub fn targets(&self) -> Macros {
        Macros {
            calories: self.target_calories,
            protein: self.target_protein,
            carbohydrates: self.target_carbohydrates,
            fats: self.target_fats,
        }
    }
}

/// Consumed/target ratio in percent per macro. Pure function of the stored
/// document; never persisted. A non-positive target yields 0 rather than
/// infinity (unreachable through the API, which rejects non-positive targets).
pub fn progress(totals: &Nutrients, targets: &Macros) -> Macros {
    fn pct(consumed: f64, target: f64) -> f64 {
        if target > 0.0 {
            consumed / target * 100.0
        } else {
            0.0
        }
    }
    Macros {
        calories: pct(totals.calories, targets.calories),
        protein: pct(totals.protein, targets.protein),
        carbohydrates: pct(totals.carbohydrates, targets.carbohydrates),
        fats: pct(totals.fats, targets.fats),
    }
}

/// Pure mirror of the CASE arithmetic in `update_targets`: a patch value is
/// applied only when it is greater than zero. Kept next to the SQL so the
/// retained-on-zero behaviour stays pinned by tests.
pub fn apply_targets_patch(current: Macros, patch: &TargetsPatch) -> Macros {
    fn pick(current: f64, patch: Option<f64>) -> f64 {
        match patch {
            Some(v) if v > 0.0 => v,
            _ => current,
        }
    }
    Macros {
        calories: pick(current.calories, patch.calories),
        protein: pick(current.protein, patch.protein),
        carbohydrates: pick(current.carbohydrates, patch.carbohydrates),
        fats: pick(current.fats, patch.fats),
    }
}

/// Target minus consumed, clamped at zero.
pub fn remaining(totals: &Nutrients, targets: &Macros) -> Macros {
    Macros {
        calories: (targets.calories - totals.calories).max(0.0),
        protein: (targets.protein - totals.protein).max(0.0),
        carbohydrates: (targets.carbohydrates - totals.carbohydrates).max(0.0),
        fats: (targets.fats - totals.fats).max(0.0),
    }
}

const COLUMNS: &str = "id, user_id, day, \
     total_calories, total_protein, total_carbohydrates, total_fats, \
     total_fiber, total_sugar, total_sodium, \
     target_calories, target_protein, target_carbohydrates, target_fats, \
     consumed_foods, updated_at";

/// Appends one consumed entry and bumps the running totals in a single
/// statement. The unique (user_id, day) index plus ON CONFLICT arithmetic
/// makes concurrent calls serialize in the store instead of racing a
/// read-modify-write cycle. Targets on a fresh row come from the column
/// defaults (2000/150/250/65).
pub async fn add_consumed_food(
    db: &PgPool,
    user_id: Uuid,
    day: Date,
    nutrients: &Nutrients,
    entry: &serde_json::Value,
) -> anyhow::Result<DailyIntake> {
    let appended = serde_json::Value::Array(vec![entry.clone()]);
    let row = sqlx::query_as::<_, DailyIntake>(&format!(
        r#"
        INSERT INTO daily_intake
            (user_id, day,
             total_calories, total_protein, total_carbohydrates, total_fats,
             total_fiber, total_sugar, total_sodium,
             consumed_foods)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id, day) DO UPDATE SET
            total_calories      = daily_intake.total_calories      + EXCLUDED.total_calories,
            total_protein       = daily_intake.total_protein       + EXCLUDED.total_protein,
            total_carbohydrates = daily_intake.total_carbohydrates + EXCLUDED.total_carbohydrates,
            total_fats          = daily_intake.total_fats          + EXCLUDED.total_fats,
            total_fiber         = daily_intake.total_fiber         + EXCLUDED.total_fiber,
            total_sugar         = daily_intake.total_sugar         + EXCLUDED.total_sugar,
            total_sodium        = daily_intake.total_sodium        + EXCLUDED.total_sodium,
            consumed_foods      = daily_intake.consumed_foods      || EXCLUDED.consumed_foods,
            updated_at          = now()
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(day)
    .bind(nutrients.calories)
    .bind(nutrients.protein)
    .bind(nutrients.carbohydrates)
    .bind(nutrients.fats)
    .bind(nutrients.fiber)
    .bind(nutrients.sugar)
    .bind(nutrients.sodium)
    .bind(&appended)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn fetch_day(
    db: &PgPool,
    user_id: Uuid,
    day: Date,
) -> anyhow::Result<Option<DailyIntake>> {
    let row = sqlx::query_as::<_, DailyIntake>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM daily_intake
        WHERE user_id = $1 AND day = $2
        "#
    ))
    .bind(user_id)
    .bind(day)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Upserts today's targets. A target is only replaced when the patch carries
/// a value greater than zero; zero or absent keeps the previous value — the
/// behaviour the mobile clients rely on, locked in by tests.
pub async fn update_targets(
    db: &PgPool,
    user_id: Uuid,
    day: Date,
    patch: &TargetsPatch,
) -> anyhow::Result<DailyIntake> {
    let defaults = Macros::default();
    let row = sqlx::query_as::<_, DailyIntake>(&format!(
        r#"
        INSERT INTO daily_intake
            (user_id, day, target_calories, target_protein, target_carbohydrates, target_fats)
        VALUES ($1, $2,
                COALESCE(NULLIF($3, 0::float8), $7),
                COALESCE(NULLIF($4, 0::float8), $8),
                COALESCE(NULLIF($5, 0::float8), $9),
                COALESCE(NULLIF($6, 0::float8), $10))
        ON CONFLICT (user_id, day) DO UPDATE SET
            target_calories      = CASE WHEN $3 > 0 THEN $3 ELSE daily_intake.target_calories      END,
            target_protein       = CASE WHEN $4 > 0 THEN $4 ELSE daily_intake.target_protein       END,
            target_carbohydrates = CASE WHEN $5 > 0 THEN $5 ELSE daily_intake.target_carbohydrates END,
            target_fats          = CASE WHEN $6 > 0 THEN $6 ELSE daily_intake.target_fats          END,
            updated_at           = now()
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(day)
    .bind(patch.calories)
    .bind(patch.protein)
    .bind(patch.carbohydrates)
    .bind(patch.fats)
    .bind(defaults.calories)
    .bind(defaults.protein)
    .bind(defaults.carbohydrates)
    .bind(defaults.fats)
    .fetch_one(db)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banana() -> Nutrients {
        Nutrients {
            calories: 105.0,
            protein: 1.1,
            carbohydrates: 27.0,
            fats: 0.3,
            ..Default::default()
        }
    }

    #[test]
    fn banana_against_empty_day() {
        let totals = Nutrients::default().add(&banana());
        let targets = Macros::default();

        assert_eq!(totals.calories, 105.0);
        assert_eq!(totals.fiber, 0.0);
        assert_eq!(totals.sodium, 0.0);

        let p = progress(&totals, &targets);
        assert!((p.calories - 5.25).abs() < 1e-9);

        let r = remaining(&totals, &targets);
        assert_eq!(r.calories, 1895.0);
    }

    #[test]
    fn sequential_adds_accumulate() {
        let v1 = banana();
        let v2 = Nutrients {
            calories: 350.0,
            protein: 30.0,
            carbohydrates: 12.0,
            fats: 18.0,
            fiber: 1.0,
            sugar: 2.0,
            sodium: 500.0,
        };
        let totals = Nutrients::default().add(&v1).add(&v2);
        let expected = v1.add(&v2);
        assert_eq!(totals, expected);
    }

    #[test]
    fn remaining_clamps_at_zero_when_over_target() {
        let totals = Nutrients {
            calories: 2500.0,
            protein: 200.0,
            ..Default::default()
        };
        let r = remaining(&totals, &Macros::default());
        assert_eq!(r.calories, 0.0);
        assert_eq!(r.protein, 0.0);
        assert_eq!(r.carbohydrates, 250.0);
    }

    #[test]
    fn progress_guards_non_positive_targets() {
        let totals = Nutrients {
            calories: 500.0,
            ..Default::default()
        };
        let targets = Macros {
            calories: 0.0,
            protein: -10.0,
            carbohydrates: 250.0,
            fats: 65.0,
        };
        let p = progress(&totals, &targets);
        assert_eq!(p.calories, 0.0);
        assert_eq!(p.protein, 0.0);
        assert_eq!(p.carbohydrates, 0.0);
    }

    #[test]
    fn zero_patch_value_keeps_previous_target() {
        let current = Macros::default();
        let patch = TargetsPatch {
            calories: Some(0.0),
            protein: Some(180.0),
            carbohydrates: None,
            fats: None,
        };
        let next = apply_targets_patch(current, &patch);
        assert_eq!(next.calories, 2000.0);
        assert_eq!(next.protein, 180.0);
        assert_eq!(next.carbohydrates, 250.0);
        assert_eq!(next.fats, 65.0);
    }

    #[test]
    fn derived_views_are_idempotent_reads() {
        let totals = banana();
        let targets = Macros::default();
        assert_eq!(progress(&totals, &targets), progress(&totals, &targets));
        assert_eq!(remaining(&totals, &targets), remaining(&totals, &targets));
    }
}
