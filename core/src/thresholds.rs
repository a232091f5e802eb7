//! Per-meal threshold evaluation.
//!
//! Calories are judged against a per-meal-type share of the daily calorie
//! goal. Protein, carbs and fat are judged against one flat share of their
//! daily goal, whatever the meal type. Both tables are configuration.

use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::models::{
    DailyTotals, MealEntry, MealType, Nutrient, NutrientExcess, ThresholdDecision, UserGoals,
};

/// How far the five calorie shares may drift from 100% in total.
const SHARE_SUM_TOLERANCE: f64 = 5.0;

/// Percentages of the daily goals a single meal may use before it counts as
/// disproportionate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    pub breakfast_pct: f64,
    pub lunch_pct: f64,
    pub dinner_pct: f64,
    pub supper_pct: f64,
    pub snack_pct: f64,
    pub macro_pct: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            breakfast_pct: 20.0,
            lunch_pct: 31.0,
            dinner_pct: 29.0,
            supper_pct: 11.0,
            snack_pct: 9.0,
            macro_pct: 40.0,
        }
    }
}

impl ThresholdConfig {
    #[must_use]
    pub fn calorie_pct(&self, meal_type: MealType) -> f64 {
        match meal_type {
            MealType::Breakfast => self.breakfast_pct,
            MealType::Lunch => self.lunch_pct,
            MealType::Dinner => self.dinner_pct,
            MealType::Supper => self.supper_pct,
            MealType::Snack => self.snack_pct,
        }
    }

    pub fn validate(&self) -> Result<(), CoachError> {
        for meal_type in MealType::ALL {
            let pct = self.calorie_pct(meal_type);
            if !pct.is_finite() || pct <= 0.0 || pct > 100.0 {
                return Err(CoachError::InvalidConfig(format!(
                    "{meal_type} calorie share must be between 0 and 100 (got {pct})"
                )));
            }
        }
        let sum: f64 = MealType::ALL.iter().map(|m| self.calorie_pct(*m)).sum();
        if (sum - 100.0).abs() > SHARE_SUM_TOLERANCE {
            return Err(CoachError::InvalidConfig(format!(
                "Meal calorie shares must sum to about 100 (got {sum})"
            )));
        }
        if !self.macro_pct.is_finite() || self.macro_pct <= 0.0 || self.macro_pct > 100.0 {
            return Err(CoachError::InvalidConfig(format!(
                "Macro share must be between 0 and 100 (got {})",
                self.macro_pct
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    config: ThresholdConfig,
}

impl ThresholdEvaluator {
    pub fn new(config: ThresholdConfig) -> Result<Self, CoachError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Decide whether `entry` warrants a coaching tip.
    ///
    /// A goal that is missing, zero or not finite cannot be evaluated: that
    /// nutrient never triggers and `incomplete_goals` is set. Comparisons
    /// are strict, so a meal that lands exactly on its limit passes.
    #[must_use]
    pub fn evaluate(
        &self,
        meal_type: MealType,
        entry: &MealEntry,
        daily_totals: &DailyTotals,
        goals: Option<&UserGoals>,
    ) -> ThresholdDecision {
        let mut exceeded = Vec::new();
        let mut incomplete_goals = false;

        let checks = [
            (Nutrient::Calories, self.config.calorie_pct(meal_type)),
            (Nutrient::Protein, self.config.macro_pct),
            (Nutrient::Carbs, self.config.macro_pct),
            (Nutrient::Fat, self.config.macro_pct),
        ];

        for (nutrient, pct) in checks {
            let Some(goal) = goals.map(|g| g.goal_for(nutrient)).filter(|g| usable_goal(*g)) else {
                incomplete_goals = true;
                continue;
            };
            let limit = goal * pct / 100.0;
            let actual = entry.amount_of(nutrient);
            if actual > limit {
                exceeded.push(NutrientExcess {
                    nutrient,
                    actual,
                    limit,
                    exceeded_by: actual - limit,
                });
            }
        }

        tracing::debug!(
            meal_type = %meal_type,
            day_calories = daily_totals.calories,
            triggered = exceeded.len(),
            incomplete_goals,
            "threshold evaluation"
        );

        let triggered_nutrients: Vec<Nutrient> = exceeded.iter().map(|e| e.nutrient).collect();
        ThresholdDecision {
            meal_type,
            should_generate_tip: !triggered_nutrients.is_empty(),
            triggered_nutrients,
            incomplete_goals,
            exceeded,
        }
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self {
            config: ThresholdConfig::default(),
        }
    }
}

fn usable_goal(goal: f64) -> bool {
    goal.is_finite() && goal > 0.0
}
