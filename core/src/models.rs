use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoachError;

/// The fixed partition of a day's meals. At most one entry per type per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Supper,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Supper,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Supper => "supper",
            Self::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "supper" => Ok(Self::Supper),
            // The mobile client stored snacks under both spellings.
            "snack" | "snacks" => Ok(Self::Snack),
            _ => Err(CoachError::MalformedMealEntry(format!(
                "Invalid meal type '{s}'. Must be one of: breakfast, lunch, dinner, supper, snack"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
    ];

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Calories => "kcal",
            Self::Protein | Self::Carbs | Self::Fat => "g",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Calories => "Calories",
            Self::Protein => "Protein",
            Self::Carbs => "Carbs",
            Self::Fat => "Fat",
        };
        f.write_str(name)
    }
}

/// Daily targets for one user. A goal that is zero or negative counts as
/// "not configured" when thresholds are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserGoals {
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carb_goal: f64,
    pub fat_goal: f64,
}

impl UserGoals {
    #[must_use]
    pub fn goal_for(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calorie_goal,
            Nutrient::Protein => self.protein_goal,
            Nutrient::Carbs => self.carb_goal,
            Nutrient::Fat => self.fat_goal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub meal_type: MealType,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub energy_rating: u8,
    pub hunger_rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MealEntry {
    #[must_use]
    pub fn amount_of(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
        }
    }
}

/// Nutrient estimate returned by image analysis. Becomes a [`MealEntry`]
/// once the caller supplies the meal type and ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEstimate {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MealEstimate {
    #[must_use]
    pub fn into_entry(self, meal_type: MealType, energy_rating: u8, hunger_rating: u8) -> MealEntry {
        MealEntry {
            meal_type,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            energy_rating,
            hunger_rating,
            description: self.description,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub per_meal_type: BTreeMap<MealType, MealEntry>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyTotals {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            per_meal_type: BTreeMap::new(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
        }
    }

    /// Build totals from raw store rows. If the store ever hands back two
    /// rows for one meal type, the most recent timestamp wins.
    #[must_use]
    pub fn from_entries(date: NaiveDate, entries: Vec<MealEntry>) -> Self {
        let mut per_meal_type: BTreeMap<MealType, MealEntry> = BTreeMap::new();
        for entry in entries {
            match per_meal_type.get(&entry.meal_type) {
                Some(existing) if existing.timestamp > entry.timestamp => {}
                _ => {
                    per_meal_type.insert(entry.meal_type, entry);
                }
            }
        }

        let calories: f64 = per_meal_type.values().map(|e| e.calories).sum();
        let protein: f64 = per_meal_type.values().map(|e| e.protein).sum();
        let carbs: f64 = per_meal_type.values().map(|e| e.carbs).sum();
        let fat: f64 = per_meal_type.values().map(|e| e.fat).sum();

        Self {
            date,
            per_meal_type,
            calories,
            protein,
            carbs,
            fat,
        }
    }

    #[must_use]
    pub fn amount_of(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
        }
    }

    #[must_use]
    pub fn meal_count(&self) -> usize {
        self.per_meal_type.len()
    }
}

/// How far one nutrient of a meal went over its per-meal limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientExcess {
    pub nutrient: Nutrient,
    pub actual: f64,
    pub limit: f64,
    pub exceeded_by: f64,
}

impl fmt::Display for NutrientExcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.nutrient.unit();
        match self.nutrient {
            Nutrient::Calories => write!(f, "{} by {:.0} {unit}", self.nutrient, self.exceeded_by),
            _ => write!(f, "{} by {:.1}{unit}", self.nutrient, self.exceeded_by),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdDecision {
    pub meal_type: MealType,
    pub triggered_nutrients: Vec<Nutrient>,
    pub should_generate_tip: bool,
    /// Set when at least one goal was missing, so the nutrient could not be
    /// evaluated. Lets callers tell "no tip needed" from "no goals set".
    pub incomplete_goals: bool,
    pub exceeded: Vec<NutrientExcess>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoachingContext {
    pub goals: Option<UserGoals>,
    pub today_totals: DailyTotals,
    pub triggered: Vec<NutrientExcess>,
    pub latest_meal: Option<MealEntry>,
}

impl CoachingContext {
    /// Plain-text brief of the actionable signal, e.g.
    /// `"Calories by 50 kcal, Protein by 3.0g"`.
    #[must_use]
    pub fn describe_excess(&self) -> String {
        self.triggered
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Brief used for advice requests: which meal, what went over, and how
    /// the user felt afterwards.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(meal) = &self.latest_meal {
            out.push_str(&format!("My {} ", meal.meal_type));
            if let Some(desc) = &meal.description {
                out.push_str(&format!("({desc}) "));
            }
        } else {
            out.push_str("Today's intake ");
        }
        if self.triggered.is_empty() {
            out.push_str("is within the expected macronutrient targets. ");
        } else {
            out.push_str(&format!(
                "exceeded the expected macronutrient targets: {}. ",
                self.describe_excess()
            ));
        }
        if let Some(meal) = &self.latest_meal {
            out.push_str(&format!(
                "After this meal, my energy level is {}/5 and my hunger level is {}/5. ",
                meal.energy_rating, meal.hunger_rating
            ));
        }
        out.push_str(&format!(
            "So far today: {:.0} kcal, {:.0}g protein, {:.0}g carbs, {:.0}g fat.",
            self.today_totals.calories,
            self.today_totals.protein,
            self.today_totals.carbs,
            self.today_totals.fat
        ));
        out
    }
}

/// A recoverable error attached to an otherwise successful meal log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    InferenceUnavailable { message: String },
    InferenceTimeout { after_ms: u64 },
    AdviceNotRecorded { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoachingResult {
    pub daily_totals: DailyTotals,
    pub decision: ThresholdDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<Advisory>,
}

impl CoachingResult {
    #[must_use]
    pub fn has_recoverable_error(&self) -> bool {
        self.advisory.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRecord {
    pub meal_type: MealType,
    pub advice: String,
    pub created_at: DateTime<Utc>,
}

// --- Validation ---

pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

fn check_amount(name: &str, value: f64) -> Result<(), CoachError> {
    if !value.is_finite() {
        return Err(CoachError::MalformedMealEntry(format!(
            "{name} must be a finite number"
        )));
    }
    if value < 0.0 {
        return Err(CoachError::MalformedMealEntry(format!(
            "{name} must not be negative (got {value})"
        )));
    }
    Ok(())
}

/// Reject entries that must never reach the store: negative or non-finite
/// nutrients and ratings outside 1-5.
pub fn validate_meal_entry(entry: &MealEntry) -> Result<(), CoachError> {
    check_amount("calories", entry.calories)?;
    check_amount("protein", entry.protein)?;
    check_amount("carbs", entry.carbs)?;
    check_amount("fat", entry.fat)?;
    validate_rating("energy_rating", entry.energy_rating)?;
    validate_rating("hunger_rating", entry.hunger_rating)?;
    Ok(())
}

pub fn validate_estimate(estimate: &MealEstimate) -> Result<(), CoachError> {
    check_amount("calories", estimate.calories)?;
    check_amount("protein", estimate.protein)?;
    check_amount("carbs", estimate.carbs)?;
    check_amount("fat", estimate.fat)?;
    Ok(())
}

pub fn validate_rating(name: &str, rating: u8) -> Result<(), CoachError> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(CoachError::MalformedMealEntry(format!(
            "{name} must be between 1 and 5 (got {rating})"
        )))
    }
}

/// Goals written through `update_goals` must all be positive and finite.
pub fn validate_goals(goals: &UserGoals) -> Result<(), CoachError> {
    let fields = [
        ("calorie_goal", goals.calorie_goal),
        ("protein_goal", goals.protein_goal),
        ("carb_goal", goals.carb_goal),
        ("fat_goal", goals.fat_goal),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoachError::InvalidGoals(format!(
                "{name} must be greater than 0 (got {value})"
            )));
        }
    }
    Ok(())
}
