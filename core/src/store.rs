use anyhow::Result;
use chrono::NaiveDate;

use crate::models::{AdviceRecord, MealEntry, MealType, UserGoals};

/// Typed read/write access to wherever meal logs live.
///
/// Implementations carry no business logic. "Nothing there" is an empty
/// result or `None`; an `Err` always means the backend could not be reached
/// or failed, and the engine reports it as `StorageUnavailable`.
///
/// `put_meal_entry` must replace the whole entry for its
/// `(user, date, meal_type)` key atomically. Last write wins.
pub trait MealStore: Send + Sync {
    fn get_meal_entries(&self, user_id: &str, date: NaiveDate) -> Result<Vec<MealEntry>>;
    fn put_meal_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        entry: &MealEntry,
    ) -> Result<()>;
    fn get_goals(&self, user_id: &str) -> Result<Option<UserGoals>>;
    fn put_goals(&self, user_id: &str, goals: &UserGoals) -> Result<()>;
    fn put_advice(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        advice: &str,
    ) -> Result<()>;
    fn get_advice(&self, user_id: &str, date: NaiveDate) -> Result<Vec<AdviceRecord>>;
}
