use chrono::NaiveDate;

use crate::error::{CoachError, Result};
use crate::models::DailyTotals;
use crate::store::MealStore;

/// Recomputes a user's totals for one day straight from the store.
///
/// Nothing is cached: every call reads the full set of entries, so edits
/// from other sessions show up without invalidation and totals cannot drift
/// from the logged meals.
pub struct DailyAggregator<'a, S: MealStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MealStore + ?Sized> DailyAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn compute_daily_totals(&self, user_id: &str, date: NaiveDate) -> Result<DailyTotals> {
        let entries = self
            .store
            .get_meal_entries(user_id, date)
            .map_err(CoachError::storage)?;
        let totals = DailyTotals::from_entries(date, entries);
        tracing::debug!(
            user_id,
            %date,
            meals = totals.meal_count(),
            calories = totals.calories,
            "computed daily totals"
        );
        Ok(totals)
    }
}
