use crate::models::{CoachingContext, DailyTotals, MealEntry, ThresholdDecision, UserGoals};

/// Builds the payload handed to the inference service.
///
/// Pure transformation. The orchestrator only calls `build_context` for
/// decisions with `should_generate_tip` set, so an untriggered meal never
/// costs an inference call.
pub struct ContextBuilder;

impl ContextBuilder {
    /// Context for a meal-specific tip. Only the nutrients that exceeded
    /// their threshold are carried forward.
    #[must_use]
    pub fn build_context(
        decision: &ThresholdDecision,
        daily_totals: &DailyTotals,
        goals: Option<&UserGoals>,
        entry: &MealEntry,
    ) -> CoachingContext {
        CoachingContext {
            goals: goals.copied(),
            today_totals: daily_totals.clone(),
            triggered: decision.exceeded.clone(),
            latest_meal: Some(entry.clone()),
        }
    }

    /// Context for free-form chat: today's totals and goals, no trigger.
    #[must_use]
    pub fn build_chat_context(daily_totals: DailyTotals, goals: Option<UserGoals>) -> CoachingContext {
        CoachingContext {
            goals,
            today_totals: daily_totals,
            triggered: Vec::new(),
            latest_meal: None,
        }
    }
}
