use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregator::DailyAggregator;
use crate::context::ContextBuilder;
use crate::error::{CoachError, Result};
use crate::inference::InferenceCapability;
use crate::models::{
    Advisory, AdviceRecord, CoachingContext, CoachingResult, DailyTotals, MealEntry, MealEstimate,
    MealType, UserGoals, validate_estimate, validate_goals, validate_meal_entry,
};
use crate::store::MealStore;
use crate::thresholds::{ThresholdConfig, ThresholdEvaluator};

/// Everything the orchestrator needs to know that is not a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoachConfig {
    pub thresholds: ThresholdConfig,
    pub advice_timeout_secs: u64,
    pub chat_timeout_secs: u64,
    pub image_timeout_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            advice_timeout_secs: 120,
            chat_timeout_secs: 120,
            image_timeout_secs: 500,
        }
    }
}

impl CoachConfig {
    /// Checks the threshold table and that every timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        for (name, secs) in [
            ("advice_timeout_secs", self.advice_timeout_secs),
            ("chat_timeout_secs", self.chat_timeout_secs),
            ("image_timeout_secs", self.image_timeout_secs),
        ] {
            if secs == 0 {
                return Err(CoachError::InvalidConfig(format!(
                    "{name} must be at least 1 second"
                )));
            }
        }
        Ok(())
    }
}

/// Entry point for the presentation layer.
///
/// Sequences one meal-logged event: persist, aggregate, evaluate, and only
/// when a nutrient went over its threshold, build a context and ask the
/// inference service for advice. Holds no per-user state between calls.
pub struct CoachingOrchestrator<S: MealStore + ?Sized, I: InferenceCapability + ?Sized> {
    store: Arc<S>,
    inference: Arc<I>,
    evaluator: ThresholdEvaluator,
    advice_timeout: Duration,
    chat_timeout: Duration,
    image_timeout: Duration,
}

impl<S: MealStore + ?Sized, I: InferenceCapability + ?Sized> CoachingOrchestrator<S, I> {
    pub fn new(store: Arc<S>, inference: Arc<I>, config: CoachConfig) -> Result<Self> {
        config.validate()?;
        let evaluator = ThresholdEvaluator::new(config.thresholds)?;
        Ok(Self {
            store,
            inference,
            evaluator,
            advice_timeout: Duration::from_secs(config.advice_timeout_secs),
            chat_timeout: Duration::from_secs(config.chat_timeout_secs),
            image_timeout: Duration::from_secs(config.image_timeout_secs),
        })
    }

    #[must_use]
    pub fn with_advice_timeout(mut self, timeout: Duration) -> Self {
        self.advice_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn thresholds(&self) -> &ThresholdConfig {
        self.evaluator.config()
    }

    #[tracing::instrument(skip(self, entry), fields(calories = entry.calories))]
    pub async fn on_meal_logged(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        entry: MealEntry,
    ) -> Result<CoachingResult> {
        if entry.meal_type != meal_type {
            return Err(CoachError::MalformedMealEntry(format!(
                "Entry is a {} but was logged as {meal_type}",
                entry.meal_type
            )));
        }
        validate_meal_entry(&entry)?;

        // Durable before anything is derived from it.
        self.store
            .put_meal_entry(user_id, date, meal_type, &entry)
            .map_err(CoachError::storage)?;

        let daily_totals = self.daily_totals(user_id, date)?;
        let goals = self.store.get_goals(user_id).map_err(CoachError::storage)?;
        let decision = self
            .evaluator
            .evaluate(meal_type, &entry, &daily_totals, goals.as_ref());

        if !decision.should_generate_tip {
            tracing::info!(
                incomplete_goals = decision.incomplete_goals,
                "meal within limits, no advice requested"
            );
            return Ok(CoachingResult {
                daily_totals,
                decision,
                advice: None,
                advisory: None,
            });
        }

        let context =
            ContextBuilder::build_context(&decision, &daily_totals, goals.as_ref(), &entry);
        tracing::info!(
            triggered = ?decision.triggered_nutrients,
            "meal over threshold, requesting advice"
        );

        let outcome = bounded(self.advice_timeout, self.inference.generate_advice(&context)).await;
        let (advice, advisory) = match outcome {
            Ok(advice) => match self.store.put_advice(user_id, date, meal_type, &advice) {
                Ok(()) => (Some(advice), None),
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "advice generated but not recorded");
                    (
                        Some(advice),
                        Some(Advisory::AdviceNotRecorded {
                            message: format!("{err:#}"),
                        }),
                    )
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "advice generation failed, meal log kept");
                (None, Some(advisory_for(&err)))
            }
        };

        Ok(CoachingResult {
            daily_totals,
            decision,
            advice,
            advisory,
        })
    }

    /// An edit overwrites the entry for its meal type and is evaluated like a
    /// fresh log, which may produce new advice.
    pub async fn edit_meal(
        &self,
        user_id: &str,
        date: NaiveDate,
        entry: MealEntry,
    ) -> Result<CoachingResult> {
        self.on_meal_logged(user_id, date, entry.meal_type, entry).await
    }

    pub fn daily_totals(&self, user_id: &str, date: NaiveDate) -> Result<DailyTotals> {
        DailyAggregator::new(&*self.store).compute_daily_totals(user_id, date)
    }

    /// Macro-aware context for a free-form chat turn. Always built.
    pub fn build_chat_context(&self, user_id: &str, date: NaiveDate) -> Result<CoachingContext> {
        let daily_totals = self.daily_totals(user_id, date)?;
        let goals = self.store.get_goals(user_id).map_err(CoachError::storage)?;
        Ok(ContextBuilder::build_chat_context(daily_totals, goals))
    }

    pub async fn chat(&self, user_id: &str, date: NaiveDate, message: &str) -> Result<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoachError::InvalidRequest(
                "Chat message must not be empty".to_string(),
            ));
        }
        let context = self.build_chat_context(user_id, date)?;
        bounded(
            self.chat_timeout,
            self.inference.generate_chat_reply(&context, message),
        )
        .await
    }

    pub async fn analyze_meal_image(&self, image: &[u8]) -> Result<MealEstimate> {
        if image.is_empty() {
            return Err(CoachError::InvalidRequest("Image must not be empty".to_string()));
        }
        let estimate =
            bounded(self.image_timeout, self.inference.analyze_meal_image(image)).await?;
        validate_estimate(&estimate)?;
        Ok(estimate)
    }

    pub fn update_goals(&self, user_id: &str, goals: &UserGoals) -> Result<()> {
        validate_goals(goals)?;
        self.store
            .put_goals(user_id, goals)
            .map_err(CoachError::storage)
    }

    pub fn goals(&self, user_id: &str) -> Result<Option<UserGoals>> {
        self.store.get_goals(user_id).map_err(CoachError::storage)
    }

    pub fn advice_for(&self, user_id: &str, date: NaiveDate) -> Result<Vec<AdviceRecord>> {
        self.store
            .get_advice(user_id, date)
            .map_err(CoachError::storage)
    }
}

async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CoachError::InferenceUnavailable(err)),
        Err(_) => Err(CoachError::InferenceTimeout(timeout)),
    }
}

fn advisory_for(err: &CoachError) -> Advisory {
    match err {
        CoachError::InferenceTimeout(after) => Advisory::InferenceTimeout {
            after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        },
        other => Advisory::InferenceUnavailable {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Nutrient;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockInference {
        fail: bool,
        delay: Option<Duration>,
        advice_calls: AtomicUsize,
        seen: Mutex<Vec<CoachingContext>>,
    }

    #[async_trait]
    impl InferenceCapability for MockInference {
        async fn generate_advice(&self, context: &CoachingContext) -> anyhow::Result<String> {
            self.advice_calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(context.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("server returned status 502");
            }
            Ok(format!("Go easy next meal: {}", context.describe_excess()))
        }

        async fn generate_chat_reply(
            &self,
            context: &CoachingContext,
            message: &str,
        ) -> anyhow::Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("server returned status 502");
            }
            Ok(format!(
                "{message} -> you are at {:.0} kcal",
                context.today_totals.calories
            ))
        }

        async fn analyze_meal_image(&self, _image: &[u8]) -> anyhow::Result<MealEstimate> {
            if self.fail {
                anyhow::bail!("could not find JSON in model output");
            }
            Ok(MealEstimate {
                calories: 600.0,
                protein: 35.0,
                carbs: 70.0,
                fat: 18.0,
                description: Some("chicken rice".to_string()),
            })
        }
    }

    /// Store whose writes can be switched off, for failure-path tests.
    struct FlakyStore {
        inner: Database,
        fail_meal_writes: bool,
        fail_advice_writes: bool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: Database::open_in_memory().unwrap(),
                fail_meal_writes: false,
                fail_advice_writes: false,
            }
        }
    }

    impl MealStore for FlakyStore {
        fn get_meal_entries(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<Vec<MealEntry>> {
            self.inner.get_meal_entries(user_id, date)
        }
        fn put_meal_entry(
            &self,
            user_id: &str,
            date: NaiveDate,
            meal_type: MealType,
            entry: &MealEntry,
        ) -> anyhow::Result<()> {
            if self.fail_meal_writes {
                anyhow::bail!("document store unreachable");
            }
            self.inner.put_meal_entry(user_id, date, meal_type, entry)
        }
        fn get_goals(&self, user_id: &str) -> anyhow::Result<Option<UserGoals>> {
            self.inner.get_goals(user_id)
        }
        fn put_goals(&self, user_id: &str, goals: &UserGoals) -> anyhow::Result<()> {
            self.inner.put_goals(user_id, goals)
        }
        fn put_advice(
            &self,
            user_id: &str,
            date: NaiveDate,
            meal_type: MealType,
            advice: &str,
        ) -> anyhow::Result<()> {
            if self.fail_advice_writes {
                anyhow::bail!("document store unreachable");
            }
            self.inner.put_advice(user_id, date, meal_type, advice)
        }
        fn get_advice(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<Vec<AdviceRecord>> {
            self.inner.get_advice(user_id, date)
        }
    }

    fn goals() -> UserGoals {
        UserGoals {
            calorie_goal: 2000.0,
            protein_goal: 100.0,
            carb_goal: 250.0,
            fat_goal: 65.0,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn meal(meal_type: MealType, calories: f64, protein: f64) -> MealEntry {
        MealEntry {
            meal_type,
            calories,
            protein,
            carbs: 0.0,
            fat: 0.0,
            energy_rating: 3,
            hunger_rating: 3,
            description: None,
            timestamp: Utc::now(),
        }
    }

    fn coach<S: MealStore>(
        store: S,
        inference: MockInference,
    ) -> (CoachingOrchestrator<S, MockInference>, Arc<MockInference>) {
        let inference = Arc::new(inference);
        let coach =
            CoachingOrchestrator::new(Arc::new(store), inference.clone(), CoachConfig::default())
                .unwrap();
        coach.store().put_goals("alice", &goals()).unwrap();
        (coach, inference)
    }

    #[tokio::test]
    async fn test_breakfast_over_calories_gets_advice() {
        let (coach, inference) = coach(Database::open_in_memory().unwrap(), MockInference::default());

        let result = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Breakfast,
                meal(MealType::Breakfast, 450.0, 30.0),
            )
            .await
            .unwrap();

        assert_eq!(result.decision.triggered_nutrients, vec![Nutrient::Calories]);
        assert!(result.decision.should_generate_tip);
        assert_eq!(result.daily_totals.calories, 450.0);
        assert_eq!(
            result.advice.as_deref(),
            Some("Go easy next meal: Calories by 50 kcal")
        );
        assert!(!result.has_recoverable_error());
        assert_eq!(inference.advice_calls.load(Ordering::SeqCst), 1);

        let seen = inference.seen.lock().unwrap();
        assert_eq!(seen[0].triggered.len(), 1);
        assert_eq!(seen[0].goals, Some(goals()));

        let recorded = coach.advice_for("alice", day()).unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].meal_type, MealType::Breakfast);
    }

    #[tokio::test]
    async fn test_within_limits_skips_inference() {
        let (coach, inference) = coach(Database::open_in_memory().unwrap(), MockInference::default());

        let result = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Lunch,
                meal(MealType::Lunch, 500.0, 30.0),
            )
            .await
            .unwrap();

        assert!(!result.decision.should_generate_tip);
        assert!(result.advice.is_none());
        assert!(result.advisory.is_none());
        assert_eq!(inference.advice_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inference_timeout_keeps_meal_log() {
        let inference = MockInference {
            delay: Some(Duration::from_secs(5)),
            ..MockInference::default()
        };
        let (coach, _) = coach(Database::open_in_memory().unwrap(), inference);
        let coach = coach.with_advice_timeout(Duration::from_millis(20));

        let result = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Breakfast,
                meal(MealType::Breakfast, 450.0, 30.0),
            )
            .await
            .unwrap();

        assert!(result.advice.is_none());
        assert!(result.has_recoverable_error());
        assert_eq!(
            result.advisory,
            Some(Advisory::InferenceTimeout { after_ms: 20 })
        );
        assert_eq!(result.daily_totals.calories, 450.0);
        assert_eq!(result.decision.triggered_nutrients, vec![Nutrient::Calories]);

        let stored = coach.store().get_meal_entries("alice", day()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].calories, 450.0);
        assert!(coach.advice_for("alice", day()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inference_failure_is_advisory() {
        let inference = MockInference {
            fail: true,
            ..MockInference::default()
        };
        let (coach, _) = coach(Database::open_in_memory().unwrap(), inference);

        let result = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Dinner,
                meal(MealType::Dinner, 900.0, 20.0),
            )
            .await
            .unwrap();

        assert!(result.advice.is_none());
        match result.advisory {
            Some(Advisory::InferenceUnavailable { message }) => {
                assert!(message.contains("502"));
            }
            other => panic!("unexpected advisory: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_persist_failure_is_fatal_and_skips_inference() {
        let mut store = FlakyStore::new();
        store.fail_meal_writes = true;
        let (coach, inference) = coach(store, MockInference::default());

        let err = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Breakfast,
                meal(MealType::Breakfast, 900.0, 30.0),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoachError::StorageUnavailable(_)));
        assert_eq!(inference.advice_calls.load(Ordering::SeqCst), 0);
        assert!(coach.store().get_meal_entries("alice", day()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_advice_persist_failure_still_returns_advice() {
        let mut store = FlakyStore::new();
        store.fail_advice_writes = true;
        let (coach, _) = coach(store, MockInference::default());

        let result = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Breakfast,
                meal(MealType::Breakfast, 450.0, 30.0),
            )
            .await
            .unwrap();

        assert!(result.advice.is_some());
        assert!(matches!(
            result.advisory,
            Some(Advisory::AdviceNotRecorded { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_entry_rejected_before_persist() {
        let (coach, _) = coach(Database::open_in_memory().unwrap(), MockInference::default());

        let mut negative = meal(MealType::Snack, 100.0, 5.0);
        negative.fat = -2.0;
        let err = coach
            .on_meal_logged("alice", day(), MealType::Snack, negative)
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::MalformedMealEntry(_)));

        let err = coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Lunch,
                meal(MealType::Snack, 100.0, 5.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::MalformedMealEntry(_)));

        assert!(coach.store().get_meal_entries("alice", day()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_goals_flags_incomplete() {
        let inference = Arc::new(MockInference::default());
        let coach = CoachingOrchestrator::new(
            Arc::new(Database::open_in_memory().unwrap()),
            inference.clone(),
            CoachConfig::default(),
        )
        .unwrap();

        let result = coach
            .on_meal_logged(
                "newcomer",
                day(),
                MealType::Dinner,
                meal(MealType::Dinner, 3000.0, 200.0),
            )
            .await
            .unwrap();

        assert!(result.decision.incomplete_goals);
        assert!(!result.decision.should_generate_tip);
        assert_eq!(inference.advice_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_logs_for_different_meals_both_count() {
        let (coach, _) = coach(Database::open_in_memory().unwrap(), MockInference::default());

        let (a, b) = tokio::join!(
            coach.on_meal_logged(
                "alice",
                day(),
                MealType::Breakfast,
                meal(MealType::Breakfast, 300.0, 20.0),
            ),
            coach.on_meal_logged(
                "alice",
                day(),
                MealType::Lunch,
                meal(MealType::Lunch, 500.0, 30.0),
            ),
        );
        a.unwrap();
        b.unwrap();

        let totals = coach.daily_totals("alice", day()).unwrap();
        assert_eq!(totals.meal_count(), 2);
        assert_eq!(totals.calories, 800.0);
        assert_eq!(totals.protein, 50.0);
    }

    #[tokio::test]
    async fn test_concurrent_logs_across_threads() {
        let store = Arc::new(Database::open_in_memory().unwrap());
        store.put_goals("alice", &goals()).unwrap();
        let coach = Arc::new(
            CoachingOrchestrator::new(
                store,
                Arc::new(MockInference::default()),
                CoachConfig::default(),
            )
            .unwrap(),
        );

        let mut handles = Vec::new();
        for (meal_type, calories) in [(MealType::Dinner, 550.0), (MealType::Snack, 100.0)] {
            let coach = coach.clone();
            handles.push(tokio::spawn(async move {
                coach
                    .on_meal_logged("alice", day(), meal_type, meal(meal_type, calories, 5.0))
                    .await
                    .map(|r| r.daily_totals.calories)
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let totals = coach.daily_totals("alice", day()).unwrap();
        assert_eq!(totals.calories, 650.0);
    }

    #[tokio::test]
    async fn test_edit_reevaluates() {
        let (coach, inference) = coach(Database::open_in_memory().unwrap(), MockInference::default());

        coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Lunch,
                meal(MealType::Lunch, 500.0, 30.0),
            )
            .await
            .unwrap();
        let result = coach
            .edit_meal("alice", day(), meal(MealType::Lunch, 800.0, 30.0))
            .await
            .unwrap();

        assert_eq!(result.daily_totals.calories, 800.0);
        assert!(result.decision.should_generate_tip);
        assert_eq!(inference.advice_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chat_context_and_reply() {
        let (coach, _) = coach(Database::open_in_memory().unwrap(), MockInference::default());
        coach
            .on_meal_logged(
                "alice",
                day(),
                MealType::Lunch,
                meal(MealType::Lunch, 500.0, 30.0),
            )
            .await
            .unwrap();

        let ctx = coach.build_chat_context("alice", day()).unwrap();
        assert_eq!(ctx.today_totals.calories, 500.0);
        assert_eq!(ctx.goals, Some(goals()));
        assert!(ctx.triggered.is_empty());

        let reply = coach.chat("alice", day(), "  what now?  ").await.unwrap();
        assert_eq!(reply, "what now? -> you are at 500 kcal");

        let err = coach.chat("alice", day(), "   ").await.unwrap_err();
        assert!(matches!(err, CoachError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_chat_inference_failure_is_error() {
        let inference = MockInference {
            fail: true,
            ..MockInference::default()
        };
        let (coach, _) = coach(Database::open_in_memory().unwrap(), inference);
        let err = coach.chat("alice", day(), "hi").await.unwrap_err();
        assert!(err.is_inference());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = CoachConfig {
            advice_timeout_secs: 0,
            ..CoachConfig::default()
        };
        let err = CoachingOrchestrator::new(
            Arc::new(Database::open_in_memory().unwrap()),
            Arc::new(MockInference::default()),
            config,
        )
        .err()
        .unwrap();
        assert!(
            matches!(err, CoachError::InvalidConfig(ref msg) if msg.contains("advice_timeout_secs"))
        );
        assert!(CoachConfig::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_slow_chat_reply_times_out() {
        let inference = MockInference {
            delay: Some(Duration::from_millis(200)),
            ..MockInference::default()
        };
        let (coach, _) = coach(Database::open_in_memory().unwrap(), inference);
        let coach = coach.with_chat_timeout(Duration::from_millis(20));

        let err = coach.chat("alice", day(), "hi").await.unwrap_err();
        assert!(matches!(err, CoachError::InferenceTimeout(_)));
    }

    #[tokio::test]
    async fn test_analyze_meal_image() {
        let (coach, _) = coach(Database::open_in_memory().unwrap(), MockInference::default());
        let estimate = coach.analyze_meal_image(&[0xFF, 0xD8, 0xFF]).await.unwrap();
        assert_eq!(estimate.calories, 600.0);

        let err = coach.analyze_meal_image(&[]).await.unwrap_err();
        assert!(matches!(err, CoachError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_update_goals_validates() {
        let (coach, _) = coach(Database::open_in_memory().unwrap(), MockInference::default());
        let bad = UserGoals {
            calorie_goal: -5.0,
            ..goals()
        };
        assert!(matches!(
            coach.update_goals("alice", &bad),
            Err(CoachError::InvalidGoals(_))
        ));
        assert_eq!(coach.goals("alice").unwrap(), Some(goals()));

        let better = UserGoals {
            calorie_goal: 1800.0,
            ..goals()
        };
        coach.update_goals("alice", &better).unwrap();
        assert_eq!(coach.goals("alice").unwrap(), Some(better));
    }
}
