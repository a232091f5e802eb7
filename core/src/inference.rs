use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CoachingContext, MealEstimate};

/// Remote multimodal model, as seen by the coaching engine: three opaque
/// request/response calls. Timeouts are applied by the caller.
#[async_trait]
pub trait InferenceCapability: Send + Sync {
    async fn generate_advice(&self, context: &CoachingContext) -> Result<String>;
    async fn generate_chat_reply(&self, context: &CoachingContext, message: &str)
    -> Result<String>;
    async fn analyze_meal_image(&self, image: &[u8]) -> Result<MealEstimate>;
}
