use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use platewise_core::inference::InferenceCapability;
use platewise_core::models::{CoachingContext, DailyTotals, MealEstimate, Nutrient};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Shown to the user whenever a chat turn cannot be answered.
pub const CHAT_FALLBACK: &str = "Sorry, I couldn't process your request. Please try again.";

/// Client for the remote multimodal model server.
///
/// Request deadlines are owned by the orchestrator, so only the connect phase
/// is bounded here.
pub struct RemoteInference {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct EstimateRequest<'a> {
    image_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_prompt: Option<&'a str>,
}

#[derive(Serialize)]
struct ReductionTipsRequest<'a> {
    exceeded_dict: BTreeMap<&'static str, f64>,
    meal_type: &'a str,
    energy_level: Option<u8>,
    hunger_level: Option<u8>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    daily_macros: BTreeMap<&'static str, f64>,
}

#[derive(Deserialize)]
struct NutritionResponse {
    #[serde(rename = "Calories")]
    calories: f64,
    #[serde(rename = "Protein")]
    protein: f64,
    #[serde(rename = "Carbs")]
    carbs: f64,
    #[serde(rename = "Fats")]
    fats: f64,
}

#[derive(Deserialize)]
struct AdviceResponse {
    advice: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub model: Option<String>,
}

impl RemoteInference {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("platewise/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn check_health(&self) -> Result<HealthStatus> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Failed to reach inference server at {}", self.base_url))?
            .error_for_status()
            .context("Inference server reported unhealthy")?;
        resp.json()
            .await
            .context("Failed to parse inference health response")
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(%url, "inference request");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach inference server at {}", self.base_url))?;

        let status = resp.status();
        let value: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse /{path} response (status {status})"))?;
        if let Some(message) = value.get("error").and_then(serde_json::Value::as_str) {
            bail!("Inference server error: {message}");
        }
        if !status.is_success() {
            bail!("Inference server returned status {status}");
        }
        serde_json::from_value(value).with_context(|| format!("Unexpected /{path} response shape"))
    }
}

#[async_trait]
impl InferenceCapability for RemoteInference {
    async fn generate_advice(&self, context: &CoachingContext) -> Result<String> {
        let meal = context.latest_meal.as_ref();
        let request = ReductionTipsRequest {
            exceeded_dict: exceeded_dict(context),
            meal_type: meal.map_or("meal", |m| m.meal_type.as_str()),
            energy_level: meal.map(|m| m.energy_rating),
            hunger_level: meal.map(|m| m.hunger_rating),
        };
        let resp: AdviceResponse = self.post("reduction_tips", &request).await?;
        non_empty(resp.advice).context("Inference server returned no advice")
    }

    async fn generate_chat_reply(&self, context: &CoachingContext, message: &str) -> Result<String> {
        let request = ChatRequest {
            message,
            daily_macros: daily_macros(&context.today_totals),
        };
        let resp: ChatResponse = self.post("chat", &request).await?;
        non_empty(resp.response).context("Inference server returned an empty reply")
    }

    async fn analyze_meal_image(&self, image: &[u8]) -> Result<MealEstimate> {
        let request = EstimateRequest {
            image_base64: STANDARD.encode(image),
            user_prompt: None,
            role_prompt: None,
        };
        let resp: NutritionResponse = self.post("estimate_nutrition", &request).await?;
        Ok(MealEstimate {
            calories: resp.calories,
            protein: resp.protein,
            carbs: resp.carbs,
            fat: resp.fats,
            description: None,
        })
    }
}

/// Key the model server uses for each nutrient.
fn wire_name(nutrient: Nutrient) -> &'static str {
    match nutrient {
        Nutrient::Calories => "Calories",
        Nutrient::Protein => "Protein",
        Nutrient::Carbs => "Carbs",
        Nutrient::Fat => "Fats",
    }
}

fn exceeded_dict(context: &CoachingContext) -> BTreeMap<&'static str, f64> {
    context
        .triggered
        .iter()
        .map(|e| (wire_name(e.nutrient), e.exceeded_by))
        .collect()
}

fn daily_macros(totals: &DailyTotals) -> BTreeMap<&'static str, f64> {
    Nutrient::ALL
        .iter()
        .map(|n| (wire_name(*n), totals.amount_of(*n)))
        .collect()
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::{get, post}};
    use chrono::{NaiveDate, Utc};
    use platewise_core::models::{MealEntry, MealType, NutrientExcess};
    use serde_json::{Value, json};

    async fn spawn_server(app: Router) -> RemoteInference {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        RemoteInference {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            base_url: format!("http://{addr}"),
        }
    }

    fn context() -> CoachingContext {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let meal = MealEntry {
            meal_type: MealType::Breakfast,
            calories: 450.0,
            protein: 43.0,
            carbs: 50.0,
            fat: 12.0,
            energy_rating: 2,
            hunger_rating: 4,
            description: None,
            timestamp: Utc::now(),
        };
        CoachingContext {
            goals: None,
            today_totals: DailyTotals::from_entries(date, vec![meal.clone()]),
            triggered: vec![
                NutrientExcess {
                    nutrient: Nutrient::Calories,
                    actual: 450.0,
                    limit: 400.0,
                    exceeded_by: 50.0,
                },
                NutrientExcess {
                    nutrient: Nutrient::Protein,
                    actual: 43.0,
                    limit: 40.0,
                    exceeded_by: 3.0,
                },
            ],
            latest_meal: Some(meal),
        }
    }

    #[test]
    fn test_exceeded_dict_uses_server_names() {
        let dict = exceeded_dict(&context());
        assert_eq!(dict.len(), 2);
        assert_eq!(dict["Calories"], 50.0);
        assert_eq!(dict["Protein"], 3.0);
    }

    #[test]
    fn test_daily_macros_has_all_four() {
        let macros = daily_macros(&context().today_totals);
        assert_eq!(macros["Calories"], 450.0);
        assert_eq!(macros["Fats"], 12.0);
        assert_eq!(macros.len(), 4);
    }

    #[test]
    fn test_daily_macros_include_calories_for_chat() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let lunch = MealEntry {
            meal_type: MealType::Lunch,
            calories: 620.0,
            protein: 30.0,
            carbs: 70.0,
            fat: 20.0,
            energy_rating: 3,
            hunger_rating: 3,
            description: None,
            timestamp: Utc::now(),
        };
        let totals = DailyTotals::from_entries(date, vec![lunch]);
        let macros = daily_macros(&totals);
        assert_eq!(macros.get("Calories"), Some(&620.0));
        assert_eq!(macros.get("Protein"), Some(&30.0));
        assert_eq!(macros.get("Carbs"), Some(&70.0));
        assert_eq!(macros.get("Fats"), Some(&20.0));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  hi ".to_string())), Some("hi".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[tokio::test]
    async fn test_reduction_tips_round_trip() {
        let app = Router::new().route(
            "/reduction_tips",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["meal_type"], "breakfast");
                assert_eq!(body["energy_level"], 2);
                assert_eq!(body["hunger_level"], 4);
                assert_eq!(body["exceeded_dict"]["Calories"], 50.0);
                Json(json!({ "advice": "Have a lighter lunch." }))
            }),
        );
        let client = spawn_server(app).await;
        let advice = client.generate_advice(&context()).await.unwrap();
        assert_eq!(advice, "Have a lighter lunch.");
    }

    #[tokio::test]
    async fn test_null_advice_is_failure() {
        let app = Router::new().route(
            "/reduction_tips",
            post(|| async { Json(json!({ "advice": null })) }),
        );
        let client = spawn_server(app).await;
        assert!(client.generate_advice(&context()).await.is_err());
    }

    #[tokio::test]
    async fn test_estimate_nutrition_parses_macros() {
        let app = Router::new().route(
            "/estimate_nutrition",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["image_base64"], "AQID");
                assert!(body.get("user_prompt").is_none());
                Json(json!({ "Calories": 520, "Protein": 31.5, "Carbs": 60, "Fats": 14 }))
            }),
        );
        let client = spawn_server(app).await;
        let estimate = client.analyze_meal_image(&[1, 2, 3]).await.unwrap();
        assert_eq!(estimate.calories, 520.0);
        assert_eq!(estimate.protein, 31.5);
        assert_eq!(estimate.fat, 14.0);
    }

    #[tokio::test]
    async fn test_error_body_is_failure() {
        let app = Router::new().route(
            "/estimate_nutrition",
            post(|| async { Json(json!({ "error": "Could not find JSON in model output" })) }),
        );
        let client = spawn_server(app).await;
        let err = client.analyze_meal_image(&[1]).await.unwrap_err();
        assert!(format!("{err:#}").contains("Could not find JSON"));
    }

    #[tokio::test]
    async fn test_server_error_status_is_failure() {
        let app = Router::new().route(
            "/chat",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "response": "partial" })),
                )
            }),
        );
        let client = spawn_server(app).await;
        let err = client.generate_chat_reply(&context(), "hi").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_chat_sends_daily_macros() {
        let app = Router::new().route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                let reply = format!(
                    "{} ({} kcal so far)",
                    body["message"].as_str().unwrap_or_default(),
                    body["daily_macros"]["Calories"]
                );
                Json(json!({ "response": reply }))
            }),
        );
        let client = spawn_server(app).await;
        let reply = client.generate_chat_reply(&context(), "hello").await.unwrap();
        assert_eq!(reply, "hello (450.0 kcal so far)");
    }

    #[tokio::test]
    async fn test_health() {
        let app = Router::new().route(
            "/health",
            get(|| async { Json(json!({ "status": "healthy", "model": "Qwen2-VL-2B-Instruct" })) }),
        );
        let client = spawn_server(app).await;
        let health = client.check_health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.model.as_deref(), Some("Qwen2-VL-2B-Instruct"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_failure() {
        let client = RemoteInference::new("http://127.0.0.1:1").unwrap();
        assert!(client.check_health().await.is_err());
    }
}
