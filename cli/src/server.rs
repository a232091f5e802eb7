use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use crate::Coach;
use crate::inference_client::CHAT_FALLBACK;
use platewise_core::error::CoachError;
use platewise_core::models::{
    AdviceRecord, CoachingContext, CoachingResult, DailyTotals, MealEntry, MealEstimate, MealType,
    UserGoals,
};

// Meal photos arrive base64-encoded inside JSON.
const BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    coach: Arc<Coach>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct LogMealRequest {
    date: String,
    meal_type: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    energy_rating: u8,
    hunger_rating: u8,
    description: Option<String>,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    image_base64: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    date: Option<String>,
}

#[derive(Serialize)]
struct ChatReply {
    response: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable(String),
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<CoachError> for ApiError {
    fn from(err: CoachError) -> Self {
        match err {
            CoachError::MalformedMealEntry(_)
            | CoachError::InvalidGoals(_)
            | CoachError::InvalidRequest(_) => Self::BadRequest(err.to_string()),
            CoachError::StorageUnavailable(ref source) => {
                tracing::error!(error = %format!("{source:#}"), "storage unavailable");
                Self::Unavailable("Storage unavailable".to_string())
            }
            CoachError::InferenceUnavailable(_) | CoachError::InferenceTimeout(_) => {
                tracing::warn!(error = %err, "inference call failed");
                Self::BadGateway(err.to_string())
            }
            CoachError::InvalidConfig(_) => {
                tracing::error!(error = %err, "configuration error");
                Self::Internal("Internal server error".to_string())
            }
        }
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, ApiError> {
    if date_str == "today" {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{date_str}'. Use YYYY-MM-DD")))
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn log_meal(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(req): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<CoachingResult>), ApiError> {
    let meal_type = MealType::from_str(&req.meal_type)?;
    let date = parse_date(&req.date)?;
    let entry = MealEntry {
        meal_type,
        calories: req.calories,
        protein: req.protein,
        carbs: req.carbs,
        fat: req.fat,
        energy_rating: req.energy_rating,
        hunger_rating: req.hunger_rating,
        description: req.description.filter(|d| !d.trim().is_empty()),
        timestamp: Utc::now(),
    };

    let result = state
        .coach
        .on_meal_logged(&user, date, meal_type, entry)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn analyze_meal(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<MealEstimate>, ApiError> {
    let image = STANDARD
        .decode(req.image_base64.trim())
        .map_err(|e| ApiError::BadRequest(format!("image_base64 is not valid base64: {e}")))?;
    let estimate = state.coach.analyze_meal_image(&image).await?;
    Ok(Json(estimate))
}

async fn get_summary(
    State(state): State<AppState>,
    Path((user, date_str)): Path<(String, String)>,
) -> Result<Json<DailyTotals>, ApiError> {
    let date = parse_date(&date_str)?;
    Ok(Json(state.coach.daily_totals(&user, date)?))
}

async fn get_goals(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<UserGoals>, ApiError> {
    state
        .coach
        .goals(&user)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No goals set for '{user}'")))
}

async fn put_goals(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(goals): Json<UserGoals>,
) -> Result<Json<UserGoals>, ApiError> {
    state.coach.update_goals(&user, &goals)?;
    Ok(Json(goals))
}

async fn chat(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let date = match req.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    match state.coach.chat(&user, date, &req.message).await {
        Ok(response) => Ok(Json(ChatReply { response })),
        Err(err) if err.is_inference() => {
            tracing::warn!(error = %err, "chat reply failed");
            Err(ApiError::BadGateway(CHAT_FALLBACK.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

async fn get_chat_context(
    State(state): State<AppState>,
    Path((user, date_str)): Path<(String, String)>,
) -> Result<Json<CoachingContext>, ApiError> {
    let date = parse_date(&date_str)?;
    Ok(Json(state.coach.build_chat_context(&user, date)?))
}

async fn get_advice(
    State(state): State<AppState>,
    Path((user, date_str)): Path<(String, String)>,
) -> Result<Json<Vec<AdviceRecord>>, ApiError> {
    let date = parse_date(&date_str)?;
    Ok(Json(state.coach.advice_for(&user, date)?))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/{user}/meals", post(log_meal))
        .route("/api/users/{user}/meals/analyze", post(analyze_meal))
        .route("/api/users/{user}/summary/{date}", get(get_summary))
        .route("/api/users/{user}/goals", get(get_goals).put(put_goals))
        .route("/api/users/{user}/chat", post(chat))
        .route("/api/users/{user}/chat/context/{date}", get(get_chat_context))
        .route("/api/users/{user}/advice/{date}", get(get_advice))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(coach: Coach, port: u16, bind: &str) -> anyhow::Result<()> {
    let app = build_router(AppState {
        coach: Arc::new(coach),
    });

    if bind != "127.0.0.1" && bind != "localhost" {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    tracing::info!(%bind, port, "server listening");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
