use crate::advice::{AdviceRequest, detect_activity};
use crate::api::responses::{
    ApiErrorCode, ApiErrorResponse, CalculatePointsRequest, CalculatePointsResponse, ChatRequest,
    ChatResponse, DEFAULT_ACTIVITY, DEFAULT_CARBON_EMISSION, DEFAULT_CATEGORY, HealthStatus,
    HealthSuccessResponse, LogActivityRequest, LogActivityResponse, PredictRequest,
    PredictResponse, TrainRequest, TrainResponse,
};
use crate::estimation::synthetic::round_to;
use crate::estimation::{ActivityInput, PredictionSource};
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const EMISSION_DECIMALS: i32 = 3;

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ApiErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(state): State<AppState>) -> impl IntoResponse {
    build_health_response(&state, SystemTime::now())
}

pub async fn post_log(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match parse_optional_body::<LogActivityRequest>(&body) {
        Ok(request) => build_log_response(&state, request).await,
        Err(message) => invalid_request(&message),
    }
}

pub async fn post_predict(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match parse_optional_body::<PredictRequest>(&body) {
        Ok(request) => build_predict_response(&state, request).await,
        Err(message) => invalid_request(&message),
    }
}

pub async fn post_calculate_points(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    match parse_body::<CalculatePointsRequest>(&body) {
        Ok(request) => build_calculate_points_response(&state, request).await,
        Err(message) => invalid_request(&message),
    }
}

pub async fn post_train(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match parse_optional_body::<TrainRequest>(&body) {
        Ok(request) => build_train_response(&state, request).await,
        Err(message) => invalid_request(&message),
    }
}

pub async fn post_chat(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match parse_body::<ChatRequest>(&body) {
        Ok(request) => build_chat_response(&state, request).await,
        Err(message) => invalid_request(&message),
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|err| format!("Invalid request body: {err}"))
}

// An empty body means "use every default".
fn parse_optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_body(body)
}

fn build_health_response(
    state: &AppState,
    now: SystemTime,
) -> ApiResponse<HealthSuccessResponse> {
    let prediction_type = if state.estimator().is_trained() {
        PredictionSource::Model
    } else {
        PredictionSource::Fallback
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(HealthSuccessResponse {
            status: HealthStatus::Ok,
            prediction_type,
            timestamp,
        }),
        Err(_) => internal_error("/api/health", "timestamp formatting failure"),
    }
}

async fn build_log_response(
    state: &AppState,
    request: LogActivityRequest,
) -> ApiResponse<LogActivityResponse> {
    let activity = request
        .activity
        .unwrap_or_else(|| DEFAULT_ACTIVITY.to_string());
    let category = request
        .category
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let input = ActivityInput {
        category: category.clone(),
        activity_label: activity.clone(),
        distance: request.distance,
        quantity: request.quantity,
        mode: request.mode.clone(),
    };

    let estimator = state.estimator();
    let carbon_kg = estimator.estimate_emissions(&input);
    let estimate = estimator.predict_points(&activity, &category, carbon_kg);
    let carbon_emission = round_to(carbon_kg, EMISSION_DECIMALS);

    let advice_request = AdviceRequest::new(format!(
        "I logged {activity} in {category} with {carbon_emission}kg CO2"
    ))
    .with_activity(&activity, &category, carbon_emission, estimate.points);
    let advice = state.advisor().generate_advice(&advice_request).await;

    info!(
        category = %category,
        carbon_kg = carbon_emission,
        points = estimate.points,
        source = ?estimate.source,
        "Activity logged"
    );

    ApiResponse::Success(LogActivityResponse {
        activity,
        category,
        distance: request.distance,
        quantity: request.quantity,
        mode: request.mode,
        details: request.details,
        carbon_emission,
        eco_points: estimate.points,
        prediction_type: estimate.source,
        advice,
    })
}

async fn build_predict_response(
    state: &AppState,
    request: PredictRequest,
) -> ApiResponse<PredictResponse> {
    let activity = request
        .activity
        .unwrap_or_else(|| DEFAULT_ACTIVITY.to_string());
    let category = request
        .category
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let carbon_emission = request.carbon_emission.unwrap_or(DEFAULT_CARBON_EMISSION);
    if !carbon_emission.is_finite() || carbon_emission < 0.0 {
        return invalid_request("carbon_emission must be a non-negative number");
    }

    let estimate = state
        .estimator()
        .predict_points(&activity, &category, carbon_emission);
    let advice_request = AdviceRequest::new(format!(
        "I performed {activity} in {category} with {carbon_emission}kg CO2 emissions"
    ))
    .with_activity(&activity, &category, carbon_emission, estimate.points);
    let advice = state.advisor().generate_advice(&advice_request).await;

    ApiResponse::Success(PredictResponse {
        activity,
        category,
        carbon_emission,
        predicted_eco_points: estimate.points,
        prediction_type: estimate.source,
        advice,
    })
}

async fn build_calculate_points_response(
    state: &AppState,
    request: CalculatePointsRequest,
) -> ApiResponse<CalculatePointsResponse> {
    if !request.carbon_emission.is_finite() || request.carbon_emission < 0.0 {
        return invalid_request("carbon_emission must be a non-negative number");
    }

    let estimate = state.estimator().predict_points(
        &request.activity,
        &request.category,
        request.carbon_emission,
    );
    let advice_request = AdviceRequest::new(format!(
        "Calculate points for {}",
        request.activity
    ))
    .with_activity(
        &request.activity,
        &request.category,
        request.carbon_emission,
        estimate.points,
    );
    let message = state.advisor().generate_advice(&advice_request).await;

    ApiResponse::Success(CalculatePointsResponse {
        eco_points: estimate.points,
        prediction_type: estimate.source,
        message,
    })
}

async fn build_train_response(
    state: &AppState,
    request: TrainRequest,
) -> ApiResponse<TrainResponse> {
    let estimator = Arc::clone(state.estimator());
    let n_samples = request
        .n_samples
        .unwrap_or(estimator.config().default_samples);
    let max_samples = estimator.config().max_samples;
    if n_samples > max_samples {
        return invalid_request(&format!(
            "n_samples must not exceed {max_samples}, got {n_samples}"
        ));
    }

    let outcome = tokio::task::spawn_blocking(move || estimator.train(n_samples)).await;
    match outcome {
        Ok(Ok(metrics)) => ApiResponse::Success(TrainResponse {
            message: format!(
                "AI model trained successfully with {n_samples} examples (80/20 split)"
            ),
            metrics,
        }),
        Ok(Err(err)) => {
            warn!(error = %err, n_samples, "Training request failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorCode::TrainingFailed,
                &format!("Training failed: {err}"),
            )
        }
        Err(err) => {
            error!(error = %err, "Training task did not complete");
            internal_error("/api/ai/train", "training task join failure")
        }
    }
}

async fn build_chat_response(state: &AppState, request: ChatRequest) -> ApiResponse<ChatResponse> {
    let advice_request = match detect_activity(&request.message) {
        Some(detected) => {
            let category = detected.category.name();
            let estimate = state.estimator().predict_points(
                detected.activity_label,
                category,
                detected.carbon_kg,
            );
            AdviceRequest::new(request.message).with_activity(
                detected.activity_label,
                category,
                detected.carbon_kg,
                estimate.points,
            )
        }
        None => AdviceRequest::new(request.message),
    };

    let response = state.advisor().generate_advice(&advice_request).await;
    ApiResponse::Success(ChatResponse { response })
}

fn invalid_request<T>(message: &str) -> ApiResponse<T> {
    error_response(StatusCode::BAD_REQUEST, ApiErrorCode::InvalidRequest, message)
}

fn error_response<T>(status: StatusCode, error_code: ApiErrorCode, message: &str) -> ApiResponse<T> {
    ApiResponse::Error {
        status,
        body: ApiErrorResponse {
            error_code,
            error_message: message.to_string(),
            timestamp: now_timestamp(),
        },
    }
}

fn internal_error<T>(route: &str, message: &str) -> ApiResponse<T> {
    error!(route, message = message, "Internal error while handling request");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiErrorCode::InternalError,
        INTERNAL_ERROR_MESSAGE,
    )
}

fn now_timestamp() -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
