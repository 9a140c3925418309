use crate::estimation::{PredictionSource, TrainingMetrics};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ACTIVITY: &str = "general activity";
pub const DEFAULT_CATEGORY: &str = "Lifestyle";
pub const DEFAULT_CARBON_EMISSION: f64 = 5.0;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub prediction_type: PredictionSource,
    pub timestamp: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogActivityRequest {
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LogActivityResponse {
    pub activity: String,
    pub category: String,
    pub distance: Option<f64>,
    pub quantity: Option<f64>,
    pub mode: Option<String>,
    pub details: Option<serde_json::Value>,
    pub carbon_emission: f64,
    pub eco_points: f64,
    pub prediction_type: PredictionSource,
    pub advice: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PredictRequest {
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub carbon_emission: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PredictResponse {
    pub activity: String,
    pub category: String,
    pub carbon_emission: f64,
    pub predicted_eco_points: f64,
    pub prediction_type: PredictionSource,
    pub advice: String,
}

#[derive(Debug, Deserialize)]
pub struct CalculatePointsRequest {
    pub activity: String,
    pub category: String,
    pub carbon_emission: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CalculatePointsResponse {
    pub eco_points: f64,
    pub prediction_type: PredictionSource,
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct TrainRequest {
    #[serde(default)]
    pub n_samples: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TrainResponse {
    pub message: String,
    pub metrics: TrainingMetrics,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiErrorResponse {
    pub error_code: ApiErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    InvalidRequest,
    TrainingFailed,
    InternalError,
}
