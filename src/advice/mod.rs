//! Persuasive eco-advice, generated remotely with a canned local fallback.

pub mod canned;
pub mod intent;
pub mod remote;

use crate::advice::remote::{ChatRequest, RemoteError, request_completion};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub use canned::canned_advice;
pub use intent::{DetectedActivity, detect_activity};

#[derive(Clone, PartialEq)]
pub struct AdviceSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl fmt::Debug for AdviceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceSettings")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Input for one piece of advice. Activity context is only used when all four
/// of label, category, emission and points are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdviceRequest {
    pub message: String,
    pub activity_label: Option<String>,
    pub category: Option<String>,
    pub carbon_kg: Option<f64>,
    pub points: Option<f64>,
}

impl AdviceRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_activity(
        mut self,
        activity_label: impl Into<String>,
        category: impl Into<String>,
        carbon_kg: f64,
        points: f64,
    ) -> Self {
        self.activity_label = Some(activity_label.into());
        self.category = Some(category.into());
        self.carbon_kg = Some(carbon_kg);
        self.points = Some(points);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn context_sentence(&self) -> Option<String> {
        let (Some(activity), Some(category), Some(carbon_kg), Some(points)) = (
            self.activity_label.as_deref(),
            self.category.as_deref(),
            self.carbon_kg,
            self.points,
        ) else {
            return None;
        };
        Some(format!(
            "The user performed an activity: '{activity}' in category '{category}' with estimated {carbon_kg}kg CO2 emissions. They earned {points} eco-points for this activity."
        ))
    }
}

pub fn build_prompt(request: &AdviceRequest) -> String {
    let context = request.context_sentence().unwrap_or_default();
    format!(
        "You are an eco-friendly AI assistant helping users with environmental questions and activities.\n\
         {context}\n\n\
         User's message: \"{message}\"\n\n\
         Provide a friendly, conversational response that:\n\
         1. Addresses the user's question or comment about environmental topics\n\
         2. If activity details are provided, acknowledges their activity and eco-points earned\n\
         3. Gives helpful, accurate information about environmental impact, sustainability, or eco-friendly practices\n\
         4. Suggests specific, actionable steps when relevant\n\
         5. Encourages positive environmental behavior\n\
         6. Keep the response natural and engaging, like a helpful friend\n\n\
         Response should be 2-4 sentences long and end on a positive, motivating note.\n\
         Only respond to eco-related topics; if the question is not eco-related, politely redirect to environmental topics.",
        message = request.message,
    )
}

#[derive(Debug, Clone)]
pub struct AdviceGenerator {
    settings: AdviceSettings,
    client: Client,
}

impl AdviceGenerator {
    pub fn new(settings: AdviceSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &AdviceSettings {
        &self.settings
    }

    pub fn has_api_key(&self) -> bool {
        self.settings.api_key.is_some()
    }

    /// Remote advice when possible, a canned sentence for the request's
    /// category otherwise. Never fails.
    pub async fn generate_advice(&self, request: &AdviceRequest) -> String {
        match self.request_remote(request).await {
            Ok(advice) => advice,
            Err(RemoteError::MissingApiKey) => {
                debug!("Advice API key not configured, using canned advice");
                self.fallback(request)
            }
            Err(err) => {
                warn!(error = %err, endpoint = %self.settings.endpoint, "Remote advice failed");
                self.fallback(request)
            }
        }
    }

    async fn request_remote(&self, request: &AdviceRequest) -> Result<String, RemoteError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(RemoteError::MissingApiKey)?;
        let prompt = build_prompt(request);
        let chat = ChatRequest::new(
            &self.settings.model,
            &prompt,
            self.settings.max_tokens,
            self.settings.temperature,
        );
        tokio::time::timeout(
            self.settings.timeout,
            request_completion(&self.client, &self.settings.endpoint, api_key, &chat),
        )
        .await
        .map_err(|_| RemoteError::Timeout)?
    }

    fn fallback(&self, request: &AdviceRequest) -> String {
        canned_advice(request.category.as_deref(), &mut rand::thread_rng())
    }
}
