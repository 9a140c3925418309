//! OpenAI-compatible chat-completions client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful eco-assistant providing information and advice on environmental topics.";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

impl<'a> ChatRequest<'a> {
    pub(crate) fn new(model: &'a str, prompt: &'a str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug)]
pub(crate) enum RemoteError {
    MissingApiKey,
    Request(reqwest::Error),
    Http(u16, String),
    Decode(reqwest::Error),
    EmptyCompletion,
    Timeout,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::MissingApiKey => write!(f, "api key not configured"),
            RemoteError::Request(err) => write!(f, "request error: {err}"),
            RemoteError::Http(code, body) => {
                write!(f, "http status {code} ({})", body.trim())
            }
            RemoteError::Decode(err) => write!(f, "decode error: {err}"),
            RemoteError::EmptyCompletion => write!(f, "completion had no content"),
            RemoteError::Timeout => write!(f, "timed out"),
        }
    }
}

/// Sends one completion request and returns the trimmed reply text.
pub(crate) async fn request_completion(
    client: &Client,
    endpoint: &str,
    api_key: &str,
    request: &ChatRequest<'_>,
) -> Result<String, RemoteError> {
    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(RemoteError::Request)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::Http(status.as_u16(), body));
    }

    let payload: ChatResponse = response.json().await.map_err(RemoteError::Decode)?;
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(RemoteError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_system_and_user_messages() {
        let request = ChatRequest::new("gpt-3.5-turbo", "How do I save energy?", 200, 0.5);

        let value = serde_json::to_value(&request).expect("serialize chat request");

        assert_eq!(
            value,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "How do I save energy?"}
                ],
                "max_tokens": 200,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn response_tolerates_missing_content() {
        let payload: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"role": "assistant"}}]}))
                .expect("deserialize chat response");

        assert_eq!(payload.choices.len(), 1);
        assert!(payload.choices[0].message.content.is_none());
    }

    #[test]
    fn http_error_display_trims_body() {
        let err = RemoteError::Http(429, "  rate limited \n".to_string());
        assert_eq!(err.to_string(), "http status 429 (rate limited)");
    }
}
