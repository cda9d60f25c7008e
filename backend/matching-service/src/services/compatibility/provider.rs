use crate::config::InferenceConfig;
use crate::domain::UserProfile;
use anyhow::Context;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYSTEM_PROMPT: &str =
    "You are a matchmaking expert for college students. Respond with JSON only.";

/// Failures of the external scorer. None of these reach API callers; the
/// scorer falls back to the heuristic instead.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("inference timed out after {0} ms")]
    Timeout(u64),

    #[error("unparseable inference response: {0}")]
    Unparseable(String),
}

/// Anything that can turn a prompt into a completion
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Short label used in logs
    fn name(&self) -> &str;
}

// ============================================
// OpenAI-compatible chat completions
// ============================================

pub struct OpenAiProvider {
    client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn from_config(config: &InferenceConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .context("INFERENCE_API_KEY is required for the inference provider")?;

        // The scorer enforces its own deadline; this only guards against a
        // connection that never completes.
        let client = HttpClient::builder()
            .timeout(config.timeout() * 2)
            .build()
            .context("Failed to create inference HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait::async_trait]
impl InferenceProvider for OpenAiProvider {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: ChatCompletionResponse = response.json().await?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| InferenceError::Unparseable("no completion choices".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================
// Prompt and response handling
// ============================================

fn describe(profile: &UserProfile) -> String {
    let interests = if profile.interests.is_empty() {
        "None listed".to_string()
    } else {
        profile.interests.join(", ")
    };
    let bio = profile
        .bio
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or("No bio");
    let course = profile
        .course
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("Not specified");

    format!(
        "- Interests: {}\n- Bio: {}\n- Course: {}\n- Age: {}",
        interests, bio, course, profile.age
    )
}

/// Prompt asking for a 0-100 compatibility score of two students
pub fn build_prompt(a: &UserProfile, b: &UserProfile) -> String {
    format!(
        r#"Rate the compatibility of these two college students on a scale of 0 to 100.

User 1:
{}

User 2:
{}

Consider shared interests, personality cues from the bios, academic overlap and age.
Return only a JSON object in this format:
{{"score": <number 0-100>, "reason": "<one short sentence>"}}"#,
        describe(a),
        describe(b)
    )
}

/// Strip a Markdown code fence around a JSON payload, if any
fn extract_json(response: &str) -> &str {
    let body = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response)
    } else {
        response
    };
    body.trim()
}

/// Pull the score out of a completion, clamped to 0..=100 and rounded
pub fn parse_score(response: &str) -> Result<u8, InferenceError> {
    let value: serde_json::Value = serde_json::from_str(extract_json(response))
        .map_err(|e| InferenceError::Unparseable(e.to_string()))?;

    let score = value
        .get("score")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| InferenceError::Unparseable("missing numeric score".to_string()))?;

    Ok(score.clamp(0.0, 100.0).round() as u8)
}
