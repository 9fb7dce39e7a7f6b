//! OpenAI-compatible remote assessment source.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use redpen_core::calibration::ReviewerCalibration;
use redpen_core::model::{Assessment, CodeLanguage, Question};
use redpen_core::report::Report;
use redpen_core::traits::{extract_json_from_markdown, AssessmentSource, Submission};

use crate::config::RemoteConfig;
use crate::error::{from_transport, SourceError};

const GENERATE_PROMPT: &str = "You generate adaptive interview assessments. Return strict JSON only: one object with id, subject, title, createdAt, readingTimeMinutes, strategyNote and questions[]. Question difficulty must ramp from easy to hard.";
const EVALUATE_PROMPT: &str = "You evaluate interview answers with rubric transparency. Return strict JSON only for the final report. Provide per-question score, confidence, borderline flag, reasoningTrace and rubricScores.";
const REGENERATE_PROMPT: &str = "Regenerate a single interview question preserving its difficulty and kind. Return strict JSON only.";

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY: usize = 400;

/// A source backed by a chat-completions endpoint that answers in JSON.
pub struct RemoteSource {
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

impl RemoteSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one chat exchange and return the JSON payload of the reply.
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn chat_json(&self, system: &str, user: String) -> Result<serde_json::Value> {
        let start = Instant::now();
        let body = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| from_transport(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                .saturating_mul(1000);
            return Err(SourceError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::AuthenticationFailed(truncate(&body)).into());
        }
        if status == 404 {
            return Err(SourceError::ModelNotFound(self.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status,
                message: truncate(&body),
            }
            .into());
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedPayload(format!("failed to parse response: {e}")))?;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                SourceError::MalformedPayload("response missing choices[0].message.content".into())
            })?;

        let payload = extract_json_from_markdown(&content);
        let value = serde_json::from_str(&payload)
            .map_err(|e| SourceError::MalformedPayload(format!("reply is not JSON: {e}")))?;
        tracing::debug!(latency_ms = start.elapsed().as_millis() as u64, "remote reply received");
        Ok(value)
    }
}

/// Decode a JSON payload into a core type.
fn decode<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| SourceError::MalformedPayload(format!("{what} has the wrong shape: {e}")).into())
}

/// Drop code templates whose language is not on the supported list.
fn retain_supported_templates(value: &mut serde_json::Value) {
    let Some(questions) = value.get_mut("questions").and_then(|q| q.as_array_mut()) else {
        return;
    };
    for question in questions {
        if let Some(templates) = question
            .get_mut("codeTemplates")
            .and_then(|t| t.as_array_mut())
        {
            templates.retain(|template| {
                template
                    .get("language")
                    .and_then(|l| l.as_str())
                    .is_some_and(|lang| CodeLanguage::ALL.iter().any(|l| l.as_str() == lang))
            });
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AssessmentSource for RemoteSource {
    fn name(&self) -> &str {
        "remote"
    }

    async fn generate(&self, subject: &str) -> Result<Assessment> {
        let user = format!(
            "Generate one assessment for subject: {subject}. Include mcq, descriptive and coding \
             questions. Coding templates should include at least python and go."
        );
        let mut value = self.chat_json(GENERATE_PROMPT, user).await?;
        retain_supported_templates(&mut value);
        decode(value, "assessment")
    }

    async fn evaluate(
        &self,
        submission: &Submission,
        calibration: Option<&ReviewerCalibration>,
    ) -> Result<Report> {
        let user = serde_json::json!({
            "candidateId": submission.candidate_id,
            "assessment": submission.assessment,
            "answers": submission.answers,
            "calibration": calibration,
        })
        .to_string();
        let value = self.chat_json(EVALUATE_PROMPT, user).await?;
        decode(value, "report")
    }

    async fn regenerate(
        &self,
        assessment: &Assessment,
        question_id: &str,
    ) -> Result<Option<Question>> {
        let Some(target) = assessment.question(question_id) else {
            return Ok(None);
        };
        let user = serde_json::json!({
            "assessmentSubject": assessment.subject,
            "question": target,
        })
        .to_string();
        let mut value = self.chat_json(REGENERATE_PROMPT, user).await?;
        let mut wrapper = serde_json::json!({ "questions": [value.take()] });
        retain_supported_templates(&mut wrapper);
        let question = wrapper["questions"][0].take();
        decode(question, "question").map(Some)
    }
}
