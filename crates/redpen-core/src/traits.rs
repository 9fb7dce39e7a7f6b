//! The assessment source abstraction.
//!
//! A source can synthesize assessments, evaluate submissions and regenerate
//! single questions. The deterministic source lives in [`crate::service`];
//! the remote source is implemented by `redpen-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::calibration::ReviewerCalibration;
use crate::model::{Assessment, CandidateAnswer, Question};
use crate::report::Report;

// ---------------------------------------------------------------------------
// Assessment source trait
// ---------------------------------------------------------------------------

/// A backend that produces assessments and reports.
#[async_trait]
pub trait AssessmentSource: Send + Sync {
    /// Human-readable source name (e.g. "deterministic").
    fn name(&self) -> &str;

    /// Synthesize an assessment for a subject.
    async fn generate(&self, subject: &str) -> anyhow::Result<Assessment>;

    /// Evaluate one submission.
    async fn evaluate(
        &self,
        submission: &Submission,
        calibration: Option<&ReviewerCalibration>,
    ) -> anyhow::Result<Report>;

    /// Produce a refined variant of one question. `Ok(None)` for unknown ids.
    async fn regenerate(
        &self,
        assessment: &Assessment,
        question_id: &str,
    ) -> anyhow::Result<Option<Question>>;
}

/// A candidate's answers to one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub candidate_id: String,
    pub assessment: Assessment,
    pub answers: Vec<CandidateAnswer>,
}

// ---------------------------------------------------------------------------
// Payload extraction
// ---------------------------------------------------------------------------

/// Extract a JSON payload from a possibly markdown-wrapped response.
///
/// Handles:
/// - A ```json block (the first one wins)
/// - A generic ``` block, if no json block is present
/// - Bare JSON with no fences (returned trimmed)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block && json_block.is_none() {
                json_block = Some(std::mem::take(&mut current_block));
            } else if generic_block.is_none() {
                generic_block = Some(std::mem::take(&mut current_block));
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.trim().to_string())
}
