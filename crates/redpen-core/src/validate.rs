//! Structural validation of assessments, reports and regenerated questions.
//!
//! Remote payloads are only trusted when they produce no error-severity
//! issues.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::model::{Assessment, Question, QuestionKind};
use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A problem found during validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// The question the issue refers to, if any.
    pub question_id: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn error(question_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.map(str::to_string),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(question_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.map(str::to_string),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Whether any issue is error-severity.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

/// Validate an assessment's shape.
pub fn validate_assessment(assessment: &Assessment) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if assessment.id.trim().is_empty() {
        issues.push(ValidationIssue::error(None, "assessment id is empty"));
    }
    if assessment.subject.trim().is_empty() {
        issues.push(ValidationIssue::error(None, "subject is empty"));
    }
    if assessment.questions.is_empty() {
        issues.push(ValidationIssue::error(None, "assessment has no questions"));
    }

    let mut seen_ids = HashSet::new();
    for question in &assessment.questions {
        if !seen_ids.insert(question.id.as_str()) {
            issues.push(ValidationIssue::error(
                Some(&question.id),
                format!("duplicate question ID: {}", question.id),
            ));
        }
        issues.extend(question_issues(question));
    }

    issues
}

fn question_issues(question: &Question) -> Vec<ValidationIssue> {
    let id = Some(question.id.as_str());
    let mut issues = Vec::new();

    if question.id.trim().is_empty() {
        issues.push(ValidationIssue::error(None, "question id is empty"));
    }
    if question.prompt.trim().is_empty() {
        issues.push(ValidationIssue::warning(id, "prompt is empty"));
    }
    if question.estimated_seconds == 0 {
        issues.push(ValidationIssue::warning(id, "time budget is zero"));
    }

    if question.rubric.is_empty() {
        issues.push(ValidationIssue::error(id, "rubric is empty"));
    }
    for criterion in &question.rubric {
        if !(criterion.weight > 0.0 && criterion.weight <= 1.0) {
            issues.push(ValidationIssue::error(
                id,
                format!(
                    "rubric weight for '{}' is outside (0, 1]: {}",
                    criterion.label, criterion.weight
                ),
            ));
        }
    }

    match question.kind {
        QuestionKind::Mcq => {
            if question.options.is_empty() {
                issues.push(ValidationIssue::error(id, "mcq question has no options"));
            }
            match question.correct_option_id.as_deref() {
                None => issues.push(ValidationIssue::error(id, "mcq question has no correct option")),
                Some(correct) if !question.options.iter().any(|o| o.id == correct) => {
                    issues.push(ValidationIssue::error(
                        id,
                        format!("correct option '{correct}' is not among the options"),
                    ));
                }
                Some(_) => {}
            }
        }
        QuestionKind::Coding => {
            if question.code_templates.is_empty() {
                issues.push(ValidationIssue::error(id, "coding question has no templates"));
            }
            if question.test_cases.is_empty() {
                issues.push(ValidationIssue::error(id, "coding question has no test cases"));
            }
        }
        QuestionKind::Descriptive => {}
    }

    issues
}

/// Validate a report against the assessment it claims to evaluate.
pub fn validate_report(report: &Report, assessment: &Assessment) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if report.evaluations.len() != assessment.questions.len() {
        issues.push(ValidationIssue::error(
            None,
            format!(
                "report has {} evaluations for {} questions",
                report.evaluations.len(),
                assessment.questions.len()
            ),
        ));
    }

    for evaluation in &report.evaluations {
        let id = Some(evaluation.question_id.as_str());
        if assessment.question(&evaluation.question_id).is_none() {
            issues.push(ValidationIssue::error(
                id,
                format!("evaluation for unknown question: {}", evaluation.question_id),
            ));
        }
        if evaluation.score > 10 {
            issues.push(ValidationIssue::error(
                id,
                format!("score {} is outside 0..=10", evaluation.score),
            ));
        }
        if !(0.0..=1.0).contains(&evaluation.confidence) {
            issues.push(ValidationIssue::error(
                id,
                format!("confidence {} is outside [0, 1]", evaluation.confidence),
            ));
        }
    }

    issues
}

/// Validate a regenerated question against the one it replaces.
pub fn validate_question(candidate: &Question, original: &Question) -> Vec<ValidationIssue> {
    let id = Some(original.id.as_str());
    let mut issues = question_issues(candidate);
    if candidate.kind != original.kind {
        issues.push(ValidationIssue::error(
            id,
            format!("kind changed from {} to {}", original.kind, candidate.kind),
        ));
    }
    if candidate.difficulty != original.difficulty {
        issues.push(ValidationIssue::error(
            id,
            format!(
                "difficulty changed from {} to {}",
                original.difficulty, candidate.difficulty
            ),
        ));
    }
    issues
}
