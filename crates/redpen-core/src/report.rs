//! Report types and reviewer overrides.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::ReviewerCalibration;
use crate::rubric::ScoreBreakdown;

/// Note recorded when a reviewer leaves the override note empty.
pub const DEFAULT_OVERRIDE_NOTE: &str = "Manual reviewer adjustment";

/// Per-question evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub question_id: String,
    pub score: u32,
    pub max_score: u32,
    pub confidence: f64,
    pub borderline: bool,
    pub reasoning_trace: String,
    pub rubric_scores: Vec<ScoreBreakdown>,
}

/// Aggregate score for one sub-topic, as a whole percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicScore {
    pub topic: String,
    pub score_pct: u32,
}

/// Cumulative accuracy and pacing up to a 1-based question index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub index: usize,
    pub accuracy_pct: u32,
    pub avg_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarPoint {
    pub topic: String,
    pub score: u32,
}

/// One reviewer override, kept in an append-only log on the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRecord {
    pub question_id: String,
    pub previous_score: u32,
    pub new_score: u32,
    pub note: String,
    pub at: DateTime<Utc>,
}

/// A complete evaluation report for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub assessment_id: String,
    pub candidate_id: String,
    pub submitted_at: DateTime<Utc>,
    pub total_score: u32,
    pub max_score: u32,
    pub percentile: u32,
    pub evaluations: Vec<Evaluation>,
    pub strongest_topics: Vec<TopicScore>,
    pub weakest_topics: Vec<TopicScore>,
    pub timeline: Vec<TimelinePoint>,
    pub topic_radar: Vec<RadarPoint>,
    #[serde(default)]
    pub reviewer_overrides: Vec<OverrideRecord>,
}

impl Report {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        crate::store::save_json(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        crate::store::load_json(path)
    }

    pub fn evaluation(&self, question_id: &str) -> Option<&Evaluation> {
        self.evaluations.iter().find(|e| e.question_id == question_id)
    }

    pub fn borderline_count(&self) -> usize {
        self.evaluations.iter().filter(|e| e.borderline).count()
    }

    /// Total score as a fraction of the maximum; 0.0 for an empty report.
    pub fn score_ratio(&self) -> f64 {
        if self.max_score == 0 {
            0.0
        } else {
            self.total_score as f64 / self.max_score as f64
        }
    }
}

/// Result of [`apply_override`].
#[derive(Debug, Clone)]
pub struct OverrideOutcome {
    pub report: Report,
    pub calibration: ReviewerCalibration,
}

/// Apply a reviewer override to one evaluation.
///
/// Replaces the matching evaluation's score, recomputes the total and appends
/// an [`OverrideRecord`]. The calibration is always advanced, even if no
/// evaluation matches `question_id`. `new_score` is taken as given; callers
/// are expected to keep it within `0..=10`. Percentile and topic aggregates
/// keep their evaluation-time values.
pub fn apply_override(
    report: &Report,
    calibration: &ReviewerCalibration,
    question_id: &str,
    previous_score: u32,
    new_score: u32,
    note: &str,
) -> OverrideOutcome {
    let mut next = report.clone();
    for evaluation in next
        .evaluations
        .iter_mut()
        .filter(|e| e.question_id == question_id)
    {
        evaluation.score = new_score;
    }
    next.total_score = next.evaluations.iter().map(|e| e.score).sum();

    let note = if note.trim().is_empty() {
        DEFAULT_OVERRIDE_NOTE.to_string()
    } else {
        note.to_string()
    };
    next.reviewer_overrides.push(OverrideRecord {
        question_id: question_id.to_string(),
        previous_score,
        new_score,
        note,
        at: Utc::now(),
    });

    let calibration = calibration.with_override(previous_score, new_score);
    tracing::info!(
        question_id,
        previous_score,
        new_score,
        factor = calibration.adjustment_factor,
        "override applied"
    );

    OverrideOutcome {
        report: next,
        calibration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(id: &str, score: u32) -> Evaluation {
        Evaluation {
            question_id: id.into(),
            score,
            max_score: 10,
            confidence: 0.95,
            borderline: false,
            reasoning_trace: String::new(),
            rubric_scores: vec![],
        }
    }

    fn report() -> Report {
        Report {
            assessment_id: "asmt-1".into(),
            candidate_id: "candidate-001".into(),
            submitted_at: Utc::now(),
            total_score: 14,
            max_score: 30,
            percentile: 56,
            evaluations: vec![evaluation("q1", 10), evaluation("q2", 4), evaluation("q3", 0)],
            strongest_topics: vec![],
            weakest_topics: vec![],
            timeline: vec![],
            topic_radar: vec![],
            reviewer_overrides: vec![],
        }
    }

    #[test]
    fn override_updates_score_total_and_log() {
        let cal = ReviewerCalibration::new("Computer Science");
        let out = apply_override(&report(), &cal, "q2", 4, 8, "clear tradeoff analysis");

        assert_eq!(out.report.evaluation("q2").unwrap().score, 8);
        assert_eq!(out.report.total_score, 18);
        assert_eq!(out.report.percentile, 56);
        assert_eq!(out.report.reviewer_overrides.len(), 1);
        let record = &out.report.reviewer_overrides[0];
        assert_eq!(record.previous_score, 4);
        assert_eq!(record.new_score, 8);
        assert_eq!(record.note, "clear tradeoff analysis");

        assert!((out.calibration.adjustment_factor - 1.02).abs() < 1e-12);
        assert_eq!(out.calibration.override_count, 1);
    }

    #[test]
    fn empty_note_gets_default() {
        let cal = ReviewerCalibration::new("Computer Science");
        let out = apply_override(&report(), &cal, "q3", 0, 2, "  ");
        assert_eq!(out.report.reviewer_overrides[0].note, DEFAULT_OVERRIDE_NOTE);
    }

    #[test]
    fn overrides_append_in_order() {
        let cal = ReviewerCalibration::new("Computer Science");
        let first = apply_override(&report(), &cal, "q1", 10, 9, "a");
        let second = apply_override(&first.report, &first.calibration, "q3", 0, 3, "b");
        let ids: Vec<_> = second
            .report
            .reviewer_overrides
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q3"]);
        assert_eq!(second.calibration.override_count, 2);
        assert_eq!(second.report.total_score, 9 + 4 + 3);
    }

    #[test]
    fn unknown_question_still_logs_and_calibrates() {
        let cal = ReviewerCalibration::new("Computer Science");
        let original = report();
        let out = apply_override(&original, &cal, "missing", 5, 7, "");
        assert_eq!(out.report.total_score, original.total_score);
        assert_eq!(out.report.reviewer_overrides.len(), 1);
        assert_eq!(out.calibration.override_count, 1);
    }

    #[test]
    fn input_report_is_untouched() {
        let cal = ReviewerCalibration::new("Computer Science");
        let original = report();
        let _ = apply_override(&original, &cal, "q1", 10, 0, "");
        assert_eq!(original.evaluation("q1").unwrap().score, 10);
        assert!(original.reviewer_overrides.is_empty());
    }

    #[test]
    fn json_uses_camel_case() {
        let json = serde_json::to_value(report()).unwrap();
        assert!(json.get("totalScore").is_some());
        assert!(json["evaluations"][0].get("reasoningTrace").is_some());
        assert!(json.get("reviewerOverrides").is_some());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let original = report();
        original.save_json(&path).unwrap();
        assert_eq!(Report::load_json(&path).unwrap(), original);
    }
}
