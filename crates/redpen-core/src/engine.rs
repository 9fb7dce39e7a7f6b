//! Deterministic evaluation pipeline.
//!
//! Scores every question of an assessment against the candidate's answers,
//! decomposes the rubric, flags borderline answers and aggregates the report.

use chrono::Utc;

use crate::calibration::ReviewerCalibration;
use crate::model::{Assessment, CandidateAnswer, Question, QuestionKind};
use crate::report::{Evaluation, Report};
use crate::rubric::decompose;
use crate::scoring::ScorerSet;
use crate::statistics::{percentile, radar, strongest_and_weakest, timeline, topic_scores};

/// Candidate id used when the caller does not supply one.
pub const DEFAULT_CANDIDATE_ID: &str = "candidate-001";

/// Confidence below which any answer is flagged for review.
pub const BORDERLINE_CONFIDENCE: f64 = 0.62;

/// Whether an evaluation should be routed to a human reviewer.
///
/// Low confidence always flags. Mid-range scores (4 to 6) flag every kind
/// except multiple choice, which is never borderline in practice since its
/// confidence is fixed above the threshold.
pub fn is_borderline(kind: QuestionKind, score: u32, confidence: f64) -> bool {
    confidence < BORDERLINE_CONFIDENCE || ((4..=6).contains(&score) && kind != QuestionKind::Mcq)
}

/// Scores submissions into reports.
pub struct Evaluator {
    candidate_id: String,
    scorers: ScorerSet,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_ID)
    }
}

impl Evaluator {
    pub fn new(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            scorers: ScorerSet::default(),
        }
    }

    /// Use a custom scorer set (e.g. a different code checker).
    pub fn with_scorers(mut self, scorers: ScorerSet) -> Self {
        self.scorers = scorers;
        self
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    /// Evaluate a single question. A missing answer scores as the empty case
    /// for its kind.
    pub fn evaluate_question(
        &self,
        question: &Question,
        answer: Option<&CandidateAnswer>,
        calibration: Option<&ReviewerCalibration>,
    ) -> Evaluation {
        let raw = self.scorers.score(question, answer, calibration);
        Evaluation {
            question_id: question.id.clone(),
            score: raw.score,
            max_score: 10,
            confidence: raw.confidence,
            borderline: is_borderline(question.kind, raw.score, raw.confidence),
            reasoning_trace: format!(
                "Scoring notes: difficulty={}, kind={}, confidence={:.2}. Score derived from \
                 rubric coverage, correctness signals and clarity indicators.",
                question.difficulty, question.kind, raw.confidence
            ),
            rubric_scores: decompose(question, raw.score),
        }
    }

    /// Evaluate a full submission.
    ///
    /// Answers are matched to questions by id; the first answer wins when a
    /// question was answered more than once. The calibration is read once and
    /// applied uniformly to every question.
    pub fn evaluate(
        &self,
        assessment: &Assessment,
        answers: &[CandidateAnswer],
        calibration: Option<&ReviewerCalibration>,
    ) -> Report {
        let evaluations: Vec<Evaluation> = assessment
            .questions
            .iter()
            .map(|question| {
                let answer = answers.iter().find(|a| a.question_id == question.id);
                self.evaluate_question(question, answer, calibration)
            })
            .collect();

        let total_score: u32 = evaluations.iter().map(|e| e.score).sum();
        let max_score = 10 * evaluations.len() as u32;
        let topics = topic_scores(assessment, &evaluations);
        let (strongest_topics, weakest_topics) = strongest_and_weakest(&topics);
        let timeline = timeline(assessment.questions.len(), &evaluations, answers);

        let report = Report {
            assessment_id: assessment.id.clone(),
            candidate_id: self.candidate_id.clone(),
            submitted_at: Utc::now(),
            total_score,
            max_score,
            percentile: percentile(total_score, max_score),
            strongest_topics,
            weakest_topics,
            timeline,
            topic_radar: radar(&topics),
            evaluations,
            reviewer_overrides: Vec::new(),
        };

        tracing::info!(
            assessment = %report.assessment_id,
            candidate = %report.candidate_id,
            total = report.total_score,
            max = report.max_score,
            borderline = report.borderline_count(),
            "submission evaluated"
        );
        report
    }
}

/// Evaluate a submission with the default evaluator.
pub fn evaluate(
    assessment: &Assessment,
    answers: &[CandidateAnswer],
    calibration: Option<&ReviewerCalibration>,
) -> Report {
    Evaluator::default().evaluate(assessment, answers, calibration)
}
