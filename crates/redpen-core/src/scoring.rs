//! Per-kind answer scorers.
//!
//! Each scorer maps an answer to a raw `0..=10` score and a confidence in
//! `[0, 1]`. A reviewer calibration, when supplied, rescales the raw score
//! before the rubric is decomposed.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::calibration::ReviewerCalibration;
use crate::model::{CandidateAnswer, Question, QuestionKind};

/// Confidence of an exact option match.
pub const CHOICE_CONFIDENCE: f64 = 0.95;

/// Confidence reported for a coding question without test cases.
pub const NO_TEST_CASES_CONFIDENCE: f64 = 0.35;

static STRUCTURE_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)assumption|tradeoff|edge|complexity").expect("invalid structure regex")
});

static MAP_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)dict|map|make\(|\{\}").expect("invalid map marker regex"));

static LOOP_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)for .*for |count|range|len\(").expect("invalid loop marker regex")
});

static COMPLEXITY_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)O\(|complex").expect("invalid complexity regex"));

static EMPTY_INPUT_GUARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)-1|empty|len\(s\)==0|if s == ""|if len\(s\) == 0"#)
        .expect("invalid edge-case regex")
});

/// A raw score before rubric decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScore {
    /// Integer score in `0..=10`.
    pub score: u32,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Scores one kind of answer.
pub trait Scorer: Send + Sync {
    /// The question kind this scorer handles.
    fn kind(&self) -> QuestionKind;

    /// Score an answer. `None` means the candidate never touched the question.
    fn score(&self, question: &Question, answer: Option<&CandidateAnswer>) -> RawScore;
}

/// Exact-match scorer for multiple-choice questions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChoiceScorer;

impl Scorer for ChoiceScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Mcq
    }

    fn score(&self, question: &Question, answer: Option<&CandidateAnswer>) -> RawScore {
        let selected = answer.and_then(|a| a.selected_option_id.as_deref());
        let correct = selected.is_some() && selected == question.correct_option_id.as_deref();
        RawScore {
            score: if correct { 10 } else { 0 },
            confidence: CHOICE_CONFIDENCE,
        }
    }
}

/// Length/structure/clarity heuristic for descriptive answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FreeTextScorer;

impl FreeTextScorer {
    fn raw_points(text: &str) -> f64 {
        let length = (text.chars().count() as f64 / 240.0).min(1.0) * 5.0;
        let structure = if STRUCTURE_KEYWORDS.is_match(text) {
            3.0
        } else {
            1.5
        };
        let clarity = if text.contains(['\n', '.', ':']) {
            2.0
        } else {
            1.0
        };
        length + structure + clarity
    }
}

impl Scorer for FreeTextScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Descriptive
    }

    fn score(&self, question: &Question, answer: Option<&CandidateAnswer>) -> RawScore {
        let raw_text = answer
            .and_then(|a| a.descriptive_answer.as_deref())
            .unwrap_or("");
        let confidence = (0.45 + raw_text.chars().count() as f64 / 1200.0).min(0.9);

        let text = raw_text.trim();
        if text.is_empty() {
            return RawScore {
                score: 0,
                confidence,
            };
        }

        let scaled = Self::raw_points(text) * question.difficulty.weight();
        RawScore {
            score: (scaled.round() as u32).min(10),
            confidence,
        }
    }
}

/// Produces the output of a submitted program for one test input.
///
/// The built-in implementation is a textual heuristic; a sandboxed executor
/// can be substituted without touching the rest of the scoring pipeline.
pub trait CodeChecker: Send + Sync {
    fn run(&self, code: &str, input: &str) -> String;
}

/// Pattern heuristic for the canonical first-unique-character problem.
///
/// Nothing is executed. If the code mentions both a map construction and an
/// iteration construct, the checker reports the correct answer for the input;
/// otherwise it reports `-1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternChecker;

impl PatternChecker {
    /// Whether the code carries both marker families.
    pub fn recognizes(code: &str) -> bool {
        MAP_MARKERS.is_match(code) && LOOP_MARKERS.is_match(code)
    }
}

impl CodeChecker for PatternChecker {
    fn run(&self, code: &str, input: &str) -> String {
        if code.is_empty() || !Self::recognizes(code) {
            return "-1".to_string();
        }
        let chars: Vec<char> = input.chars().filter(|c| *c != '"').collect();
        let mut counts = std::collections::HashMap::new();
        for c in &chars {
            *counts.entry(*c).or_insert(0u32) += 1;
        }
        chars
            .iter()
            .position(|c| counts.get(c) == Some(&1))
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-1".to_string())
    }
}

/// Scores coding answers by replaying the question's test cases through a
/// [`CodeChecker`].
pub struct CodingScorer {
    checker: Box<dyn CodeChecker>,
}

impl CodingScorer {
    pub fn new(checker: Box<dyn CodeChecker>) -> Self {
        Self { checker }
    }
}

impl Default for CodingScorer {
    fn default() -> Self {
        Self::new(Box::new(PatternChecker))
    }
}

impl Scorer for CodingScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Coding
    }

    fn score(&self, question: &Question, answer: Option<&CandidateAnswer>) -> RawScore {
        if question.test_cases.is_empty() {
            return RawScore {
                score: 0,
                confidence: NO_TEST_CASES_CONFIDENCE,
            };
        }

        let code = answer.map(CandidateAnswer::submitted_code).unwrap_or("");
        let passed = question
            .test_cases
            .iter()
            .filter(|tc| self.checker.run(code, &tc.input) == tc.expected)
            .count();
        let passed_fraction = passed as f64 / question.test_cases.len() as f64;

        let complexity_bonus = if COMPLEXITY_NOTE.is_match(code) {
            1.5
        } else {
            0.2
        };
        let edge_case_bonus = if EMPTY_INPUT_GUARD.is_match(code) {
            1.5
        } else {
            0.5
        };
        let total = (passed_fraction * 7.0 + complexity_bonus + edge_case_bonus).min(10.0);

        tracing::debug!(
            question = %question.id,
            passed,
            cases = question.test_cases.len(),
            "coding heuristic replayed"
        );

        RawScore {
            score: total.round() as u32,
            confidence: (0.45 + passed_fraction / 2.0).min(0.95),
        }
    }
}

/// One scorer per question kind.
#[derive(Default)]
pub struct ScorerSet {
    choice: ChoiceScorer,
    free_text: FreeTextScorer,
    coding: CodingScorer,
}

impl ScorerSet {
    /// Replace the checker used for coding answers.
    pub fn with_code_checker(mut self, checker: Box<dyn CodeChecker>) -> Self {
        self.coding = CodingScorer::new(checker);
        self
    }

    /// The scorer responsible for `kind`.
    pub fn scorer(&self, kind: QuestionKind) -> &dyn Scorer {
        match kind {
            QuestionKind::Mcq => &self.choice,
            QuestionKind::Descriptive => &self.free_text,
            QuestionKind::Coding => &self.coding,
        }
    }

    /// Score an answer and apply the calibration factor, if any.
    pub fn score(
        &self,
        question: &Question,
        answer: Option<&CandidateAnswer>,
        calibration: Option<&ReviewerCalibration>,
    ) -> RawScore {
        let raw = self.scorer(question.kind).score(question, answer);
        match calibration {
            Some(cal) => RawScore {
                score: cal.apply(raw.score),
                confidence: raw.confidence,
            },
            None => raw,
        }
    }
}
