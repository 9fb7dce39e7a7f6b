//! Deterministic question synthesis.
//!
//! Builds a difficulty-ramped question set for a subject from fixed
//! templates. Everything except the assessment id and creation timestamp is
//! a pure function of the subject string.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::glossary::{self, Glossary, CS_GLOSSARY};
use crate::model::{
    Assessment, ChoiceOption, CodeLanguage, CodeTemplate, Difficulty, Question, QuestionKind,
    RubricCriterion, TestCase,
};

/// Question count used for subjects without a dedicated entry.
pub const DEFAULT_QUESTION_COUNT: usize = 9;

const SUBJECT_QUESTION_COUNTS: &[(&str, usize)] = &[
    ("Computer Science", 10),
    ("Machine Learning", 9),
    ("System Design", 8),
    ("Data Structures", 10),
];

const SUBJECT_STRATEGIES: &[(&str, &str)] = &[
    (
        "Computer Science",
        "Opens with core recall, moves into complexity reasoning, and closes with synthesis and implementation.",
    ),
    (
        "Machine Learning",
        "Opens with concept checks, moves into tradeoff analysis, then model critique and implementation choices.",
    ),
    (
        "System Design",
        "Opens with requirement clarity, advances into scaling constraints, and closes with failure-mode reasoning.",
    ),
    (
        "Data Structures",
        "Moves from identification to complexity tradeoffs and implementation-level edge-case handling.",
    ),
];

const DEFAULT_STRATEGY: &str =
    "Starts from fundamentals and steadily raises abstraction and ambiguity.";

const MCQ_SUB_TOPICS: [&str; 4] = ["Foundations", "Algorithms", "Systems", "Reasoning"];

/// Suffix appended to a prompt when a question is regenerated.
pub const REFINEMENT_NOTE: &str =
    "(Refined variant: reframed context with one additional edge condition.)";

/// Map a zero-based question index to its difficulty tier.
///
/// The normalized position `index / max(total - 1, 1)` is `easy` below 0.35,
/// `medium` below 0.75 and `hard` otherwise, so difficulty never decreases
/// as the index grows.
pub fn difficulty_for(index: usize, total: usize) -> Difficulty {
    let span = total.saturating_sub(1).max(1);
    let ratio = index as f64 / span as f64;
    if ratio < 0.35 {
        Difficulty::Easy
    } else if ratio < 0.75 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

/// Deterministic kind cycle: every fifth slot is coding, every third of the
/// rest descriptive, everything else multiple choice.
pub fn kind_for(index: usize) -> QuestionKind {
    if index % 5 == 4 {
        QuestionKind::Coding
    } else if index % 3 == 2 {
        QuestionKind::Descriptive
    } else {
        QuestionKind::Mcq
    }
}

/// Number of questions synthesized for a subject.
pub fn question_count_for(subject: &str) -> usize {
    SUBJECT_QUESTION_COUNTS
        .iter()
        .find(|(s, _)| *s == subject)
        .map(|(_, n)| *n)
        .unwrap_or(DEFAULT_QUESTION_COUNT)
}

/// Strategy note shown to reviewers for a subject.
pub fn strategy_for(subject: &str) -> &'static str {
    SUBJECT_STRATEGIES
        .iter()
        .find(|(s, _)| *s == subject)
        .map(|(_, note)| *note)
        .unwrap_or(DEFAULT_STRATEGY)
}

/// Time budget for the question at `index`.
pub fn estimated_seconds(index: usize, difficulty: Difficulty) -> u32 {
    ((95.0 + index as f64 * 18.0) * difficulty.weight()).round() as u32
}

/// Reading time across all prompts: `ceil(sum(len / 18) / 220)`.
pub fn reading_time_minutes(questions: &[Question]) -> u32 {
    let units: f64 = questions
        .iter()
        .map(|q| q.prompt.chars().count() as f64 / 18.0)
        .sum();
    (units / 220.0).ceil() as u32
}

/// The fixed rubric attached to every question of a kind.
pub fn rubric_for(kind: QuestionKind) -> Vec<RubricCriterion> {
    let criteria: &[(&str, f64, &str)] = match kind {
        QuestionKind::Mcq => &[
            ("Concept Correctness", 0.8, "Checks the core concept."),
            ("Decision Quality", 0.2, "Checks the choice under constraints."),
        ],
        QuestionKind::Coding => &[
            ("Correctness", 0.45, "Passes the required scenarios."),
            ("Complexity", 0.25, "Time and space quality."),
            ("Code clarity", 0.15, "Readable and structured."),
            ("Edge cases", 0.15, "Handles corner conditions."),
        ],
        QuestionKind::Descriptive => &[
            ("Technical depth", 0.4, "Correct and nuanced reasoning."),
            ("Structure", 0.25, "Clear argument flow."),
            ("Tradeoff analysis", 0.35, "Competing choices explained."),
        ],
    };
    criteria
        .iter()
        .map(|(label, weight, description)| RubricCriterion {
            label: label.to_string(),
            weight: *weight,
            description: description.to_string(),
        })
        .collect()
}

/// Build a complete assessment for `subject`.
pub fn synthesize_assessment(subject: &str) -> Assessment {
    let total = question_count_for(subject);
    let glossary = glossary::for_subject(subject);
    let questions: Vec<Question> = (0..total)
        .map(|index| build_question(subject, index, total, glossary))
        .collect();

    let assessment = Assessment {
        id: format!("asmt-{}", Uuid::new_v4().simple()),
        subject: subject.to_string(),
        title: format!("{subject} Adaptive Assessment"),
        created_at: Utc::now(),
        reading_time_minutes: reading_time_minutes(&questions),
        strategy_note: strategy_for(subject).to_string(),
        questions,
    };

    tracing::info!(
        subject,
        id = %assessment.id,
        questions = assessment.questions.len(),
        "synthesized assessment"
    );
    assessment
}

/// Build the question at `index` of a `total`-question assessment.
pub fn build_question(subject: &str, index: usize, total: usize, glossary: Glossary) -> Question {
    let difficulty = difficulty_for(index, total);
    let kind = kind_for(index);
    let (term, term_definition) = glossary[index % glossary.len()];
    let (other, other_definition) = glossary[(index + 2) % glossary.len()];

    let shared_prompt = format!(
        "In {subject}, explain how **{term}** shapes system behavior and contrast it briefly \
         with **{other}**. Then compare $O(n \\log n)$ with $O(n^2)$ for $n=10^5$."
    );
    let term_definitions: BTreeMap<String, String> = [
        (term.to_string(), term_definition.to_string()),
        (other.to_string(), other_definition.to_string()),
    ]
    .into_iter()
    .collect();

    let mut question = Question {
        id: format!("q-{}", index + 1),
        topic: subject.to_string(),
        sub_topic: String::new(),
        difficulty,
        kind,
        prompt: String::new(),
        definitions: BTreeMap::new(),
        options: Vec::new(),
        correct_option_id: None,
        rubric: rubric_for(kind),
        estimated_seconds: estimated_seconds(index, difficulty),
        code_templates: Vec::new(),
        test_cases: Vec::new(),
    };

    match kind {
        QuestionKind::Mcq => {
            question.sub_topic = MCQ_SUB_TOPICS[index % MCQ_SUB_TOPICS.len()].to_string();
            question.prompt = format!("{shared_prompt}\n\nPick the most defensible statement.");
            question.definitions = term_definitions;
            question.options = choice_options();
            question.correct_option_id = Some("b".to_string());
        }
        QuestionKind::Descriptive => {
            question.sub_topic = "Analysis".to_string();
            question.prompt = format!(
                "{shared_prompt}\n\nWrite a structured answer covering assumptions, approach, and failure cases."
            );
            question.definitions = term_definitions;
        }
        QuestionKind::Coding => {
            question.sub_topic = "Implementation".to_string();
            question.prompt = "Implement `first_unique_char(s)` returning the index of the first \
                               non-repeating character, or `-1` if there is none. Note the \
                               complexity of your approach in a comment."
                .to_string();
            question.definitions = ["invariant", "latency"]
                .into_iter()
                .filter_map(|t| glossary::define(CS_GLOSSARY, t).map(|d| (t.to_string(), d.to_string())))
                .collect();
            question.code_templates = canonical_templates();
            question.test_cases = canonical_test_cases();
        }
    }

    question
}

/// Produce a refined variant of one question, or `None` for an unknown id.
pub fn regenerate_question(assessment: &Assessment, question_id: &str) -> Option<Question> {
    let original = assessment.question(question_id)?;
    let mut refined = original.clone();
    refined.prompt = format!("{}\n\n{REFINEMENT_NOTE}", original.prompt);
    refined.estimated_seconds = (original.estimated_seconds as f64 * 1.1).round() as u32;
    Some(refined)
}

fn choice_options() -> Vec<ChoiceOption> {
    [
        ("a", "1", "The first approach is optimal at every scale."),
        (
            "b",
            "2",
            "The right choice depends on growth rate and constraints; asymptotics matter.",
        ),
        (
            "c",
            "3",
            "Complexity classes stop mattering once small inputs run fast.",
        ),
        ("d", "4", "Both become equivalent after compiler optimization."),
    ]
    .into_iter()
    .map(|(id, label, text)| ChoiceOption {
        id: id.to_string(),
        label: label.to_string(),
        text: text.to_string(),
    })
    .collect()
}

/// Starter templates for the canonical first-unique-character problem.
pub fn canonical_templates() -> Vec<CodeTemplate> {
    vec![
        CodeTemplate {
            language: CodeLanguage::Python,
            starter: "def first_unique_char(s: str) -> int:\n    # write solution\n    return -1\n"
                .to_string(),
        },
        CodeTemplate {
            language: CodeLanguage::Go,
            starter: "package main\n\nfunc firstUniqueChar(s string) int {\n\t// write solution\n\treturn -1\n}\n"
                .to_string(),
        },
        CodeTemplate {
            language: CodeLanguage::Rust,
            starter: "pub fn first_unique_char(s: &str) -> i32 {\n    // write solution\n    -1\n}\n"
                .to_string(),
        },
    ]
}

/// Visible and hidden cases for the canonical problem.
pub fn canonical_test_cases() -> Vec<TestCase> {
    [
        ("\"leetcode\"", "0", false),
        ("\"aabb\"", "-1", false),
        ("\"abac\"", "1", true),
        ("\"xxyz\"", "2", true),
    ]
    .into_iter()
    .map(|(input, expected, hidden)| TestCase {
        input: input.to_string(),
        expected: expected.to_string(),
        hidden,
    })
    .collect()
}
