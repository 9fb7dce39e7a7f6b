//! Core data model types for redpen.
//!
//! These types describe an assessment, its questions and a candidate's
//! answers. Field names serialize in camelCase so the same JSON shape is
//! accepted from remote sources and snapshot files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Multiplier used for time budgets and free-text scoring.
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.4,
            Difficulty::Hard => 1.8,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// The kind of answer a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Descriptive,
    Coding,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Mcq => write!(f, "mcq"),
            QuestionKind::Descriptive => write!(f, "descriptive"),
            QuestionKind::Coding => write!(f, "coding"),
        }
    }
}

/// Languages a coding answer may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Python,
    Go,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    CSharp,
    Rust,
    Kotlin,
    Swift,
    Ruby,
    Php,
}

impl CodeLanguage {
    /// Every supported language, in presentation order.
    pub const ALL: [CodeLanguage; 12] = [
        CodeLanguage::Python,
        CodeLanguage::Go,
        CodeLanguage::JavaScript,
        CodeLanguage::TypeScript,
        CodeLanguage::Java,
        CodeLanguage::Cpp,
        CodeLanguage::CSharp,
        CodeLanguage::Rust,
        CodeLanguage::Kotlin,
        CodeLanguage::Swift,
        CodeLanguage::Ruby,
        CodeLanguage::Php,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CodeLanguage::Python => "python",
            CodeLanguage::Go => "go",
            CodeLanguage::JavaScript => "javascript",
            CodeLanguage::TypeScript => "typescript",
            CodeLanguage::Java => "java",
            CodeLanguage::Cpp => "cpp",
            CodeLanguage::CSharp => "csharp",
            CodeLanguage::Rust => "rust",
            CodeLanguage::Kotlin => "kotlin",
            CodeLanguage::Swift => "swift",
            CodeLanguage::Ruby => "ruby",
            CodeLanguage::Php => "php",
        }
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "js" => return Ok(CodeLanguage::JavaScript),
            "ts" => return Ok(CodeLanguage::TypeScript),
            "golang" => return Ok(CodeLanguage::Go),
            "c++" => return Ok(CodeLanguage::Cpp),
            "c#" => return Ok(CodeLanguage::CSharp),
            _ => {}
        }
        CodeLanguage::ALL
            .into_iter()
            .find(|l| l.as_str() == lower)
            .ok_or_else(|| format!("unknown language: {s}"))
    }
}

/// A weighted rubric criterion. Weights are used as direct multipliers and
/// are not required to sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub label: String,
    pub weight: f64,
    pub description: String,
}

/// A single multiple-choice option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub text: String,
}

/// Starter code shipped with a coding question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTemplate {
    pub language: CodeLanguage,
    pub starter: String,
}

/// An input/expected-output pair for a coding question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
    #[serde(default)]
    pub hidden: bool,
}

/// A single question of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub topic: String,
    pub sub_topic: String,
    pub difficulty: Difficulty,
    pub kind: QuestionKind,
    pub prompt: String,
    /// Glossary terms referenced by the prompt.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, String>,
    /// Choices, for `mcq` questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<String>,
    pub rubric: Vec<RubricCriterion>,
    /// Time budget in seconds.
    pub estimated_seconds: u32,
    /// Starter code, for `coding` questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_templates: Vec<CodeTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<TestCase>,
}

/// A generated assessment. Read-only input to scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub subject: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
    pub reading_time_minutes: u32,
    pub strategy_note: String,
}

impl Assessment {
    /// Look up a question by id.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Save the assessment as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        crate::store::save_json(self, path)
    }

    /// Load an assessment from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        crate::store::load_json(path)
    }
}

/// One frame of a candidate's coding history, kept for reviewer replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnapshot {
    pub at_ms: u64,
    pub language: CodeLanguage,
    pub code: String,
}

/// A candidate's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAnswer {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptive_answer: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub code_by_language: BTreeMap<CodeLanguage, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_language: Option<CodeLanguage>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub flagged: bool,
    /// Cumulative time spent on the question, in seconds.
    #[serde(default)]
    pub time_spent_seconds: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_timeline: Vec<CodeSnapshot>,
}

impl CandidateAnswer {
    /// A fresh answer with nothing filled in and zero time spent.
    pub fn empty(question_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            selected_option_id: None,
            descriptive_answer: None,
            code_by_language: BTreeMap::new(),
            selected_language: None,
            confirmed: false,
            flagged: false,
            time_spent_seconds: 0,
            code_timeline: Vec::new(),
        }
    }

    /// The language the answer is scored in. Defaults to Python.
    pub fn effective_language(&self) -> CodeLanguage {
        self.selected_language.unwrap_or(CodeLanguage::Python)
    }

    /// Code written in the effective language, or an empty string.
    pub fn submitted_code(&self) -> &str {
        self.code_by_language
            .get(&self.effective_language())
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_display_and_parse() {
        assert_eq!(Difficulty::Medium.to_string(), "medium");
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert!(Difficulty::Easy < Difficulty::Hard);
    }

    #[test]
    fn language_parse_aliases() {
        assert_eq!("golang".parse::<CodeLanguage>().unwrap(), CodeLanguage::Go);
        assert_eq!("TS".parse::<CodeLanguage>().unwrap(), CodeLanguage::TypeScript);
        assert_eq!("csharp".parse::<CodeLanguage>().unwrap(), CodeLanguage::CSharp);
        assert!("cobol".parse::<CodeLanguage>().is_err());
    }

    #[test]
    fn answer_serializes_camel_case_with_language_keys() {
        let mut answer = CandidateAnswer::empty("q-5");
        answer.selected_language = Some(CodeLanguage::Go);
        answer
            .code_by_language
            .insert(CodeLanguage::Go, "func f() {}".into());
        answer.time_spent_seconds = 42;

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["questionId"], "q-5");
        assert_eq!(json["codeByLanguage"]["go"], "func f() {}");
        assert_eq!(json["timeSpentSeconds"], 42);

        let back: CandidateAnswer = serde_json::from_value(json).unwrap();
        assert_eq!(back.submitted_code(), "func f() {}");
    }

    #[test]
    fn submitted_code_defaults_to_python() {
        let mut answer = CandidateAnswer::empty("q-1");
        assert_eq!(answer.submitted_code(), "");
        answer
            .code_by_language
            .insert(CodeLanguage::Python, "def f(): pass".into());
        assert_eq!(answer.effective_language(), CodeLanguage::Python);
        assert_eq!(answer.submitted_code(), "def f(): pass");
    }

    #[test]
    fn minimal_answer_json_uses_defaults() {
        let answer: CandidateAnswer =
            serde_json::from_str(r#"{"questionId":"q-1","selectedOptionId":"b"}"#).unwrap();
        assert_eq!(answer.selected_option_id.as_deref(), Some("b"));
        assert_eq!(answer.time_spent_seconds, 0);
        assert!(!answer.flagged);
    }
}
