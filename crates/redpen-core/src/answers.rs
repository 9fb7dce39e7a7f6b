//! Helpers for building up a candidate's answer list during a session.

use crate::model::{CandidateAnswer, CodeLanguage, CodeSnapshot};

/// The answer for `question_id`, or a fresh one with zero time spent.
pub fn ensure_answer(answers: &[CandidateAnswer], question_id: &str) -> CandidateAnswer {
    answers
        .iter()
        .find(|a| a.question_id == question_id)
        .cloned()
        .unwrap_or_else(|| CandidateAnswer::empty(question_id))
}

/// Apply `update` to the answer for `question_id`.
///
/// Existing answers for that question are removed and the updated answer is
/// appended at the end.
pub fn update_answer<F>(answers: &mut Vec<CandidateAnswer>, question_id: &str, update: F)
where
    F: FnOnce(&mut CandidateAnswer),
{
    let mut answer = ensure_answer(answers, question_id);
    update(&mut answer);
    answers.retain(|a| a.question_id != question_id);
    answers.push(answer);
}

/// Whether the candidate has done anything with this answer.
pub fn is_attempted(answer: &CandidateAnswer) -> bool {
    answer.confirmed
        || answer.selected_option_id.is_some()
        || answer
            .descriptive_answer
            .as_deref()
            .is_some_and(|text| !text.is_empty())
        || !answer.code_by_language.is_empty()
}

/// Percentage of `total_questions` with an attempted answer; 0 for none.
pub fn answer_completion_pct(answers: &[CandidateAnswer], total_questions: usize) -> u32 {
    if total_questions == 0 {
        return 0;
    }
    let completed = answers.iter().filter(|a| is_attempted(a)).count();
    (completed as f64 / total_questions as f64 * 100.0).round() as u32
}

pub fn total_time_spent(answers: &[CandidateAnswer]) -> u64 {
    answers.iter().map(|a| a.time_spent_seconds as u64).sum()
}

/// Record a code edit: store it as the current code for `language` and
/// append a timeline frame for replay.
pub fn record_code(answer: &mut CandidateAnswer, at_ms: u64, language: CodeLanguage, code: &str) {
    answer.selected_language = Some(language);
    answer.code_by_language.insert(language, code.to_string());
    answer.code_timeline.push(CodeSnapshot {
        at_ms,
        language,
        code: code.to_string(),
    });
}

/// Timeline frames for one language, in recording order.
pub fn replay_frames(answer: &CandidateAnswer, language: CodeLanguage) -> Vec<&CodeSnapshot> {
    answer
        .code_timeline
        .iter()
        .filter(|frame| frame.language == language)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_lazily() {
        let answers: Vec<CandidateAnswer> = vec![];
        let a = ensure_answer(&answers, "q-3");
        assert_eq!(a.question_id, "q-3");
        assert_eq!(a.time_spent_seconds, 0);
        assert!(!is_attempted(&a));
    }

    #[test]
    fn update_replaces_and_appends() {
        let mut answers = vec![CandidateAnswer::empty("q-1"), CandidateAnswer::empty("q-2")];
        update_answer(&mut answers, "q-1", |a| {
            a.selected_option_id = Some("b".into());
            a.time_spent_seconds += 12;
        });
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1].question_id, "q-1");
        assert_eq!(answers[1].selected_option_id.as_deref(), Some("b"));

        update_answer(&mut answers, "q-9", |a| a.flagged = true);
        assert_eq!(answers.len(), 3);
        assert!(answers[2].flagged);
    }

    #[test]
    fn completion_and_time() {
        let mut answers = vec![];
        update_answer(&mut answers, "q-1", |a| {
            a.confirmed = true;
            a.time_spent_seconds = 40;
        });
        update_answer(&mut answers, "q-2", |a| {
            a.descriptive_answer = Some(String::new());
            a.time_spent_seconds = 5;
        });
        update_answer(&mut answers, "q-3", |a| {
            record_code(a, 1_000, CodeLanguage::Rust, "fn main() {}");
        });
        assert_eq!(answer_completion_pct(&answers, 3), 67);
        assert_eq!(answer_completion_pct(&answers, 0), 0);
        assert_eq!(total_time_spent(&answers), 45);
    }

    #[test]
    fn code_timeline_replay() {
        let mut answer = CandidateAnswer::empty("q-5");
        record_code(&mut answer, 100, CodeLanguage::Python, "x = {}");
        record_code(&mut answer, 200, CodeLanguage::Go, "m := make(map[rune]int)");
        record_code(&mut answer, 300, CodeLanguage::Python, "x = {}\nfor c in s: pass");

        let frames = replay_frames(&answer, CodeLanguage::Python);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].at_ms, 300);
        assert_eq!(answer.selected_language, Some(CodeLanguage::Python));
        assert_eq!(answer.submitted_code(), "x = {}\nfor c in s: pass");
    }
}
