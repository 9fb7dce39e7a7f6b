//! redpen-report: reviewer-facing report rendering.
//!
//! Renders an evaluated report, together with its assessment, as a
//! self-contained HTML page or a Markdown summary.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::{to_markdown, write_markdown_report};

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use redpen_core::model::{Assessment, CandidateAnswer, CodeLanguage, QuestionKind};
    use redpen_core::report::{apply_override, Report};
    use redpen_core::{evaluate, synthesize_assessment, ReviewerCalibration};

    /// A Computer Science assessment with a mixed submission and one override.
    pub fn evaluated() -> (Assessment, Report) {
        let assessment = synthesize_assessment("Computer Science");
        let answers: Vec<CandidateAnswer> = assessment
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let mut a = CandidateAnswer::empty(&q.id);
                a.time_spent_seconds = 45 + i as u32 * 10;
                match q.kind {
                    QuestionKind::Mcq if i % 2 == 0 => a.selected_option_id = Some("b".into()),
                    QuestionKind::Mcq => a.selected_option_id = Some("d".into()),
                    QuestionKind::Descriptive => {
                        a.descriptive_answer = Some("Tradeoff: <cache> vs recompute.".into())
                    }
                    QuestionKind::Coding => {
                        a.selected_language = Some(CodeLanguage::Go);
                        a.code_by_language.insert(
                            CodeLanguage::Go,
                            "m := make(map[rune]int)\nfor _, c := range s { m[c]++ }".into(),
                        );
                    }
                }
                a
            })
            .collect();
        let report = evaluate(&assessment, &answers, None);
        let outcome = apply_override(
            &report,
            &ReviewerCalibration::new(&assessment.subject),
            "q-3",
            report.evaluations[2].score,
            8,
            "Solid reasoning & clear <structure>",
        );
        (assessment, outcome.report)
    }
}
