//! Markdown summary, suitable for pasting into a review thread.

use anyhow::Result;
use std::path::Path;

use redpen_core::model::Assessment;
use redpen_core::report::Report;

/// Pipes would split a table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Render a report as Markdown.
pub fn to_markdown(report: &Report, assessment: &Assessment) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {}\n\n", assessment.title));
    md.push_str(&format!(
        "**Candidate:** {} | **Score:** {}/{} ({:.1}%) | **Percentile:** P{} | **Borderline:** {}\n\n",
        report.candidate_id,
        report.total_score,
        report.max_score,
        report.score_ratio() * 100.0,
        report.percentile,
        report.borderline_count()
    ));

    if !report.strongest_topics.is_empty() {
        let strongest: Vec<String> = report
            .strongest_topics
            .iter()
            .map(|t| format!("{} ({}%)", t.topic, t.score_pct))
            .collect();
        let weakest: Vec<String> = report
            .weakest_topics
            .iter()
            .map(|t| format!("{} ({}%)", t.topic, t.score_pct))
            .collect();
        md.push_str(&format!("- Strongest: {}\n", strongest.join(", ")));
        md.push_str(&format!("- Weakest: {}\n\n", weakest.join(", ")));
    }

    if !report.evaluations.is_empty() {
        md.push_str("### Evaluations\n\n");
        md.push_str("| Question | Topic | Kind | Score | Confidence | Borderline |\n");
        md.push_str("|----------|-------|------|-------|------------|------------|\n");
        for eval in &report.evaluations {
            let question = assessment.question(&eval.question_id);
            md.push_str(&format!(
                "| {} | {} | {} | {}/{} | {:.2} | {} |\n",
                eval.question_id,
                question.map(|q| cell(&q.sub_topic)).unwrap_or_else(|| "-".into()),
                question.map(|q| q.kind.to_string()).unwrap_or_else(|| "-".into()),
                eval.score,
                eval.max_score,
                eval.confidence,
                if eval.borderline { "yes" } else { "" }
            ));
        }
        md.push('\n');
    }

    if !report.reviewer_overrides.is_empty() {
        md.push_str("### Reviewer overrides\n\n");
        md.push_str("| Question | Previous | New | Note |\n");
        md.push_str("|----------|----------|-----|------|\n");
        for record in &report.reviewer_overrides {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                record.question_id,
                record.previous_score,
                record.new_score,
                cell(&record.note)
            ));
        }
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &Report, assessment: &Assessment, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_markdown(report, assessment))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::evaluated;

    #[test]
    fn markdown_has_summary_and_tables() {
        let (assessment, report) = evaluated();
        let md = to_markdown(&report, &assessment);
        assert!(md.starts_with("## Computer Science Adaptive Assessment"));
        assert!(md.contains("**Candidate:** candidate-001"));
        assert!(md.contains("### Evaluations"));
        assert!(md.contains("| q-10 |"));
        assert!(md.contains("### Reviewer overrides"));
        assert!(md.contains("- Strongest: "));
    }

    #[test]
    fn markdown_escapes_pipes_in_notes() {
        let (assessment, mut report) = evaluated();
        report.reviewer_overrides[0].note = "a | b\nc".into();
        let md = to_markdown(&report, &assessment);
        assert!(md.contains("a \\| b c"));
    }

    #[test]
    fn empty_report_has_only_header() {
        let (assessment, mut report) = evaluated();
        report.evaluations.clear();
        report.strongest_topics.clear();
        report.weakest_topics.clear();
        report.reviewer_overrides.clear();
        let md = to_markdown(&report, &assessment);
        assert!(!md.contains("###"));
        assert!(md.contains("**Percentile:**"));
    }

    #[test]
    fn write_markdown_to_disk() {
        let (assessment, report) = evaluated();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_markdown_report(&report, &assessment, &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("q-3"));
    }
}
