//! The `redpen validate` command.

use std::path::PathBuf;

use anyhow::Result;

use redpen_core::model::Assessment;
use redpen_core::report::Report;
use redpen_core::validate::{has_errors, validate_assessment, validate_report, Severity};

pub fn execute(assessment_path: PathBuf, report_path: Option<PathBuf>) -> Result<()> {
    let assessment = Assessment::load_json(&assessment_path)?;
    println!(
        "Assessment: {} ({} questions)",
        assessment.title,
        assessment.questions.len()
    );

    let mut issues = validate_assessment(&assessment);
    if let Some(path) = &report_path {
        let report = Report::load_json(path)?;
        println!(
            "Report: {} ({} evaluations)",
            report.candidate_id,
            report.evaluations.len()
        );
        issues.extend(validate_report(&report, &assessment));
    }

    for issue in &issues {
        let prefix = issue
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        let label = match issue.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        println!("{prefix} {label}: {}", issue.message);
    }

    if has_errors(&issues) {
        let count = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        anyhow::bail!("{count} validation error(s) found");
    }

    if issues.is_empty() {
        println!("All documents valid.");
    } else {
        println!("\n{} warning(s) found.", issues.len());
    }
    Ok(())
}
