//! The `redpen evaluate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use redpen_core::answers::{answer_completion_pct, total_time_spent};
use redpen_core::calibration::CalibrationStore;
use redpen_core::model::{Assessment, CandidateAnswer};
use redpen_core::report::Report;
use redpen_core::store::{load_json, persist_best_effort, FsSnapshotStore, SnapshotKey};
use redpen_core::traits::Submission;
use redpen_providers::{build_service, load_config_from};
use redpen_report::{write_html_report, write_markdown_report};

const FORMATS: [&str; 3] = ["json", "html", "markdown"];

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    assessment_path: PathBuf,
    answers_path: PathBuf,
    candidate: Option<String>,
    output: Option<PathBuf>,
    format: String,
    no_calibration: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let formats = parse_formats(&format)?;
    let config = load_config_from(config_path.as_deref())?;

    let assessment = Assessment::load_json(&assessment_path)?;
    let answers: Vec<CandidateAnswer> = load_json(&answers_path)
        .with_context(|| format!("failed to load answers: {}", answers_path.display()))?;

    let store = FsSnapshotStore::new(&config.store_dir);
    let calibration = if no_calibration {
        None
    } else {
        let calibrations = CalibrationStore::new();
        if let Err(e) = calibrations.load_subject(&store, &assessment.subject) {
            tracing::warn!(subject = %assessment.subject, "ignoring unreadable calibration: {e:#}");
        }
        Some(calibrations.snapshot(&assessment.subject))
    };
    if let Some(calibration) = &calibration {
        eprintln!(
            "Calibration for {}: factor {:.2} after {} override(s)",
            calibration.subject, calibration.adjustment_factor, calibration.override_count
        );
    }

    eprintln!(
        "Answered {}% of {} questions, {}s on the clock",
        answer_completion_pct(&answers, assessment.questions.len()),
        assessment.questions.len(),
        total_time_spent(&answers)
    );

    let submission = Submission {
        candidate_id: candidate.unwrap_or_else(|| config.candidate_id.clone()),
        assessment,
        answers,
    };

    let service = build_service(&config)?;
    let evaluated = service.evaluate(&submission, calibration.as_ref()).await;
    let report = evaluated.value;

    super::print_report(&report);
    eprintln!("Evaluated by the {} source", evaluated.origin);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)?;
    for fmt in &formats {
        write_output(fmt, &report, &submission.assessment, &output)?;
    }

    let assessment_id = submission.assessment.id.clone();
    persist_best_effort(
        &store,
        &SnapshotKey::Answers(assessment_id.clone()),
        &submission.answers,
    );
    persist_best_effort(&store, &SnapshotKey::Report(assessment_id), &report);

    Ok(())
}

fn parse_formats(format: &str) -> Result<Vec<&str>> {
    if format == "all" {
        return Ok(FORMATS.to_vec());
    }
    let formats: Vec<&str> = format.split(',').map(str::trim).collect();
    for fmt in &formats {
        anyhow::ensure!(
            FORMATS.contains(fmt),
            "unknown format '{fmt}' (expected json, html, markdown or all)"
        );
    }
    Ok(formats)
}

fn write_output(fmt: &str, report: &Report, assessment: &Assessment, output: &Path) -> Result<()> {
    let stem = format!("report-{}", report.assessment_id);
    match fmt {
        "json" => {
            let path = output.join(format!("{stem}.json"));
            report.save_json(&path)?;
            println!("Report saved to: {}", path.display());
        }
        "html" => {
            let path = output.join(format!("{stem}.html"));
            write_html_report(report, assessment, &path)?;
            println!("HTML report: {}", path.display());
        }
        "markdown" => {
            let path = output.join(format!("{stem}.md"));
            write_markdown_report(report, assessment, &path)?;
            println!("Markdown report: {}", path.display());
        }
        other => anyhow::bail!("unknown format '{other}'"),
    }
    Ok(())
}
