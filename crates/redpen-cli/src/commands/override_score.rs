//! The `redpen override` command.

use std::path::PathBuf;

use anyhow::Result;

use redpen_core::calibration::CalibrationStore;
use redpen_core::model::Assessment;
use redpen_core::report::{apply_override, Report};
use redpen_core::store::{persist_best_effort, FsSnapshotStore, SnapshotKey};
use redpen_providers::load_config_from;

pub fn execute(
    report_path: PathBuf,
    assessment_path: PathBuf,
    question_id: String,
    score: u32,
    note: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(score <= 10, "score must be between 0 and 10");
    let config = load_config_from(config_path.as_deref())?;

    let report = Report::load_json(&report_path)?;
    let assessment = Assessment::load_json(&assessment_path)?;
    anyhow::ensure!(
        report.assessment_id == assessment.id,
        "report belongs to assessment {}, not {}",
        report.assessment_id,
        assessment.id
    );
    let previous = report
        .evaluation(&question_id)
        .map(|e| e.score)
        .ok_or_else(|| anyhow::anyhow!("report has no evaluation for question '{question_id}'"))?;

    let store = FsSnapshotStore::new(&config.store_dir);
    let calibrations = CalibrationStore::new();
    calibrations.load_subject(&store, &assessment.subject)?;

    let outcome = apply_override(
        &report,
        &calibrations.snapshot(&assessment.subject),
        &question_id,
        previous,
        score,
        note.as_deref().unwrap_or_default(),
    );

    calibrations.insert(outcome.calibration.clone());
    calibrations.save_all(&store)?;
    outcome.report.save_json(&report_path)?;
    persist_best_effort(
        &store,
        &SnapshotKey::Report(outcome.report.assessment_id.clone()),
        &outcome.report,
    );

    println!(
        "{question_id}: {previous} -> {score} | total {}/{}",
        outcome.report.total_score, outcome.report.max_score
    );
    println!(
        "Calibration for {}: factor {:.2} after {} override(s)",
        outcome.calibration.subject,
        outcome.calibration.adjustment_factor,
        outcome.calibration.override_count
    );
    Ok(())
}
