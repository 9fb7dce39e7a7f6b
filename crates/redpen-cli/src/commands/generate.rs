//! The `redpen generate` command.

use std::path::PathBuf;

use anyhow::Result;

use redpen_core::answers::ensure_answer;
use redpen_core::model::CandidateAnswer;
use redpen_core::store::{persist_best_effort, save_json, FsSnapshotStore, SnapshotKey};
use redpen_providers::{build_service, load_config_from};

pub async fn execute(
    subject: Option<String>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let subject = subject.unwrap_or_else(|| config.default_subject.clone());
    anyhow::ensure!(!subject.trim().is_empty(), "subject must not be empty");

    let service = build_service(&config)?;
    eprintln!(
        "redpen v{}: generating a {} assessment ({} source)",
        env!("CARGO_PKG_VERSION"),
        subject,
        service.source_name()
    );

    let generated = service.generate(&subject).await;
    let assessment = generated.value;

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)?;
    let assessment_path = output.join(format!("assessment-{}.json", assessment.id));
    assessment.save_json(&assessment_path)?;

    // Blank answers, one per question, ready to be filled in.
    let answers: Vec<CandidateAnswer> = assessment
        .questions
        .iter()
        .map(|q| ensure_answer(&[], &q.id))
        .collect();
    let answers_path = output.join(format!("answers-{}.json", assessment.id));
    save_json(&answers, &answers_path)?;

    let store = FsSnapshotStore::new(&config.store_dir);
    persist_best_effort(
        &store,
        &SnapshotKey::Assessment(assessment.id.clone()),
        &assessment,
    );

    super::print_questions(&assessment);
    println!(
        "Assessment {} ({} questions, ~{} min reading, {} source)",
        assessment.id,
        assessment.questions.len(),
        assessment.reading_time_minutes,
        generated.origin
    );
    println!("Strategy: {}", assessment.strategy_note);
    println!("Assessment saved to: {}", assessment_path.display());
    println!("Answers template: {}", answers_path.display());

    Ok(())
}
