//! The `redpen regenerate` command.

use std::path::PathBuf;

use anyhow::Result;

use redpen_core::model::Assessment;
use redpen_core::store::{persist_best_effort, FsSnapshotStore, SnapshotKey};
use redpen_providers::{build_service, load_config_from};

pub async fn execute(
    assessment_path: PathBuf,
    question_id: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut assessment = Assessment::load_json(&assessment_path)?;

    let service = build_service(&config)?;
    let regenerated = service
        .regenerate(&assessment, &question_id)
        .await
        .ok_or_else(|| {
            anyhow::anyhow!(
                "assessment {} has no question '{question_id}'",
                assessment.id
            )
        })?;

    let origin = regenerated.origin;
    let question = regenerated.value;
    println!("{} ({} source)", question.prompt, origin);
    for slot in assessment.questions.iter_mut().filter(|q| q.id == question_id) {
        *slot = question.clone();
    }

    let path = output.unwrap_or(assessment_path);
    assessment.save_json(&path)?;
    let store = FsSnapshotStore::new(&config.store_dir);
    persist_best_effort(
        &store,
        &SnapshotKey::Assessment(assessment.id.clone()),
        &assessment,
    );
    println!("Assessment saved to: {}", path.display());
    Ok(())
}
