//! The `redpen calibration` command.

use std::path::PathBuf;

use anyhow::Result;

use redpen_core::calibration::CalibrationStore;
use redpen_core::store::FsSnapshotStore;
use redpen_providers::load_config_from;

pub fn execute(subject: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let subject = subject.unwrap_or_else(|| config.default_subject.clone());

    let store = FsSnapshotStore::new(&config.store_dir);
    let calibrations = CalibrationStore::new();
    let stored = calibrations.load_subject(&store, &subject)?;
    let calibration = calibrations.snapshot(&subject);

    println!(
        "{}: factor {:.2} after {} override(s){}",
        calibration.subject,
        calibration.adjustment_factor,
        calibration.override_count,
        if stored { "" } else { " (neutral, nothing stored)" }
    );
    Ok(())
}
