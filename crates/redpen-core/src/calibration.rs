//! Reviewer calibration: a bounded, per-subject score multiplier.
//!
//! Each reviewer override nudges the factor by `(new - previous) / 200`,
//! clamped to `[0.7, 1.3]`. Overrides compound in the order they arrive.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::{load_snapshot, SnapshotKey, SnapshotStore};

pub const MIN_FACTOR: f64 = 0.7;
pub const MAX_FACTOR: f64 = 1.3;
const DELTA_DIVISOR: f64 = 200.0;

/// Calibration state for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerCalibration {
    pub subject: String,
    pub adjustment_factor: f64,
    pub override_count: u32,
}

impl ReviewerCalibration {
    /// Neutral calibration: factor 1.0, no overrides.
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            adjustment_factor: 1.0,
            override_count: 0,
        }
    }

    /// The calibration after one more reviewer override.
    pub fn with_override(&self, previous_score: u32, new_score: u32) -> Self {
        let delta = new_score as f64 - previous_score as f64;
        Self {
            subject: self.subject.clone(),
            adjustment_factor: (self.adjustment_factor + delta / DELTA_DIVISOR)
                .clamp(MIN_FACTOR, MAX_FACTOR),
            override_count: self.override_count + 1,
        }
    }

    /// Rescale a raw score: `clamp(0, 10, round(raw * factor))`.
    pub fn apply(&self, raw_score: u32) -> u32 {
        let factor = self.adjustment_factor.clamp(MIN_FACTOR, MAX_FACTOR);
        (raw_score as f64 * factor).round().clamp(0.0, 10.0) as u32
    }
}

/// Keyed calibration store (subject → calibration).
///
/// Each override is a read-modify-write under the write lock; readers take
/// an owned snapshot so concurrent evaluations never observe a half-applied
/// update.
#[derive(Debug, Default)]
pub struct CalibrationStore {
    entries: RwLock<HashMap<String, ReviewerCalibration>>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored calibration for `subject`, if any override was ever recorded.
    pub fn get(&self, subject: &str) -> Option<ReviewerCalibration> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(subject)
            .cloned()
    }

    /// Immutable snapshot for scoring; neutral if the subject is unknown.
    pub fn snapshot(&self, subject: &str) -> ReviewerCalibration {
        self.get(subject)
            .unwrap_or_else(|| ReviewerCalibration::new(subject))
    }

    /// Replace the calibration for its subject.
    pub fn insert(&self, calibration: ReviewerCalibration) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(calibration.subject.clone(), calibration);
    }

    /// Apply one reviewer override atomically and return the new state.
    pub fn record_override(
        &self,
        subject: &str,
        previous_score: u32,
        new_score: u32,
    ) -> ReviewerCalibration {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let current = entries
            .get(subject)
            .cloned()
            .unwrap_or_else(|| ReviewerCalibration::new(subject));
        let updated = current.with_override(previous_score, new_score);
        entries.insert(subject.to_string(), updated.clone());
        tracing::info!(
            subject,
            factor = updated.adjustment_factor,
            overrides = updated.override_count,
            "calibration updated"
        );
        updated
    }

    /// All calibrations, sorted by subject.
    pub fn all(&self) -> Vec<ReviewerCalibration> {
        let mut all: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.subject.cmp(&b.subject));
        all
    }

    /// Load the stored calibration for `subject` into this store.
    ///
    /// A snapshot recorded for a different subject is ignored.
    pub fn load_subject(&self, store: &dyn SnapshotStore, subject: &str) -> Result<bool> {
        match load_snapshot::<ReviewerCalibration>(store, &SnapshotKey::Calibration(subject.into()))? {
            Some(calibration) if calibration.subject != subject => {
                tracing::warn!(
                    subject,
                    stored = %calibration.subject,
                    "ignoring calibration snapshot stored for another subject"
                );
                Ok(false)
            }
            Some(calibration) => {
                self.insert(calibration);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write every calibration to the snapshot store.
    pub fn save_all(&self, store: &dyn SnapshotStore) -> Result<()> {
        for calibration in self.all() {
            let payload = serde_json::to_value(&calibration)?;
            store.put(&SnapshotKey::Calibration(calibration.subject.clone()), &payload)?;
        }
        Ok(())
    }
}
