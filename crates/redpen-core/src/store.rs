//! JSON persistence and the snapshot store.
//!
//! Snapshots are written best-effort: a failed write is logged and never
//! interrupts the candidate-facing flow.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))
}

/// Identity of a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    Assessment(String),
    /// Answers keyed by assessment id.
    Answers(String),
    /// Report keyed by assessment id.
    Report(String),
    /// Calibration keyed by subject.
    Calibration(String),
}

impl SnapshotKey {
    fn namespace(&self) -> &'static str {
        match self {
            SnapshotKey::Assessment(_) => "assessment",
            SnapshotKey::Answers(_) => "answers",
            SnapshotKey::Report(_) => "report",
            SnapshotKey::Calibration(_) => "calibration",
        }
    }

    fn id(&self) -> &str {
        match self {
            SnapshotKey::Assessment(id)
            | SnapshotKey::Answers(id)
            | SnapshotKey::Report(id)
            | SnapshotKey::Calibration(id) => id,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace(), self.id())
    }
}

/// An opaque key-value store for JSON snapshots.
pub trait SnapshotStore: Send + Sync {
    fn put(&self, key: &SnapshotKey, value: &serde_json::Value) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &SnapshotKey) -> Result<Option<serde_json::Value>>;
}

/// Filesystem snapshot store: one JSON file per key under `root/<namespace>/`.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`: a readable slug plus a digest of the exact id, so
    /// ids that slug alike ("C" and "C++") never share a file.
    pub fn path_for(&self, key: &SnapshotKey) -> PathBuf {
        self.root
            .join(key.namespace())
            .join(format!("{}.json", file_stem(key.id())))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn put(&self, key: &SnapshotKey, value: &serde_json::Value) -> Result<()> {
        save_json(value, &self.path_for(key)).with_context(|| format!("failed to store {key}"))
    }

    fn get(&self, key: &SnapshotKey) -> Result<Option<serde_json::Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        load_json(&path).map(Some)
    }
}

fn file_stem(id: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(id.as_bytes()));
    format!("{}-{}", slugify(id), &digest[..12])
}

/// Lowercase, with every run of non-alphanumerics collapsed to `-`.
fn slugify(id: &str) -> String {
    let mut slug = String::with_capacity(id.len());
    let mut pending_dash = false;
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push('_');
    }
    slug
}

/// Load and deserialize a snapshot.
pub fn load_snapshot<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    key: &SnapshotKey,
) -> Result<Option<T>> {
    match store.get(key)? {
        Some(value) => Ok(Some(
            serde_json::from_value(value).with_context(|| format!("malformed snapshot {key}"))?,
        )),
        None => Ok(None),
    }
}

/// Write a snapshot, logging instead of failing on error.
///
/// Returns whether the write succeeded.
pub fn persist_best_effort<T: Serialize>(
    store: &dyn SnapshotStore,
    key: &SnapshotKey,
    value: &T,
) -> bool {
    let result = serde_json::to_value(value)
        .context("failed to serialize snapshot")
        .and_then(|payload| store.put(key, &payload));
    match result {
        Ok(()) => {
            tracing::debug!(%key, "snapshot stored");
            true
        }
        Err(e) => {
            tracing::warn!(%key, "snapshot write failed: {e:#}");
            false
        }
    }
}
