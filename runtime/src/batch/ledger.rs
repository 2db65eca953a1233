//! Durable record of processed locations for resumable batch runs.
//!
//! Stored as pretty JSON `{processedIds, results, startedAt}` and rewritten
//! through a temp file plus rename after every location.

use crate::types::{EnrichmentResult, ErrorKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLedger {
    pub processed_ids: BTreeSet<String>,
    pub results: Vec<EnrichmentResult>,
    pub started_at: DateTime<Utc>,
    #[serde(skip)]
    path: PathBuf,
}

impl ProgressLedger {
    /// An empty ledger that will be written to `path`.
    pub fn fresh(path: &Path) -> Self {
        Self {
            processed_ids: BTreeSet::new(),
            results: Vec::new(),
            started_at: Utc::now(),
            path: path.to_path_buf(),
        }
    }

    /// Load the ledger at `path`. A missing file gives a fresh ledger; an
    /// unreadable or corrupt one is logged and replaced by a fresh ledger.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::fresh(path),
            Err(e) => {
                warn!(path = %path.display(), "could not read checkpoint, starting fresh: {e}");
                return Self::fresh(path);
            }
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(mut ledger) => {
                ledger.path = path.to_path_buf();
                info!(
                    path = %path.display(),
                    processed = ledger.processed_ids.len(),
                    "resuming from checkpoint"
                );
                ledger
            }
            Err(e) => {
                warn!(path = %path.display(), "corrupt checkpoint, starting fresh: {e}");
                Self::fresh(path)
            }
        }
    }

    pub fn is_processed(&self, location_id: &str) -> bool {
        self.processed_ids.contains(location_id)
    }

    /// Record a finished location. A repeated id replaces its earlier result.
    pub fn record(&mut self, result: EnrichmentResult) {
        if !self.processed_ids.insert(result.location_id.clone()) {
            self.results.retain(|r| r.location_id != result.location_id);
        }
        self.results.push(result);
    }

    /// Ids whose last result was `JS_RENDERED`, in processing order.
    pub fn js_rendered_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.error_kind() == Some(ErrorKind::JsRendered))
            .map(|r| r.location_id.clone())
            .collect()
    }

    /// Write atomically: serialize to `<path>.tmp`, then rename over `path`.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("failed to write checkpoint: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace checkpoint: {}", self.path.display()))?;
        Ok(())
    }

    /// Delete the ledger file. Returns whether one existed.
    pub fn clear(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnrichmentError, Location};

    fn result(id: &str, kind: Option<ErrorKind>) -> EnrichmentResult {
        let location = Location {
            id: id.to_string(),
            name: format!("Centre {id}"),
            website: None,
            city: None,
            location_type: "RETAIL_PARK".to_string(),
            number_of_stores: None,
            tenant_count: 0,
            largest_category: None,
            largest_category_percent: None,
        };
        match kind {
            Some(kind) => EnrichmentResult::failed(&location, EnrichmentError::new(kind, "x")),
            None => EnrichmentResult::empty(&location),
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");

        let mut ledger = ProgressLedger::fresh(&path);
        ledger.record(result("a", None));
        ledger.record(result("b", Some(ErrorKind::JsRendered)));
        ledger.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"processedIds\""));
        assert!(raw.contains("\"startedAt\""));
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = ProgressLedger::load(&path);
        assert!(loaded.is_processed("a"));
        assert_eq!(loaded.results.len(), 2);
        assert_eq!(loaded.js_rendered_ids(), vec!["b".to_string()]);
        assert_eq!(loaded.started_at, ledger.started_at);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{not json").unwrap();

        let ledger = ProgressLedger::load(&path);
        assert!(ledger.processed_ids.is_empty());

        // Saving overwrites the corrupt file in place.
        ledger.save().unwrap();
        let reloaded: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(reloaded["processedIds"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_record_replaces_repeated_id() {
        let mut ledger = ProgressLedger::fresh(Path::new("unused.json"));
        ledger.record(result("a", Some(ErrorKind::JsRendered)));
        ledger.record(result("a", None));
        assert_eq!(ledger.results.len(), 1);
        assert!(ledger.js_rendered_ids().is_empty());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        assert!(!ProgressLedger::clear(&path).unwrap());
        ProgressLedger::fresh(&path).save().unwrap();
        assert!(ProgressLedger::clear(&path).unwrap());
        assert!(!path.exists());
    }
}
