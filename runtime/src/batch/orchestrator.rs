//! Batch orchestrator: selects target locations, runs an enricher over them
//! one at a time under a per-location ceiling, and keeps the checkpoint
//! ledger and run statistics current.

use super::ledger::ProgressLedger;
use crate::config::RunConfig;
use crate::enrichment::LocationEnricher;
use crate::progress::{emit, ProgressEventKind, ProgressSender, RunPhase};
use crate::store::{LocationQuery, TenantStore};
use crate::types::{EnrichmentError, EnrichmentResult, ErrorKind, Location};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Running totals are logged after this many locations.
const CHECKPOINT_EVERY: usize = 10;

/// Which locations a run processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One location by id. The ledger is neither consulted nor written.
    Single(String),
    /// The batch query over accepted location types, skipping ledger ids.
    Batch,
    /// An explicit id list, skipping ids already in the ledger.
    Ids(Vec<String>),
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub total_tenants: usize,
    pub elapsed_ms: u64,
    pub results: Vec<EnrichmentResult>,
}

impl RunSummary {
    /// Share of processed locations that succeeded, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 * 100.0 / self.total as f64
        }
    }

    fn add(&mut self, result: &EnrichmentResult, dry_run: bool) {
        if result.is_success(dry_run) {
            self.success += 1;
            self.total_tenants += if dry_run {
                result.tenants_found
            } else {
                result.tenants_saved
            };
        } else {
            self.failed += 1;
        }
    }
}

/// Drives a [`LocationEnricher`] over a set of target locations.
pub struct BatchOrchestrator {
    store: Arc<dyn TenantStore>,
    enricher: Arc<dyn LocationEnricher>,
    batch_size: usize,
    location_types: Vec<String>,
    dry_run: bool,
    location_timeout: Duration,
    delay: Duration,
    checkpoint_path: PathBuf,
    progress: Option<ProgressSender>,
    run_id: String,
}

impl BatchOrchestrator {
    /// Orchestrator for the static pipeline, using the batch checkpoint path
    /// and inter-location delay from `config`.
    pub fn new(
        store: Arc<dyn TenantStore>,
        enricher: Arc<dyn LocationEnricher>,
        config: &RunConfig,
    ) -> Self {
        Self {
            store,
            enricher,
            batch_size: config.batch_size,
            location_types: config.location_types.clone(),
            dry_run: config.dry_run,
            location_timeout: config.location_timeout,
            delay: config.inter_location_delay,
            checkpoint_path: config.checkpoint_path.clone(),
            progress: None,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_checkpoint(mut self, path: PathBuf) -> Self {
        self.checkpoint_path = path;
        self
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    async fn select_targets(&self, target: &Target, ledger: &ProgressLedger) -> Result<Vec<Location>> {
        match target {
            Target::Single(id) => match self.store.find_location(id).await? {
                Some(location) => Ok(vec![location]),
                None => bail!("location not found: {id}"),
            },
            Target::Batch => {
                let query = LocationQuery {
                    location_types: self.location_types.clone(),
                    exclude_ids: ledger.processed_ids.iter().cloned().collect(),
                    limit: self.batch_size,
                };
                Ok(self
                    .store
                    .find_locations(&query)
                    .await
                    .context("target query failed")?)
            }
            Target::Ids(ids) => {
                let mut locations = Vec::new();
                for id in ids.iter().filter(|id| !ledger.is_processed(id)) {
                    match self.store.find_location(id).await? {
                        Some(location) => locations.push(location),
                        None => warn!(location_id = %id, "listed location no longer exists"),
                    }
                }
                Ok(locations)
            }
        }
    }

    /// Run one location under the per-location ceiling.
    async fn enrich_with_ceiling(&self, location: &Location) -> EnrichmentResult {
        match tokio::time::timeout(self.location_timeout, self.enricher.enrich(location)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(location_id = %location.id, "location timed out");
                EnrichmentResult::failed(
                    location,
                    EnrichmentError::new(
                        ErrorKind::Timeout,
                        format!("exceeded {}s", self.location_timeout.as_secs_f64()),
                    ),
                )
            }
        }
    }

    /// Process every target and return the run totals.
    ///
    /// Errors only when targets cannot be selected or the ledger cannot be
    /// written; per-location failures are recorded on their results.
    pub async fn run(&self, target: Target) -> Result<RunSummary> {
        let started = Instant::now();
        let mut seq = 0u64;
        let tx = &self.progress;
        let track_ledger = !matches!(target, Target::Single(_));

        emit(tx, &self.run_id, &mut seq, ProgressEventKind::PhaseChanged {
            phase: RunPhase::SelectingTargets,
        });
        let mut ledger = if track_ledger {
            ProgressLedger::load(&self.checkpoint_path)
        } else {
            ProgressLedger::fresh(&self.checkpoint_path)
        };
        let targets = self.select_targets(&target, &ledger).await?;
        let total = targets.len();
        info!(run_id = %self.run_id, total, dry_run = self.dry_run, "targets selected");
        emit(tx, &self.run_id, &mut seq, ProgressEventKind::TargetsSelected { total });

        emit(tx, &self.run_id, &mut seq, ProgressEventKind::PhaseChanged {
            phase: RunPhase::Processing,
        });
        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };

        for (i, location) in targets.iter().enumerate() {
            let index = i + 1;
            info!(
                location_id = %location.id,
                "[{index}/{total}] {} ({})",
                location.name,
                location.website.as_deref().unwrap_or("-")
            );
            emit(tx, &self.run_id, &mut seq, ProgressEventKind::LocationStarted {
                index,
                total,
                location_id: location.id.clone(),
                name: location.name.clone(),
            });

            let result = self.enrich_with_ceiling(location).await;
            summary.add(&result, self.dry_run);
            match &result.error {
                Some(e) => info!(location_id = %location.id, source = %result.source, "finished with {e}"),
                None => info!(
                    location_id = %location.id,
                    source = %result.source,
                    found = result.tenants_found,
                    saved = result.tenants_saved,
                    "finished"
                ),
            }
            emit(tx, &self.run_id, &mut seq, ProgressEventKind::LocationFinished {
                index,
                total,
                location_id: result.location_id.clone(),
                tenants_found: result.tenants_found,
                tenants_saved: result.tenants_saved,
                source: result.source.clone(),
                error: result.error.as_ref().map(|e| e.to_string()),
            });

            if track_ledger {
                ledger.record(result.clone());
                ledger.save().context("failed to write checkpoint")?;
            }
            summary.results.push(result);

            if index % CHECKPOINT_EVERY == 0 && index < total {
                info!(
                    processed = index,
                    total,
                    success = summary.success,
                    failed = summary.failed,
                    tenants = summary.total_tenants,
                    "checkpoint"
                );
                emit(tx, &self.run_id, &mut seq, ProgressEventKind::Checkpoint {
                    processed: index,
                    total,
                    success: summary.success,
                    failed: summary.failed,
                    total_tenants: summary.total_tenants,
                });
            }

            if index < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %self.run_id,
            success = summary.success,
            failed = summary.failed,
            tenants = summary.total_tenants,
            "run complete ({:.1}% success)",
            summary.success_rate()
        );
        emit(tx, &self.run_id, &mut seq, ProgressEventKind::RunComplete {
            success: summary.success,
            failed: summary.failed,
            total_tenants: summary.total_tenants,
            elapsed_ms: summary.elapsed_ms,
        });
        emit(tx, &self.run_id, &mut seq, ProgressEventKind::PhaseChanged {
            phase: RunPhase::Finished,
        });
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Succeeds for every location except those whose id starts with "slow".
    #[derive(Default)]
    struct ScriptedEnricher {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LocationEnricher for ScriptedEnricher {
        async fn enrich(&self, location: &Location) -> EnrichmentResult {
            self.seen.lock().unwrap().push(location.id.clone());
            if location.id.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            let mut result = EnrichmentResult::empty(location);
            result.tenants_found = 4;
            result.tenants_saved = 4;
            result.source = "pattern:/stores".into();
            result
        }
    }

    fn location(id: &str, stores: Option<i64>) -> Location {
        Location {
            id: id.to_string(),
            name: format!("Centre {id}"),
            website: Some(format!("https://{id}.example")),
            city: None,
            location_type: "SHOPPING_CENTRE".to_string(),
            number_of_stores: stores,
            tenant_count: 0,
            largest_category: None,
            largest_category_percent: None,
        }
    }

    fn config(dir: &std::path::Path) -> RunConfig {
        RunConfig {
            inter_location_delay: Duration::ZERO,
            location_timeout: Duration::from_millis(100),
            checkpoint_path: dir.join("progress.json"),
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn test_batch_skips_processed_ids_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_locations([
            location("a", Some(50)),
            location("b", Some(10)),
        ]));
        let enricher = Arc::new(ScriptedEnricher::default());
        let orchestrator = BatchOrchestrator::new(store, enricher.clone(), &config(dir.path()));

        let first = orchestrator.run(Target::Batch).await.unwrap();
        assert_eq!(first.total, 2);
        assert_eq!(first.success, 2);
        assert_eq!(first.total_tenants, 8);
        assert_eq!(*enricher.seen.lock().unwrap(), vec!["a", "b"]);

        let second = orchestrator.run(Target::Batch).await.unwrap();
        assert_eq!(second.total, 0);
        assert_eq!(enricher.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_recorded_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_locations([
            location("slow-1", Some(90)),
            location("fast", Some(10)),
        ]));
        let orchestrator = BatchOrchestrator::new(
            store,
            Arc::new(ScriptedEnricher::default()),
            &config(dir.path()),
        );

        let summary = orchestrator.run(Target::Batch).await.unwrap();
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.results[0].error_kind(), Some(ErrorKind::Timeout));
        assert_eq!(summary.results[1].tenants_saved, 4);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate() - 50.0).abs() < f64::EPSILON);

        let ledger = ProgressLedger::load(&dir.path().join("progress.json"));
        assert!(ledger.is_processed("slow-1"));
        assert!(ledger.is_processed("fast"));
    }

    #[tokio::test]
    async fn test_single_run_leaves_ledger_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_locations([location("a", None)]));
        let orchestrator = BatchOrchestrator::new(
            store,
            Arc::new(ScriptedEnricher::default()),
            &config(dir.path()),
        );

        let summary = orchestrator.run(Target::Single("a".into())).await.unwrap();
        assert_eq!(summary.success, 1);
        assert!(!dir.path().join("progress.json").exists());

        assert!(orchestrator.run(Target::Single("missing".into())).await.is_err());
    }

    #[tokio::test]
    async fn test_progress_events_bracket_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_locations([location("a", None)]));
        let (tx, mut rx) = progress::channel();
        let orchestrator = BatchOrchestrator::new(
            store,
            Arc::new(ScriptedEnricher::default()),
            &config(dir.path()),
        )
        .with_progress(tx);

        orchestrator.run(Target::Ids(vec!["a".into(), "gone".into()])).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.run_id, orchestrator.run_id());
            kinds.push(event.event);
        }
        assert!(matches!(kinds.first(), Some(ProgressEventKind::PhaseChanged { phase: RunPhase::SelectingTargets })));
        assert!(kinds.iter().any(|k| matches!(k, ProgressEventKind::TargetsSelected { total: 1 })));
        assert!(kinds.iter().any(|k| matches!(k, ProgressEventKind::RunComplete { success: 1, .. })));
        assert!(matches!(kinds.last(), Some(ProgressEventKind::PhaseChanged { phase: RunPhase::Finished })));
    }
}
