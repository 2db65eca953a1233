//! Run configuration: timeouts, limits, delays and file locations.
//!
//! Every component receives its limits from a [`RunConfig`] passed in at
//! construction time. Defaults match the production batch job; the CLI and
//! environment override individual fields.

use std::path::PathBuf;
use std::time::Duration;

/// Location types selected by a batch run when no `--type` filter is given.
pub const DEFAULT_LOCATION_TYPES: &[&str] = &["SHOPPING_CENTRE", "RETAIL_PARK", "OUTLET_CENTRE"];

/// Chrome-like user agent used for both static fetches and the headless browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/131.0.0.0 Safari/537.36";

/// Configuration for one enrichment run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum locations selected per batch run.
    pub batch_size: usize,
    /// Location types accepted by batch target selection.
    pub location_types: Vec<String>,
    /// Skip all persistence; log intended writes only.
    pub dry_run: bool,

    /// Timeout for a static page fetch.
    pub fetch_timeout: Duration,
    /// Timeout for a HEAD probe of a directory path.
    pub probe_timeout: Duration,
    /// Ceiling for a single classification call.
    pub classify_timeout: Duration,
    /// Ceiling for the whole of one location's work.
    pub location_timeout: Duration,
    /// Pause between consecutive locations.
    pub inter_location_delay: Duration,

    /// Navigation ceiling for a dynamic render.
    pub render_timeout: Duration,
    /// Fixed settle delay after a dynamic render finishes loading.
    pub render_settle: Duration,
    /// Pause between consecutive locations in the dynamic pass.
    pub dynamic_inter_location_delay: Duration,

    /// Maximum characters of page text sent for extraction.
    pub max_page_chars: usize,
    /// Minimum characters of page text worth sending for extraction.
    pub min_page_chars: usize,
    /// Maximum candidate names sent for classification.
    pub max_tenant_names: usize,

    /// Checkpoint file for the static batch run.
    pub checkpoint_path: PathBuf,
    /// Checkpoint file for the dynamic-rendering pass.
    pub dynamic_checkpoint_path: PathBuf,
    /// SQLite database holding locations, tenants and categories.
    pub database_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        let base = data_dir();
        Self {
            batch_size: 50,
            location_types: DEFAULT_LOCATION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            dry_run: false,
            fetch_timeout: Duration::from_millis(15_000),
            probe_timeout: Duration::from_millis(5_000),
            classify_timeout: Duration::from_millis(60_000),
            location_timeout: Duration::from_millis(90_000),
            inter_location_delay: Duration::from_millis(3_000),
            render_timeout: Duration::from_millis(30_000),
            render_settle: Duration::from_millis(5_000),
            dynamic_inter_location_delay: Duration::from_millis(10_000),
            max_page_chars: 80_000,
            min_page_chars: 100,
            max_tenant_names: 250,
            checkpoint_path: base.join("progress.json"),
            dynamic_checkpoint_path: base.join("progress-dynamic.json"),
            database_path: base.join("tenant-scout.db"),
        }
    }
}

impl RunConfig {
    /// Defaults with paths overridden from the environment.
    ///
    /// `TENANT_SCOUT_DB` and `TENANT_SCOUT_CHECKPOINT` replace the database
    /// and checkpoint locations.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(db) = std::env::var("TENANT_SCOUT_DB") {
            config.database_path = PathBuf::from(db);
        }
        if let Ok(checkpoint) = std::env::var("TENANT_SCOUT_CHECKPOINT") {
            let path = PathBuf::from(checkpoint);
            config.dynamic_checkpoint_path = path.with_extension("dynamic.json");
            config.checkpoint_path = path;
        }
        config
    }

    /// Restrict batch selection to a single location type.
    pub fn with_location_type(mut self, location_type: Option<&str>) -> Self {
        if let Some(t) = location_type {
            self.location_types = vec![t.to_string()];
        }
        self
    }
}

/// Base directory for the database and checkpoint files (`~/.tenant-scout`).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".tenant-scout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_batch_job() {
        let config = RunConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.location_timeout, Duration::from_secs(90));
        assert_eq!(config.inter_location_delay, Duration::from_secs(3));
        assert_eq!(config.max_tenant_names, 250);
        assert_eq!(config.location_types.len(), 3);
        assert!(config.checkpoint_path.ends_with("progress.json"));
    }

    #[test]
    fn test_type_filter_replaces_accepted_types() {
        let config = RunConfig::default().with_location_type(Some("RETAIL_PARK"));
        assert_eq!(config.location_types, vec!["RETAIL_PARK".to_string()]);

        let unchanged = RunConfig::default().with_location_type(None);
        assert_eq!(unchanged.location_types.len(), 3);
    }
}
