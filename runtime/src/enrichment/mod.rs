//! Per-location enrichment pipelines.
//!
//! [`Enricher`] is the static pipeline (sitemap, directory probes, homepage
//! fallback); [`DynamicEnricher`] renders pages in a headless browser for
//! sites the static pipeline flagged as client-rendered. Both write through
//! the same [`TenantWriter`].

pub mod blacklist;
pub mod dynamic;
pub mod enricher;
pub mod persist;

pub use dynamic::DynamicEnricher;
pub use enricher::{Enricher, LocationEnricher};
pub use persist::{PersistOutcome, TenantWriter};
