//! Network acquisition: a thin reqwest client and the page fetcher built on
//! top of it (static HTTP or headless-browser rendering).

pub mod fetcher;
pub mod http_client;

pub use fetcher::{Fetch, FetchMode, PageFetcher};
