//! Cartography: sitemap crawling, store-page prefix inference and directory discovery.

pub mod directory;
pub mod sitemap;
pub mod store_prefix;

pub use directory::DirectoryDiscovery;
