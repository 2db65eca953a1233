//! Directory discovery: find where a site lists its tenants.
//!
//! Strategies run as a flat priority chain and the first hit wins:
//! sitemap store-page prefix, then directory pages named in the sitemap,
//! then HEAD probes of common directory paths.

use super::sitemap::{discover_sitemap_urls, join_url};
use super::store_prefix::detect_store_page_prefix;
use crate::acquisition::{Fetch, FetchMode};
use crate::types::{CandidateUrl, DiscoveryResult, UrlOrigin};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Sitemap URLs mentioning one of these may be directory pages.
const DIRECTORY_KEYWORDS: &[&str] = &[
    "store",
    "shop",
    "retailer",
    "tenant",
    "directory",
    "brand",
    "shopping",
    "whats-here",
    "find",
    "listing",
];

const MAX_DIRECTORY_CANDIDATES: usize = 5;

/// A sitemap directory page must be larger than this to be accepted.
const MIN_DIRECTORY_BYTES: usize = 1000;

/// Common directory paths probed in order.
pub const STORE_DIRECTORY_PATTERNS: &[&str] = &[
    "/stores",
    "/store-directory",
    "/shop-directory",
    "/shops",
    "/retailers",
    "/retail-directory",
    "/our-stores",
    "/find-a-store",
    "/shopping",
    "/brands",
    "/directory",
    "/store-guide",
    "/stores-services",
    "/whats-here",
    "/whos-here",
    "/who-s-here",
    "/tenants",
    "/store-list",
    "/all-stores",
    "/store-listing",
    "/retailers-list",
    "/shops-and-restaurants",
    "/shops-restaurants",
    "/stores-and-restaurants",
    "/eat-drink",
    "/food-drink",
    "/food-and-drink",
    "/leisure",
    "/entertainment",
    "/our-shops",
    "/explore",
    "/units",
    "/whats-on",
    "/food",
];

/// Rank sitemap URLs that look like tenant directory pages.
///
/// Keeps URLs with a directory keyword and at most two path segments,
/// removes duplicates, and orders by path length (stable), keeping five.
pub fn find_directory_candidates(sitemap_urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates: Vec<(usize, String)> = sitemap_urls
        .iter()
        .filter_map(|url| {
            let parsed = url::Url::parse(url).ok()?;
            let lower = url.to_lowercase();
            if !DIRECTORY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                return None;
            }
            let depth = parsed.path().split('/').filter(|s| !s.is_empty()).count();
            if depth > 2 || !seen.insert(url.clone()) {
                return None;
            }
            Some((parsed.path().len(), url.clone()))
        })
        .collect();

    candidates.sort_by_key(|(len, _)| *len);
    candidates
        .into_iter()
        .take(MAX_DIRECTORY_CANDIDATES)
        .map(|(_, url)| url)
        .collect()
}

/// URLs probed for `website`, in [`STORE_DIRECTORY_PATTERNS`] order.
///
/// Empty when `website` is not a valid base URL.
pub fn pattern_probe_urls(website: &str) -> Vec<CandidateUrl> {
    STORE_DIRECTORY_PATTERNS
        .iter()
        .map_while(|path| join_url(website, path))
        .map(|url| CandidateUrl {
            url,
            origin: UrlOrigin::PatternProbe,
        })
        .collect()
}

/// Runs the discovery chain for one website.
pub struct DirectoryDiscovery {
    fetcher: Arc<dyn Fetch>,
}

impl DirectoryDiscovery {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Locate the tenant listing for `website`.
    pub async fn discover(&self, website: &str) -> DiscoveryResult {
        let sitemap_urls: Vec<String> = discover_sitemap_urls(self.fetcher.as_ref(), website)
            .await
            .into_iter()
            .map(|candidate| candidate.url)
            .collect();

        if !sitemap_urls.is_empty() {
            debug!(website, urls = sitemap_urls.len(), "sitemap urls");

            if let Some(store_prefix) = detect_store_page_prefix(&sitemap_urls) {
                info!(website, prefix = %store_prefix, "store pages found in sitemap");
                return DiscoveryResult::SitemapUrls {
                    urls: sitemap_urls,
                    store_prefix,
                };
            }

            for url in find_directory_candidates(&sitemap_urls) {
                if let Some(body) = self.fetcher.fetch(&url, FetchMode::Static).await {
                    if body.len() > MIN_DIRECTORY_BYTES {
                        info!(website, url = %url, "directory page found in sitemap");
                        return DiscoveryResult::SitemapDirectory { url };
                    }
                }
            }
        }

        let probes = STORE_DIRECTORY_PATTERNS.iter().zip(pattern_probe_urls(website));
        for (path, candidate) in probes {
            if self.fetcher.exists(&candidate.url).await {
                info!(website, path, "directory path answered probe");
                return DiscoveryResult::Pattern {
                    path: path.to_string(),
                    url: candidate.url,
                };
            }
        }

        DiscoveryResult::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory site: GET bodies by URL, HEAD answers for a set of URLs.
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        existing: HashSet<String>,
        probes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetch for FakeSite {
        async fn fetch(&self, url: &str, _mode: FetchMode) -> Option<String> {
            self.pages.get(url).cloned()
        }

        async fn exists(&self, url: &str) -> bool {
            self.probes.lock().unwrap().push(url.to_string());
            self.existing.contains(url)
        }
    }

    fn urlset(paths: &[String]) -> String {
        let body: String = paths
            .iter()
            .map(|p| format!("<url><loc>https://c.example.com{p}</loc></url>"))
            .collect();
        format!("<urlset>{body}</urlset>")
    }

    #[test]
    fn test_candidates_order_and_depth() {
        let urls: Vec<String> = [
            "https://c.example.com/stores/primark",
            "https://c.example.com/stores",
            "https://c.example.com/en/stores/a/b",
            "https://c.example.com/stores",
            "https://c.example.com/about",
            "https://c.example.com/find-us",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let candidates = find_directory_candidates(&urls);
        assert_eq!(
            candidates,
            vec![
                "https://c.example.com/stores".to_string(),
                "https://c.example.com/find-us".to_string(),
                "https://c.example.com/stores/primark".to_string(),
            ]
        );
    }

    #[test]
    fn test_probe_urls_follow_pattern_order() {
        let probes = pattern_probe_urls("https://c.example.com/en/home");
        assert_eq!(probes.len(), STORE_DIRECTORY_PATTERNS.len());
        assert_eq!(probes[0].url, "https://c.example.com/stores");
        assert!(probes.iter().all(|c| c.origin == UrlOrigin::PatternProbe));
        assert!(pattern_probe_urls("not a url").is_empty());
    }

    #[test]
    fn test_candidates_capped_at_five() {
        let urls: Vec<String> = (0..9)
            .map(|i| format!("https://c.example.com/shop-{i}"))
            .collect();
        assert_eq!(find_directory_candidates(&urls).len(), 5);
    }

    #[tokio::test]
    async fn test_sitemap_prefix_wins() {
        let paths: Vec<String> = (0..12).map(|i| format!("/stores/tenant-{i}")).collect();
        let mut site = FakeSite::default();
        site.pages
            .insert("https://c.example.com/sitemap.xml".into(), urlset(&paths));

        let discovery = DirectoryDiscovery::new(Arc::new(site));
        match discovery.discover("https://c.example.com").await {
            DiscoveryResult::SitemapUrls { urls, store_prefix } => {
                assert_eq!(store_prefix, "/stores");
                assert_eq!(urls.len(), 12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sitemap_directory_page() {
        let mut site = FakeSite::default();
        site.pages.insert(
            "https://c.example.com/sitemap.xml".into(),
            urlset(&["/about".to_string(), "/store-directory".to_string()]),
        );
        site.pages.insert(
            "https://c.example.com/store-directory".into(),
            "x".repeat(1500),
        );

        let discovery = DirectoryDiscovery::new(Arc::new(site));
        assert_eq!(
            discovery.discover("https://c.example.com").await,
            DiscoveryResult::SitemapDirectory {
                url: "https://c.example.com/store-directory".into()
            }
        );
    }

    #[tokio::test]
    async fn test_pattern_probe_in_order() {
        let mut site = FakeSite::default();
        site.existing.insert("https://c.example.com/shops".into());
        site.existing.insert("https://c.example.com/directory".into());
        let site = Arc::new(site);

        let discovery = DirectoryDiscovery::new(site.clone());
        assert_eq!(
            discovery.discover("https://c.example.com").await,
            DiscoveryResult::Pattern {
                path: "/shops".into(),
                url: "https://c.example.com/shops".into()
            }
        );
        // /stores, /store-directory, /shop-directory, /shops
        assert_eq!(site.probes.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_not_found_probes_every_pattern() {
        let site = Arc::new(FakeSite::default());
        let discovery = DirectoryDiscovery::new(site.clone());
        assert_eq!(
            discovery.discover("https://c.example.com").await,
            DiscoveryResult::NotFound
        );
        assert_eq!(
            site.probes.lock().unwrap().len(),
            STORE_DIRECTORY_PATTERNS.len()
        );
    }
}
