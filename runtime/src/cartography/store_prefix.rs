//! Store-page prefix inference over sitemap URLs, and slug → name cleanup.

use std::collections::HashMap;

/// A prefix is only a store-page prefix if it mentions one of these.
const STORE_PREFIX_KEYWORDS: &[&str] = &[
    "store", "shop", "retail", "brand", "eat", "food", "drink", "restaurant", "leisure",
    "play", "directory", "listing",
];

/// Minimum number of URLs under a prefix before it is considered.
const MIN_PREFIX_COUNT: usize = 10;

/// Path segments of `url` with any trailing slash removed.
fn path_segments(url: &str) -> Option<Vec<String>> {
    let parsed = url::Url::parse(url).ok()?;
    Some(
        parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Find the most specific path prefix under which individual store pages
/// live, e.g. `/stores` or `/en/shop-listing`.
///
/// Every proper prefix of every URL path is counted. Among prefixes seen at
/// least ten times that contain a store keyword, the deepest wins; ties go to
/// the higher count, then to the lexicographically smallest prefix.
pub fn detect_store_page_prefix(urls: &[String]) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for url in urls {
        let Some(segments) = path_segments(url) else {
            continue;
        };
        if segments.len() < 2 {
            continue;
        }
        for depth in 1..segments.len() {
            let prefix = format!("/{}", segments[..depth].join("/"));
            *counts.entry(prefix).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(prefix, count)| {
            let lower = prefix.to_lowercase();
            *count >= MIN_PREFIX_COUNT && STORE_PREFIX_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .max_by(|(a, a_count), (b, b_count)| {
            let a_depth = a.matches('/').count();
            let b_depth = b.matches('/').count();
            a_depth
                .cmp(&b_depth)
                .then(a_count.cmp(b_count))
                .then_with(|| b.cmp(a))
        })
        .map(|(prefix, _)| prefix)
}

/// Turn direct children of `prefix` into tenant names.
///
/// `/stores/primark-2` under `/stores` becomes `Primark`. Deeper pages such
/// as `/stores/primark/offers` are ignored.
pub fn extract_names_from_urls(urls: &[String], prefix: &str) -> Vec<String> {
    let prefix = prefix.trim_end_matches('/');

    urls.iter()
        .filter_map(|url| {
            let segments = path_segments(url)?;
            let path = format!("/{}", segments.join("/"));
            let remainder = path.strip_prefix(prefix)?.strip_prefix('/')?;
            if remainder.is_empty() || remainder.contains('/') {
                return None;
            }
            Some(clean_slug(remainder))
        })
        .filter(|name| {
            let len = name.chars().count();
            len > 1 && len < 60
        })
        .collect()
}

/// Convert a URL slug into a display name.
///
/// Strips a trailing `-<digits>` suffix, turns `-` and `_` into spaces and
/// upper-cases the first character of each word. Applying it to its own
/// output changes nothing.
pub fn clean_slug(slug: &str) -> String {
    let without_suffix = match slug.rfind('-') {
        Some(idx)
            if idx + 1 < slug.len() && slug[idx + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &slug[..idx]
        }
        _ => slug,
    };

    let mut name = String::with_capacity(without_suffix.len());
    let mut prev_is_word = false;
    for c in without_suffix.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric();
        if is_word && !prev_is_word {
            name.push(c.to_ascii_uppercase());
        } else {
            name.push(c);
        }
        prev_is_word = is_word;
    }

    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(paths: &[&str]) -> Vec<String> {
        paths
            .iter()
            .map(|p| format!("https://centre.example.com{p}"))
            .collect()
    }

    #[test]
    fn test_prefix_from_store_pages() {
        let mut paths: Vec<String> = (0..12).map(|i| format!("/stores/shop-{i}")).collect();
        paths.extend(["/about", "/news/opening-hours", "/contact"].map(String::from));
        let all = urls(&paths.iter().map(String::as_str).collect::<Vec<_>>());

        assert_eq!(detect_store_page_prefix(&all).as_deref(), Some("/stores"));
    }

    #[test]
    fn test_prefix_prefers_deeper_path() {
        let paths: Vec<String> = (0..11)
            .map(|i| format!("/en/shop-listing/tenant-{i}"))
            .collect();
        let all = urls(&paths.iter().map(String::as_str).collect::<Vec<_>>());

        // "/en" has no keyword; "/en/shop-listing" is deeper and relevant.
        assert_eq!(
            detect_store_page_prefix(&all).as_deref(),
            Some("/en/shop-listing")
        );
    }

    #[test]
    fn test_prefix_tie_is_deterministic() {
        let mut paths: Vec<String> = (0..10).map(|i| format!("/shops/a-{i}")).collect();
        paths.extend((0..10).map(|i| format!("/brands/b-{i}")));
        let all = urls(&paths.iter().map(String::as_str).collect::<Vec<_>>());

        for _ in 0..5 {
            assert_eq!(detect_store_page_prefix(&all).as_deref(), Some("/brands"));
        }
    }

    #[test]
    fn test_prefix_requires_ten_urls() {
        let paths: Vec<String> = (0..9).map(|i| format!("/stores/s-{i}")).collect();
        let all = urls(&paths.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(detect_store_page_prefix(&all).is_none());
    }

    #[test]
    fn test_extract_direct_children_only() {
        let all = urls(&[
            "/stores/primark-2",
            "/stores/h-and-m/",
            "/stores/next/offers",
            "/stores/",
            "/stores/x",
            "/news/stores-open",
        ]);
        assert_eq!(
            extract_names_from_urls(&all, "/stores"),
            vec!["Primark".to_string(), "H And M".to_string()]
        );
    }

    #[test]
    fn test_clean_slug() {
        assert_eq!(clean_slug("primark-2"), "Primark");
        assert_eq!(clean_slug("h-and-m"), "H And M");
        assert_eq!(clean_slug("marks_and_spencer"), "Marks And Spencer");
        assert_eq!(clean_slug("the-body-shop-"), "The Body Shop");
        assert_eq!(clean_slug("tkMaxx"), "TkMaxx");
    }

    #[test]
    fn test_clean_slug_idempotent() {
        for slug in ["primark-2", "h-and-m", "costa_coffee-12", "jd-sports", "o2"] {
            let once = clean_slug(slug);
            assert_eq!(clean_slug(&once), once);
        }
    }
}
