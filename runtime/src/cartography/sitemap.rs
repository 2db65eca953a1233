//! Parse sitemap.xml / sitemap index files and flatten a site's sitemap
//! into a list of page URLs.

use crate::acquisition::{Fetch, FetchMode};
use crate::types::{CandidateUrl, UrlOrigin};
use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

/// Child sitemaps whose URL contains one of these are considered relevant.
const CHILD_SITEMAP_KEYWORDS: &[&str] = &[
    "store", "shop", "retail", "tenant", "brand", "directory", "eat", "food", "drink",
    "restaurant", "leisure", "play", "business", "listing",
];

/// Cap on relevant child sitemaps fetched from an index.
const MAX_RELEVANT_CHILDREN: usize = 8;

/// Children fetched unfiltered when none look relevant.
const MAX_FALLBACK_CHILDREN: usize = 5;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps.
    Index(Vec<String>),
    /// `<urlset>`: page locations.
    UrlSet(Vec<String>),
}

/// Parse a sitemap XML string.
///
/// Any `<sitemap><loc>` entry makes the document an index; otherwise the
/// `<url><loc>` entries are returned in document order.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut in_url = false;
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut current_loc = String::new();
    let mut page_urls = Vec::new();
    let mut sitemap_urls = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => {
                    in_url = true;
                    current_loc.clear();
                }
                b"sitemap" => {
                    in_sitemap = true;
                    current_loc.clear();
                }
                b"loc" => in_loc = in_url || in_sitemap,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" if in_url => {
                    if !current_loc.is_empty() {
                        page_urls.push(current_loc.clone());
                    }
                    in_url = false;
                }
                b"sitemap" if in_sitemap => {
                    if !current_loc.is_empty() {
                        sitemap_urls.push(current_loc.clone());
                    }
                    in_sitemap = false;
                }
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                let text = e.unescape().unwrap_or_default();
                current_loc.push_str(text.trim());
            }
            Ok(Event::CData(e)) if in_loc => {
                current_loc.push_str(String::from_utf8_lossy(&e.into_inner()).trim());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow::anyhow!("XML parse error: {e}"));
            }
            _ => {}
        }
        buf.clear();
    }

    if sitemap_urls.is_empty() {
        Ok(SitemapDocument::UrlSet(page_urls))
    } else {
        Ok(SitemapDocument::Index(sitemap_urls))
    }
}

/// Choose which children of a sitemap index to fetch.
pub fn select_child_sitemaps(children: &[String]) -> Vec<CandidateUrl> {
    let relevant: Vec<&String> = children
        .iter()
        .filter(|url| {
            let lower = url.to_lowercase();
            CHILD_SITEMAP_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .collect();

    let chosen: Vec<&String> = if relevant.is_empty() {
        children.iter().take(MAX_FALLBACK_CHILDREN).collect()
    } else {
        relevant.into_iter().take(MAX_RELEVANT_CHILDREN).collect()
    };

    chosen
        .into_iter()
        .map(|url| CandidateUrl {
            url: url.clone(),
            origin: UrlOrigin::SitemapIndexChild,
        })
        .collect()
}

/// Fetch `base_url/sitemap.xml` and flatten it into page URLs, each tagged
/// [`UrlOrigin::SitemapUrl`].
///
/// Follows one level of sitemap-index indirection. A missing or unparsable
/// sitemap yields an empty list; no alternative sitemap locations are
/// guessed. Order is preserved and duplicates are kept.
pub async fn discover_sitemap_urls(fetcher: &dyn Fetch, base_url: &str) -> Vec<CandidateUrl> {
    let Some(sitemap_url) = join_url(base_url, "/sitemap.xml") else {
        return Vec::new();
    };
    let Some(xml) = fetcher.fetch(&sitemap_url, FetchMode::Static).await else {
        debug!(url = %sitemap_url, "no sitemap");
        return Vec::new();
    };

    let document = match parse_sitemap(&xml) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(url = %sitemap_url, "unparsable sitemap: {e}");
            return Vec::new();
        }
    };

    let page_urls = match document {
        SitemapDocument::UrlSet(urls) => urls,
        SitemapDocument::Index(children) => {
            let selected = select_child_sitemaps(&children);
            info!(
                children = children.len(),
                fetching = selected.len(),
                "sitemap index"
            );

            let mut all_urls = Vec::new();
            for child in &selected {
                let Some(child_xml) = fetcher.fetch(&child.url, FetchMode::Static).await else {
                    continue;
                };
                match parse_sitemap(&child_xml) {
                    Ok(SitemapDocument::UrlSet(urls)) => all_urls.extend(urls),
                    // Nested indexes are not followed.
                    Ok(SitemapDocument::Index(_)) => {}
                    Err(e) => debug!(url = %child.url, "unparsable child sitemap: {e}"),
                }
            }
            all_urls
        }
    };

    page_urls
        .into_iter()
        .map(|url| CandidateUrl {
            url,
            origin: UrlOrigin::SitemapUrl,
        })
        .collect()
}

/// Resolve `path` against `base`, as a browser would resolve a link.
pub fn join_url(base: &str, path: &str) -> Option<String> {
    url::Url::parse(base)
        .and_then(|b| b.join(path))
        .map(|u| u.to_string())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url>
            <loc>https://example.com/</loc>
            <priority>1.0</priority>
          </url>
          <url>
            <loc>https://example.com/stores/primark</loc>
            <lastmod>2024-01-15</lastmod>
          </url>
          <url>
            <loc><![CDATA[https://example.com/stores/zara]]></loc>
          </url>
        </urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::UrlSet(vec![
                "https://example.com/".to_string(),
                "https://example.com/stores/primark".to_string(),
                "https://example.com/stores/zara".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap>
            <loc>https://example.com/sitemap-stores.xml</loc>
          </sitemap>
          <sitemap>
            <loc>https://example.com/sitemap-blog.xml</loc>
          </sitemap>
        </sitemapindex>"#;

        match parse_sitemap(xml).unwrap() {
            SitemapDocument::Index(children) => {
                assert_eq!(children.len(), 2);
                assert!(children[0].contains("sitemap-stores"));
            }
            other => panic!("expected index, got {other:?}"),
        }
    }

    #[test]
    fn test_escaped_loc_is_unescaped() {
        let xml = "<urlset><url><loc>https://x.com/?a=1&amp;b=2</loc></url></urlset>";
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec!["https://x.com/?a=1&b=2".to_string()])
        );
    }

    #[test]
    fn test_select_relevant_children_capped() {
        let mut children: Vec<String> = (0..12)
            .map(|i| format!("https://x.com/store-sitemap-{i}.xml"))
            .collect();
        children.insert(0, "https://x.com/post-sitemap.xml".to_string());

        let selected = select_child_sitemaps(&children);
        assert_eq!(selected.len(), 8);
        assert!(selected.iter().all(|c| c.url.contains("store")));
        assert!(selected
            .iter()
            .all(|c| c.origin == UrlOrigin::SitemapIndexChild));
    }

    #[test]
    fn test_select_falls_back_to_first_five() {
        let children: Vec<String> = (0..9)
            .map(|i| format!("https://x.com/page-sitemap-{i}.xml"))
            .collect();
        let selected = select_child_sitemaps(&children);
        assert_eq!(selected.len(), 5);
        assert_eq!(selected[0].url, children[0]);
        assert_eq!(selected[4].url, children[4]);
    }

    #[test]
    fn test_join_url_is_root_relative() {
        assert_eq!(
            join_url("https://x.com/en/home", "/sitemap.xml").as_deref(),
            Some("https://x.com/sitemap.xml")
        );
        assert!(join_url("not a url", "/sitemap.xml").is_none());
    }

    /// Sitemap parser must never panic on arbitrary input.
    #[test]
    fn test_fuzz_sitemap_parser() {
        let fuzz_inputs = [
            "",
            "not xml at all",
            "<",
            "<url>",
            "<url><loc>",
            "<<<>>>",
            "<urlset><url></url></urlset>",
            "<urlset><url><loc></loc></url></urlset>",
            &"<url>".repeat(10000),
            "\x00\x01\x02\x03",
            "<sitemapindex></sitemapindex>",
            "<urlset><url><loc>http://x</loc></url><sitemap><loc>http://y</loc></sitemap></urlset>",
        ];

        for input in &fuzz_inputs {
            let _ = parse_sitemap(input);
        }
    }
}
