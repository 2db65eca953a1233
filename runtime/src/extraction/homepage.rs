//! Cheap homepage heuristics used before spending a classification call:
//! SPA-shell detection and a known-brand scan.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Well-known UK retail, food, leisure and service brands.
pub const KNOWN_BRANDS: &[&str] = &[
    // Fashion & footwear
    "Primark", "Next", "H&M", "New Look", "River Island", "TK Maxx", "JD Sports",
    "Sports Direct", "Zara", "Schuh", "Clarks", "Footasylum", "Fat Face", "White Stuff",
    "Superdry", "Jack & Jones", "Mango", "Monsoon", "Levi's", "GAP", "Bershka",
    "Pull & Bear", "Accessorize", "Ann Summers", "Bonmarché", "Burton", "Dorothy Perkins",
    "Joules", "Karen Millen", "Kurt Geiger", "Matalan", "Moss", "Oasis", "Office",
    "Phase Eight", "Quiz", "Regatta", "Trespass", "Mountain Warehouse", "Go Outdoors",
    "Craghoppers", "Nike", "Adidas", "Puma", "Reebok", "Under Armour", "Skechers", "Vans",
    // Health & beauty
    "Boots", "Superdrug", "Holland & Barrett", "The Body Shop", "Lush", "Specsavers",
    "Vision Express", "Optical Express", "Body Shop", "The Perfume Shop", "Fragrance Shop",
    "Rituals", "Kiehl's", "Savers", "Sally", "Beauty Outlet",
    // Food & coffee
    "McDonald's", "Costa", "Costa Coffee", "Starbucks", "Greggs", "Subway", "KFC",
    "Nando's", "Pizza Express", "PizzaExpress", "Wagamama", "Burger King", "Tim Hortons",
    "Five Guys", "Frankie & Benny's", "TGI Fridays", "Caffè Nero", "Caffe Nero", "Pret",
    "Pret A Manger", "Pizza Hut", "Domino's", "Taco Bell", "Bella Italia", "Prezzo",
    "Chiquito", "Slim Chickens", "Tortilla", "Chopstix", "Yo! Sushi", "Wasabi", "Leon",
    "Krispy Kreme", "Cinnabon", "Donut",
    // Grocery
    "Tesco", "Sainsbury's", "Aldi", "Lidl", "Asda", "Morrisons", "Co-op", "Waitrose",
    "Iceland", "Heron Foods", "Home Bargains",
    // Department stores & anchors
    "M&S", "Marks & Spencer", "Marks and Spencer", "John Lewis", "Debenhams", "Selfridges",
    "IKEA", "Argos", "Wilko",
    // Electronics
    "Currys", "EE", "O2", "Vodafone", "Three", "Game", "CEX", "Apple", "Samsung",
    "Carphone Warehouse",
    // Home
    "DFS", "Sofology", "B&Q", "The Range", "B&M", "Dunelm", "HomeSense",
    "Bensons for Beds", "Dreams", "Wren Kitchens", "ScS", "Furniture Village",
    "Laura Ashley", "Barker and Stonehouse", "Pets at Home", "Hobbycraft",
    // General
    "Poundland", "Poundstretcher", "Card Factory", "WHSmith", "The Works",
    "The Entertainer", "Smyths", "One Beyond", "Tiger", "Flying Tiger", "Paperchase",
    "Waterstones",
    // Jewellery
    "Pandora", "H.Samuel", "Ernest Jones", "Goldsmiths", "Swarovski", "Warren James",
    "Lovisa",
    // Services
    "TUI", "Hays Travel", "Post Office", "Timpson", "Max Spielmann",
    // Leisure
    "Cineworld", "Odeon", "Vue", "PureGym", "Pure Gym", "The Gym", "JD Gyms", "Bowling",
    "Laser",
    // Bakeries
    "Cooplands", "Corn", "Millie's Cookies",
    // Charity
    "British Heart Foundation", "Cancer Research", "Oxfam", "Barnardo's", "Sue Ryder",
    "Mind",
];

/// Below this many characters of text, a titled page is treated as a shell.
const SPA_TEXT_THRESHOLD: usize = 500;

/// Known brands mentioned anywhere in `html` (case-insensitive substring),
/// each reported once, in list order.
pub fn scan_for_known_brands(html: &str) -> Vec<&'static str> {
    let lower = html.to_lowercase();
    let mut seen = HashSet::new();
    KNOWN_BRANDS
        .iter()
        .copied()
        .filter(|brand| lower.contains(&brand.to_lowercase()))
        .filter(|brand| seen.insert(*brand))
        .collect()
}

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script.*?</script>").expect("script regex is valid"))
}

fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style.*?</style>").expect("style regex is valid"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<title[^>]*>[^<]+</title>").expect("title regex is valid"))
}

fn app_root_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)__NEXT_DATA__|<div id="(app|root|__next)""#)
            .expect("app root regex is valid")
    })
}

/// Whether `html` looks like a client-rendered shell whose tenant list
/// only appears after JavaScript runs.
///
/// True when the page has a non-empty `<title>` and either carries a
/// framework mount point or has under 500 characters of text once scripts,
/// styles and tags are stripped.
pub fn is_js_rendered_page(html: &str) -> bool {
    if !title_re().is_match(html) {
        return false;
    }
    if app_root_re().is_match(html) {
        return true;
    }
    let without_scripts = script_re().replace_all(html, "");
    let without_styles = style_re().replace_all(&without_scripts, "");
    let text = tag_re().replace_all(&without_styles, "");
    let text: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    text.chars().count() < SPA_TEXT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_scan_unique_case_insensitive() {
        let html = "<p>Visit PRIMARK, boots and Costa Coffee. Primark again!</p>";
        let brands = scan_for_known_brands(html);
        assert!(brands.contains(&"Primark"));
        assert!(brands.contains(&"Boots"));
        assert!(brands.contains(&"Costa"));
        assert!(brands.contains(&"Costa Coffee"));
        assert_eq!(brands.iter().filter(|b| **b == "Primark").count(), 1);
    }

    #[test]
    fn test_brand_list_has_no_duplicates() {
        let unique: HashSet<&str> = KNOWN_BRANDS.iter().copied().collect();
        assert_eq!(unique.len(), KNOWN_BRANDS.len());
    }

    #[test]
    fn test_next_shell_detected() {
        let html = format!(
            "<html><head><title>Centre</title></head><body><div id=\"__next\"></div>\
             <script id=\"__NEXT_DATA__\">{}</script><p>{}</p></body></html>",
            "x".repeat(100),
            "Plenty of text. ".repeat(100)
        );
        assert!(is_js_rendered_page(&html));
    }

    #[test]
    fn test_tiny_text_shell_detected() {
        let html = format!(
            "<html><head><title>Centre</title><style>{}</style></head>\
             <body><script>{}</script><p>Loading</p></body></html>",
            "a{}".repeat(500),
            "var a = 1;".repeat(500)
        );
        assert!(is_js_rendered_page(&html));
    }

    #[test]
    fn test_content_page_is_not_shell() {
        let html = format!(
            "<html><head><title>Centre</title></head><body><p>{}</p></body></html>",
            "Shops and restaurants. ".repeat(40)
        );
        assert!(!is_js_rendered_page(&html));
    }

    #[test]
    fn test_untitled_page_is_not_shell() {
        assert!(!is_js_rendered_page("<html><body><div id=\"root\"></div></body></html>"));
        assert!(!is_js_rendered_page("<html><head><title></title></head><body></body></html>"));
    }
}
