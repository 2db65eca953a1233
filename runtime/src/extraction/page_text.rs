//! Visible text of an HTML page, as sent to the classification service.

use scraper::{Html, Node, Selector};

/// Elements whose text never reaches the model.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "svg", "nav", "footer", "header"];

/// Flatten the `<body>` text of `html`, skipping navigation, header,
/// footer and non-content elements, with whitespace collapsed to single
/// spaces.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_sel = Selector::parse("body").expect("body selector is valid");
    let root = document
        .select(&body_sel)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if !hidden {
            text.push_str(chunk);
        }
    }

    collapse_whitespace(&text)
}

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_elements_removed() {
        let html = r#"<html><head><title>Centre</title></head><body>
            <header>Menu Home</header>
            <nav><a>Stores</a></nav>
            <main><h1>Our   Stores</h1>
              <ul><li>Primark</li>
                  <li>Boots</li></ul>
              <script>var tracking = 1;</script>
              <style>.x { color: red }</style>
              <svg><text>logo</text></svg>
            </main>
            <footer>Copyright</footer>
        </body></html>"#;

        let text = visible_text(html);
        assert_eq!(text, "Our Stores Primark Boots");
    }

    #[test]
    fn test_fragment_without_body() {
        assert_eq!(visible_text("Just   text\n here"), "Just text here");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("Café Nero", 4), "Café");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
