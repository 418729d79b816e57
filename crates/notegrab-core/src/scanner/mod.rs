//! Page scanner: turns the index page's byte stream into discovered items.
//!
//! Bytes are tokenized incrementally (html5ever), reduced to structural
//! [`PageToken`]s, and walked by the pure [`step`] function. Items come out in
//! document order as soon as the markup that defines them has arrived.

mod run;
mod token;
mod walk;

pub use run::{scan_page, spawn_scanner, ScanError};
pub use token::{PageToken, PageTokenizer};
pub use walk::{step, ScanState};

use serde::Serialize;

use crate::url_model::LinkPattern;

/// One downloadable document found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredItem {
    /// Nearest preceding heading, whitespace collapsed and `/` replaced by `-`.
    pub category: String,
    pub title: String,
    /// Never empty.
    pub remote_id: String,
}

/// What counts as a heading and as a document link.
#[derive(Debug, Clone)]
pub struct ScanRules {
    headings: Vec<String>,
    links: LinkPattern,
}

impl ScanRules {
    pub fn new<S: AsRef<str>>(headings: &[S], links: LinkPattern) -> Self {
        Self {
            headings: headings
                .iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .collect(),
            links,
        }
    }
}

/// Push-style scanner over one page. Single pass: once `finish` has run, later
/// calls yield nothing.
pub struct PageScanner {
    tokenizer: PageTokenizer,
    state: ScanState,
    links: LinkPattern,
    finished: bool,
}

impl PageScanner {
    pub fn new(rules: &ScanRules) -> Self {
        Self {
            tokenizer: PageTokenizer::new(&rules.headings),
            state: ScanState::new(),
            links: rules.links.clone(),
            finished: false,
        }
    }

    /// Feed the next body chunk; returns items completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<DiscoveredItem> {
        if self.finished {
            return Vec::new();
        }
        let tokens = self.tokenizer.feed(bytes);
        self.walk(tokens)
    }

    /// End of stream; returns any items still held back.
    pub fn finish(&mut self) -> Vec<DiscoveredItem> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        let tokens = self.tokenizer.finish();
        self.walk(tokens)
    }

    fn walk(&mut self, tokens: Vec<PageToken>) -> Vec<DiscoveredItem> {
        let mut out = Vec::new();
        for token in &tokens {
            let (next, items) = step(std::mem::take(&mut self.state), token, &self.links);
            self.state = next;
            out.extend(items);
        }
        out
    }
}

/// Scan a whole document held in memory.
pub fn scan_document(html: &str, rules: &ScanRules) -> Vec<DiscoveredItem> {
    let mut scanner = PageScanner::new(rules);
    let mut items = scanner.feed(html.as_bytes());
    items.extend(scanner.finish());
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScanRules {
        ScanRules::new(
            &["h3"],
            LinkPattern::new("https://drive.google.com/open?id=").unwrap(),
        )
    }

    #[test]
    fn single_heading_single_link() {
        let items = scan_document(
            r#"<h3>Week 1/Intro</h3><a href="https://drive.google.com/open?id=ABC123">Lecture Notes</a>"#,
            &rules(),
        );
        assert_eq!(
            items,
            vec![DiscoveredItem {
                category: "Week 1-Intro".to_string(),
                title: "Lecture Notes".to_string(),
                remote_id: "ABC123".to_string(),
            }]
        );
    }

    #[test]
    fn counts_match_anchors_across_headings() {
        let mut html = String::from("<html><body><p>intro</p>");
        let mut expected = Vec::new();
        for h in 0..4 {
            html.push_str(&format!("<h3>Part {}/A</h3>\n<ul>\n", h));
            for k in 0..h {
                html.push_str(&format!(
                    "  <li><a href=\"https://drive.google.com/open?id=p{}d{}\">Doc {}</a></li>\n",
                    h, k, k
                ));
                html.push_str("  <li><a href=\"https://example.com\">not a doc</a></li>\n");
                expected.push((format!("Part {}-A", h), format!("p{}d{}", h, k)));
            }
            html.push_str("</ul>\n");
        }
        html.push_str("</body></html>");

        let items = scan_document(&html, &rules());
        assert_eq!(items.len(), 0 + 1 + 2 + 3);
        let got: Vec<_> = items
            .iter()
            .map(|i| (i.category.clone(), i.remote_id.clone()))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn byte_at_a_time_matches_whole_document() {
        let html = "<h3>W&eacute;ek 1</h3><a target=_blank href='https://drive.google.com/open?id=Q'>\n  Notes\n</a>";
        let whole = scan_document(html, &rules());

        let mut scanner = PageScanner::new(&rules());
        let mut items = Vec::new();
        for b in html.as_bytes() {
            items.extend(scanner.feed(std::slice::from_ref(b)));
        }
        items.extend(scanner.finish());

        assert_eq!(items, whole);
        assert_eq!(items[0].category, "Wéek 1");
        assert_eq!(items[0].title, "Notes");
    }

    #[test]
    fn heading_tags_are_case_insensitive_in_rules() {
        let rules = ScanRules::new(
            &["H2"],
            LinkPattern::new("https://drive.google.com/open?id=").unwrap(),
        );
        let items = scan_document(
            r#"<H2>Labs</H2><a href="https://drive.google.com/open?id=L1">Lab 1</a>"#,
            &rules,
        );
        assert_eq!(items[0].category, "Labs");
    }

    #[test]
    fn finish_is_single_pass() {
        let mut scanner = PageScanner::new(&rules());
        scanner.feed(br#"<a href="https://drive.google.com/open?id=A">x</a>"#);
        assert_eq!(scanner.finish().len(), 0);
        assert!(scanner.feed(br#"<a href="https://drive.google.com/open?id=B">y</a>"#).is_empty());
        assert!(scanner.finish().is_empty());
    }
}
