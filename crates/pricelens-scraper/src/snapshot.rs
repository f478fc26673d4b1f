//! Read-only view over one rendered HTML page.
//!
//! [`Snapshot`] owns the parsed document and exposes the handful of query
//! shapes the extractors need: first non-empty text across a selector
//! fallback chain, first attribute, all texts, and URL resolution against
//! the page base. `scraper::Html` is not `Send`, so a snapshot is always
//! parsed and consumed within one synchronous stretch of code.

use scraper::{ElementRef, Html, Selector};
use url::Url;

pub struct Snapshot {
    doc: Html,
    base: Option<Url>,
}

impl Snapshot {
    #[must_use]
    pub fn parse(html: &str, base_url: Option<&str>) -> Self {
        Self {
            doc: Html::parse_document(html),
            base: base_url.and_then(|u| Url::parse(u).ok()),
        }
    }

    /// True when any of `selectors` matches at least one element.
    #[must_use]
    pub fn has_any(&self, selectors: &[&str]) -> bool {
        selectors
            .iter()
            .any(|s| self.doc.select(&sel(s)).next().is_some())
    }

    /// First non-empty text content across a fallback chain of selectors.
    #[must_use]
    pub fn first_text(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            for element in self.doc.select(&sel(selector)) {
                let text = element_text(element);
                if !text.trim().is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Like [`Self::first_text`] but skips text inside nested `<a>` tags,
    /// which marketplace price blocks use for strike-through links.
    #[must_use]
    pub fn first_text_excluding_anchors(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            for element in self.doc.select(&sel(selector)) {
                let mut text = String::new();
                collect_non_anchor_text(element, &mut text);
                if !text.trim().is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// First non-empty value of `attr` across a fallback chain of selectors.
    #[must_use]
    pub fn first_attr(&self, selectors: &[&str], attr: &str) -> Option<String> {
        for selector in selectors {
            for element in self.doc.select(&sel(selector)) {
                if let Some(value) = element.value().attr(attr) {
                    if !value.trim().is_empty() {
                        return Some(value.trim().to_string());
                    }
                }
            }
        }
        None
    }

    /// Text content of every element matching `selector`, in document order.
    #[must_use]
    pub fn texts(&self, selector: &str) -> Vec<String> {
        self.doc.select(&sel(selector)).map(element_text).collect()
    }

    /// `content` attribute of the first element matching `selector`.
    #[must_use]
    pub fn meta_content(&self, selector: &str) -> Option<String> {
        self.first_attr(&[selector], "content")
    }

    /// Whole-body text, lowercased, for substring signature checks.
    #[must_use]
    pub fn body_text_lower(&self) -> String {
        self.doc
            .select(&sel("body"))
            .next()
            .map(|body| {
                body.text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
            })
            .unwrap_or_default()
    }

    /// Sub-snapshots for each element matching `selector`, so card-shaped
    /// results can be queried in isolation.
    #[must_use]
    pub fn fragments(&self, selector: &str) -> Vec<Snapshot> {
        self.doc
            .select(&sel(selector))
            .map(|element| Snapshot {
                doc: Html::parse_fragment(&element.html()),
                base: self.base.clone(),
            })
            .collect()
    }

    /// Resolves an href or src against the page base URL. Rejects empty
    /// values and inline `data:` URIs.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with("data:") {
            return None;
        }
        if let Ok(absolute) = Url::parse(href) {
            return Some(absolute.to_string());
        }
        self.base
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map(|u| u.to_string())
    }
}

/// First entry in `selectors` that matches somewhere in `html`, if any.
#[must_use]
pub fn first_matching_selector(html: &str, selectors: &[&str]) -> Option<String> {
    let doc = Html::parse_document(html);
    selectors
        .iter()
        .find(|s| doc.select(&sel(s)).next().is_some())
        .map(|s| (*s).to_string())
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("selector tables hold valid CSS")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn collect_non_anchor_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&text.text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if child_element.value().name() != "a" {
                collect_non_anchor_text(child_element, out);
            }
        }
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
