//! M3U playlist parsing
//!
//! Parsing runs in two small stages instead of chained pattern matches:
//!
//! 1. every line is classified ([`Line`]): header, `#EXTINF`, other directive, blank or URI;
//! 2. `#EXTINF` payloads go through an attribute scanner that splits the
//!    `key="value"` header from the display title.
//!
//! An `#EXTINF` is paired with the next URI line; an `#EXTINF` that never
//! gets a URI is dropped.

use std::collections::BTreeMap;

use crate::models::{Category, ContentType, MediaRecord, DEFAULT_CATEGORY};
use crate::services::classifier::ContentClassifier;

const EXTM3U: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";

/// Classified playlist line
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Header,
    ExtInf(&'a str),
    Directive,
    Blank,
    Uri(&'a str),
}

/// Classify a single (already trimmed) line
pub fn classify_line(line: &str) -> Line<'_> {
    if line.is_empty() {
        Line::Blank
    } else if let Some(payload) = line.strip_prefix(EXTINF) {
        Line::ExtInf(payload)
    } else if line.starts_with(EXTM3U) {
        Line::Header
    } else if line.starts_with('#') {
        Line::Directive
    } else {
        Line::Uri(line)
    }
}

/// Parsed `#EXTINF` payload
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtInf {
    /// Attribute keys are lowercased
    pub attributes: BTreeMap<String, String>,
    pub title: String,
}

impl ExtInf {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Scan `-1 tvg-logo="x" group-title="News",CNN` into attributes and title.
///
/// The title starts after the first comma outside double quotes, so commas
/// inside attribute values never cut the title.
pub fn parse_extinf(payload: &str) -> ExtInf {
    let mut attributes = BTreeMap::new();
    let mut key = String::new();
    let mut chars = payload.char_indices().peekable();
    let mut title_start = None;

    while let Some((idx, c)) = chars.next() {
        match c {
            ',' => {
                title_start = Some(idx + 1);
                break;
            }
            '=' if matches!(chars.peek(), Some((_, '"'))) && !key.is_empty() => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for (_, v) in chars.by_ref() {
                    if v == '"' {
                        closed = true;
                        break;
                    }
                    value.push(v);
                }
                if closed {
                    attributes.insert(key.to_lowercase(), value);
                }
                key.clear();
            }
            c if c.is_alphanumeric() || c == '-' || c == '_' => key.push(c),
            _ => key.clear(),
        }
    }

    let title = title_start
        .map(|start| payload[start..].trim().to_string())
        .unwrap_or_default();

    ExtInf { attributes, title }
}

/// Build a record from an `#EXTINF` payload and its stream URL
fn build_record(extinf: &ExtInf, url: &str) -> MediaRecord {
    let title = if extinf.title.is_empty() {
        extinf.attr("tvg-name").unwrap_or_default().to_string()
    } else {
        extinf.title.clone()
    };

    let content_type = ContentClassifier::detect_content_type(&title, url);
    let series = (content_type == ContentType::Series)
        .then(|| ContentClassifier::extract_series_info(&title));

    MediaRecord {
        category: extinf
            .attr("group-title")
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        logo: extinf.attr("tvg-logo").unwrap_or_default().to_string(),
        tvg_id: extinf.attr("tvg-id").unwrap_or_default().to_string(),
        url: url.to_string(),
        title,
        content_type,
        series,
    }
}

/// Parse playlist text into records, in playlist order
pub fn parse_records(text: &str) -> Vec<MediaRecord> {
    let mut records = Vec::new();
    let mut pending: Option<ExtInf> = None;

    for raw in text.lines() {
        match classify_line(raw.trim()) {
            Line::ExtInf(payload) => pending = Some(parse_extinf(payload)),
            Line::Uri(url) => {
                if let Some(extinf) = pending.take() {
                    records.push(build_record(&extinf, url));
                }
            }
            Line::Header | Line::Directive | Line::Blank => {}
        }
    }

    records
}

/// Parse playlist text into categories, one per distinct `group-title`, sorted by name
pub fn parse(text: &str) -> Vec<Category> {
    let mut categories: BTreeMap<String, Category> = BTreeMap::new();

    for record in parse_records(text) {
        categories
            .entry(record.category.clone())
            .or_insert_with(|| Category::new(record.category.clone()))
            .push(record);
    }

    categories.into_values().collect()
}

/// Strip the leading `#EXTM3U` header line, if any, and return the body
pub fn strip_header(text: &str) -> &str {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with(EXTM3U) {
        return trimmed;
    }
    match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => "",
    }
}
