//! Xtream listings built from parsed playlist categories
//!
//! Ids are positions in the full (unfiltered) enumeration, so a stream keeps
//! the same `stream_id` in every listing:
//! - `category_id`: 1-based index of the category in name order
//! - `stream_id`: `100000 + position + 1`, `num`: `position + 1`

use crate::models::{Category, ContentType, MediaRecord};

use super::types::{XtreamCategory, XtreamStream};

const STREAM_ID_BASE: u64 = 100_000;

/// Which `player_api.php` listing is being served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Every record, as the original live-only API exposed them
    Live,
    Vod,
    Series,
}

impl Listing {
    fn content_type(self) -> Option<ContentType> {
        match self {
            Listing::Live => None,
            Listing::Vod => Some(ContentType::Movies),
            Listing::Series => Some(ContentType::Series),
        }
    }

    fn stream_type(self) -> &'static str {
        match self {
            Listing::Live => "live",
            Listing::Vod => "movie",
            Listing::Series => "series",
        }
    }

    fn includes(self, record: &MediaRecord) -> bool {
        self.content_type()
            .map_or(true, |content_type| record.content_type == content_type)
    }
}

#[derive(Debug)]
struct Entry<'a> {
    position: usize,
    category_id: String,
    record: &'a MediaRecord,
}

/// Enumeration of a resolved playlist
#[derive(Debug)]
pub struct XtreamCatalog<'a> {
    categories: &'a [Category],
    entries: Vec<Entry<'a>>,
}

impl<'a> XtreamCatalog<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        let entries = categories
            .iter()
            .enumerate()
            .flat_map(|(idx, category)| {
                let category_id = (idx + 1).to_string();
                category.items.iter().map(move |record| (category_id.clone(), record))
            })
            .enumerate()
            .map(|(position, (category_id, record))| Entry {
                position,
                category_id,
                record,
            })
            .collect();

        Self { categories, entries }
    }

    /// Categories holding at least one record of the listing
    pub fn categories(&self, listing: Listing) -> Vec<XtreamCategory> {
        self.categories
            .iter()
            .enumerate()
            .filter(|(_, category)| category.items.iter().any(|r| listing.includes(r)))
            .map(|(idx, category)| XtreamCategory {
                category_id: (idx + 1).to_string(),
                category_name: category.name.clone(),
                parent_id: 0,
            })
            .collect()
    }

    /// Resolve a `category_id` query value, given as numeric id or as name
    fn resolve_category(&self, filter: &str) -> Option<String> {
        let filter = filter.trim();
        if let Ok(id) = filter.parse::<usize>() {
            return (id >= 1 && id <= self.categories.len()).then(|| id.to_string());
        }
        self.categories
            .iter()
            .position(|c| c.name == filter)
            .map(|idx| (idx + 1).to_string())
    }

    pub fn streams(&self, listing: Listing, category_filter: Option<&str>) -> Vec<XtreamStream> {
        let category_id = match category_filter.filter(|f| !f.trim().is_empty()) {
            Some(filter) => match self.resolve_category(filter) {
                Some(id) => Some(id),
                None => return Vec::new(),
            },
            None => None,
        };

        self.entries
            .iter()
            .filter(|entry| listing.includes(entry.record))
            .filter(|entry| category_id.as_ref().map_or(true, |id| &entry.category_id == id))
            .map(|entry| Self::describe(entry, listing))
            .collect()
    }

    fn describe(entry: &Entry<'_>, listing: Listing) -> XtreamStream {
        let record = entry.record;
        let series = record.series.as_ref();

        XtreamStream {
            num: entry.position + 1,
            name: record.title.clone(),
            stream_type: listing.stream_type().to_string(),
            stream_id: STREAM_ID_BASE + entry.position as u64 + 1,
            stream_icon: record.logo.clone(),
            epg_channel_id: record.tvg_id.clone(),
            category_id: entry.category_id.clone(),
            direct_source: record.url.clone(),
            container_extension: (listing != Listing::Live)
                .then(|| container_extension(&record.url))
                .flatten(),
            series_name: series.map(|s| s.series_name.clone()),
            season: series.map(|s| s.season),
            episode: series.map(|s| s.episode),
        }
    }
}

/// File extension of a stream URL path (`mp4` for `http://x/a.mp4?t=1`)
fn container_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_lowercase())
}
