use serde::{Deserialize, Serialize};

/// Category name used when an entry carries no `group-title`
pub const DEFAULT_CATEGORY: &str = "Sin Categoría";

/// Content type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Tv,
    Movies,
    Series,
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Tv
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Tv => write!(f, "tv"),
            ContentType::Movies => write!(f, "movies"),
            ContentType::Series => write!(f, "series"),
        }
    }
}

/// Season/episode metadata recovered from a series title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInfo {
    pub series_name: String,
    pub season: u32,
    pub episode: u32,
    /// Full original title of the episode
    pub episode_title: String,
}

/// Single parsed playlist entry (channel, movie or episode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub title: String,
    pub category: String,
    /// `tvg-logo`, empty when absent
    pub logo: String,
    /// `tvg-id`, empty when absent
    #[serde(default)]
    pub tvg_id: String,
    pub url: String,
    pub content_type: ContentType,
    /// Present only for `series` records
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesInfo>,
}

/// Records sharing the same `group-title`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub count: usize,
    pub items: Vec<MediaRecord>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, record: MediaRecord) {
        self.items.push(record);
        self.count = self.items.len();
    }

    /// Copy of this category keeping only records of the given type
    pub fn filtered(&self, content_type: ContentType) -> Category {
        let items: Vec<MediaRecord> = self
            .items
            .iter()
            .filter(|r| r.content_type == content_type)
            .cloned()
            .collect();
        Category {
            name: self.name.clone(),
            count: items.len(),
            items,
        }
    }
}
