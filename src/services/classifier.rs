use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{ContentType, SeriesInfo};

/// File extensions that mark a URL as an on-demand movie.
/// `.ts` is deliberately absent: MPEG-TS is what live IPTV channels stream.
const MOVIE_EXTENSIONS: [&str; 7] = [".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm"];

lazy_static! {
    // ============ SERIES DETECTION ============
    static ref SERIES_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)s\d{1,2}e\d{1,2}").unwrap(),
        Regex::new(r"(?i)s\d{1,2}\s+e\d{1,2}").unwrap(),
        Regex::new(r"(?i)season\s*\d+").unwrap(),
        Regex::new(r"(?i)temporada\s*\d+").unwrap(),
        Regex::new(r"(?i)capitulo\s*\d+").unwrap(),
        Regex::new(r"(?i)episodio\s*\d+").unwrap(),
    ];

    // ============ SERIES INFO EXTRACTORS (ordered) ============
    static ref SERIES_EXTRACTORS: Vec<Regex> = vec![
        // Name S01E01 / Name S01 E01
        Regex::new(r"(?i)^(.*?)\s*S(\d{1,2})\s*E(\d{1,2})").unwrap(),
        // Name Temporada 1 Capitulo 2
        Regex::new(r"(?i)^(.*?)\s*temporada\s*(\d+)\s*capitulo\s*(\d+)").unwrap(),
        // Name Season 1 Episode 2
        Regex::new(r"(?i)^(.*?)\s*season\s*(\d+)\s*episode\s*(\d+)").unwrap(),
    ];
}

/// Content classifier for playlist entries
pub struct ContentClassifier;

impl ContentClassifier {
    /// Series if title or URL carries a season/episode marker,
    /// movies if the URL points at a video file, tv otherwise
    pub fn detect_content_type(title: &str, url: &str) -> ContentType {
        let is_series = SERIES_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(title) || pattern.is_match(url));
        if is_series {
            return ContentType::Series;
        }

        let lower_url = url.to_lowercase();
        if MOVIE_EXTENSIONS.iter().any(|ext| lower_url.ends_with(ext)) {
            return ContentType::Movies;
        }

        ContentType::Tv
    }

    /// Recover series name, season and episode from a title.
    /// Titles matching no extractor fall back to season 1 episode 1.
    pub fn extract_series_info(title: &str) -> SeriesInfo {
        for pattern in SERIES_EXTRACTORS.iter() {
            if let Some(caps) = pattern.captures(title) {
                let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                let season = Self::parse_number(caps.get(2).map(|m| m.as_str()));
                let episode = Self::parse_number(caps.get(3).map(|m| m.as_str()));

                return SeriesInfo {
                    series_name: if name.is_empty() {
                        title.trim().to_string()
                    } else {
                        name.to_string()
                    },
                    season,
                    episode,
                    episode_title: title.to_string(),
                };
            }
        }

        SeriesInfo {
            series_name: title.to_string(),
            season: 1,
            episode: 1,
            episode_title: title.to_string(),
        }
    }

    // Season and episode numbers are 1-based
    fn parse_number(value: Option<&str>) -> u32 {
        value
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}
