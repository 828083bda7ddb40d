//! Per-account playlist assembly from the `.m3u` sources on disk

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::models::Category;
use crate::services::m3u_parser;

const SOURCE_EXTENSIONS: [&str; 2] = ["m3u", "m3u8"];

/// A playlist file available on the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSource {
    /// File stem, e.g. `news` for `news.m3u`
    pub id: String,
    pub file_name: String,
    pub path: PathBuf,
}

impl PlaylistSource {
    /// Case-insensitive match on identifier or file name
    pub fn matches(&self, entry: &str) -> bool {
        let entry = entry.trim();
        entry.eq_ignore_ascii_case(&self.id) || entry.eq_ignore_ascii_case(&self.file_name)
    }
}

/// Combines raw M3U sources into one playlist scoped to an entitlement
#[derive(Debug, Clone)]
pub struct PlaylistAssembler {
    dir: PathBuf,
}

impl PlaylistAssembler {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// All sources in the playlists directory, sorted by file name
    pub async fn list_sources(&self) -> Vec<PlaylistSource> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list playlists in {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut sources = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Error while listing {}: {}", self.dir.display(), e);
                    break;
                }
            };

            let path = entry.path();
            let is_source = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| {
                    SOURCE_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s))
                });
            if !is_source || !path.is_file() {
                continue;
            }

            let (Some(stem), Some(file_name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            sources.push(PlaylistSource {
                id: stem.to_string(),
                file_name: file_name.to_string(),
                path: path.clone(),
            });
        }

        sources.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        sources
    }

    /// Sources selected by an entitlement list.
    ///
    /// An empty list selects everything. A non-empty list that matches
    /// nothing also selects everything; that fallback is logged.
    pub fn select<'a>(sources: &'a [PlaylistSource], lists: &[String]) -> Vec<&'a PlaylistSource> {
        if lists.is_empty() {
            return sources.iter().collect();
        }

        let selected: Vec<&PlaylistSource> = sources
            .iter()
            .filter(|source| lists.iter().any(|entry| source.matches(entry)))
            .collect();

        if selected.is_empty() {
            warn!(
                "No playlist source matches lists {:?}; falling back to all {} sources",
                lists,
                sources.len()
            );
            return sources.iter().collect();
        }

        selected
    }

    /// Combined M3U text under a single `#EXTM3U` header
    pub async fn build_playlist(&self, lists: &[String]) -> String {
        let sources = self.list_sources().await;
        let mut output = String::from("#EXTM3U\n");

        for source in Self::select(&sources, lists) {
            let text = match fs::read_to_string(&source.path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable playlist source {}: {}", source.file_name, e);
                    continue;
                }
            };

            let body = m3u_parser::strip_header(&text);
            if body.trim().is_empty() {
                debug!("Playlist source {} has no entries", source.file_name);
                continue;
            }

            output.push_str(body);
            if !body.ends_with('\n') {
                output.push('\n');
            }
        }

        output
    }

    /// Categories of the playlist an entitlement resolves to
    pub async fn categories(&self, lists: &[String]) -> Vec<Category> {
        m3u_parser::parse(&self.build_playlist(lists).await)
    }
}
