//! Pluggable persistence for the JSON state files
//!
//! - [`LocalStorage`]: plain files in the data directory
//! - [`MirroredStorage`]: local files backed by a remote Git-hosted copy
//!
//! Both store whole documents keyed by file name (`accounts.json`, ...).

pub mod github;
pub mod local;
pub mod mirrored;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;

pub use github::GitHubMirror;
pub use local::LocalStorage;
pub use mirrored::MirroredStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Remote mirror error: {0}")]
    Remote(String),
}

/// Whole-document key/value storage
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// `Ok(None)` when the document does not exist
    async fn read(&self, name: &str) -> Result<Option<String>, StorageError>;

    /// Replace the document atomically
    async fn write(&self, name: &str, contents: &str) -> Result<(), StorageError>;

    fn describe(&self) -> String;
}

/// Local storage, mirrored to the remote repository when one is configured
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let local = LocalStorage::new(&config.data_dir);

    match &config.mirror {
        Some(mirror) => {
            let remote = GitHubMirror::new(mirror)?;
            Ok(Arc::new(MirroredStorage::new(local, remote)))
        }
        None => Ok(Arc::new(local)),
    }
}
