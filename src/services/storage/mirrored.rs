use async_trait::async_trait;
use tracing::{info, warn};

use super::{LocalStorage, StorageBackend, StorageError};

/// Local files with a remote copy.
///
/// Reads hydrate from the remote only when the local file is missing.
/// Writes must succeed locally; the remote push is best-effort.
pub struct MirroredStorage<R> {
    local: LocalStorage,
    remote: R,
}

impl<R: StorageBackend> MirroredStorage<R> {
    pub fn new(local: LocalStorage, remote: R) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl<R: StorageBackend> StorageBackend for MirroredStorage<R> {
    async fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        if let Some(contents) = self.local.read(name).await? {
            return Ok(Some(contents));
        }

        match self.remote.read(name).await {
            Ok(Some(contents)) => {
                info!("Hydrated {} from {}", name, self.remote.describe());
                if let Err(e) = self.local.write(name, &contents).await {
                    warn!("Failed to cache hydrated {} locally: {}", name, e);
                }
                Ok(Some(contents))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Mirror read of {} failed: {}", name, e);
                Ok(None)
            }
        }
    }

    async fn write(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        self.local.write(name, contents).await?;

        if let Err(e) = self.remote.write(name, contents).await {
            warn!("Mirror push of {} failed (local copy kept): {}", name, e);
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} + {}", self.local.describe(), self.remote.describe())
    }
}
