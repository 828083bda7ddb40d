use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{StorageBackend, StorageError};

/// JSON documents stored as files in a directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn io_error(name: &str, source: std::io::Error) -> StorageError {
        StorageError::Io {
            name: name.to_string(),
            source,
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(name)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(name, e)),
        }
    }

    /// Write to a temp sibling, sync, then rename over the target
    async fn write(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_error(name, e))?;

        let final_path = self.path(name);
        let tmp_path = self.path(&format!("{}.tmp", name));

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| Self::io_error(name, e))?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| Self::io_error(name, e))?;
        file.sync_all().await.map_err(|e| Self::io_error(name, e))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(Self::io_error(name, e));
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.dir.display())
    }
}
