use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::{AttachmentStorage, StorageError};
use crate::shared::config::StorageConfig;

/// Files on local disk, served back by the `/files` route
pub struct LocalStorage {
    root_dir: PathBuf,
    public_base_url: String,
    timeout: Duration,
    max_bytes: usize,
}

impl LocalStorage {
    pub fn new(root_dir: PathBuf, config: &StorageConfig) -> Self {
        Self {
            root_dir,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.upload_timeout_secs),
            max_bytes: config.max_upload_bytes,
        }
    }

    /// Only plain relative paths are accepted
    fn target_path(&self, destination_hint: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(destination_hint);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if destination_hint.is_empty() || !clean {
            return Err(StorageError::InvalidDestination(destination_hint.to_string()));
        }
        Ok(self.root_dir.join(relative))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl AttachmentStorage for LocalStorage {
    async fn upload(&self, bytes: Vec<u8>, destination_hint: &str) -> Result<String, StorageError> {
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        let path = self.target_path(destination_hint)?;

        match tokio::time::timeout(self.timeout, self.write(&path, &bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                // partial file is useless
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }
            Err(_) => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(StorageError::Timeout(self.timeout.as_secs()));
            }
        }

        tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(format!("{}/{}", self.public_base_url, destination_hint))
    }

    fn storage_name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_upload_bytes: usize) -> StorageConfig {
        StorageConfig {
            root_dir: String::new(),
            public_base_url: "/files/".into(),
            upload_timeout_secs: 5,
            max_upload_bytes,
        }
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), &config(1024));

        let url = storage
            .upload(b"jpeg-bytes".to_vec(), "loads/l1/stage1/a.jpg")
            .await
            .unwrap();

        assert_eq!(url, "/files/loads/l1/stage1/a.jpg");
        let written = std::fs::read(dir.path().join("loads/l1/stage1/a.jpg")).unwrap();
        assert_eq!(written, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), &config(4));

        let err = storage.upload(vec![0; 5], "a.bin").await.unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { size: 5, limit: 4 }));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), &config(1024));

        for hint in ["../etc/passwd", "/abs/file", ""] {
            let err = storage.upload(vec![1], hint).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidDestination(_)), "{}", hint);
        }
    }
}
