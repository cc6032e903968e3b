pub mod local;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;

pub use local::LocalStorage;

static STORAGE: OnceCell<Arc<dyn AttachmentStorage>> = OnceCell::new();

/// Errors of the attachment store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload timed out after {0}s")]
    Timeout(u64),

    #[error("Attachment too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where stage attachments go
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Persist the bytes and return the public URL of the stored file.
    ///
    /// `destination_hint` is a relative path such as
    /// `loads/<id>/stage1/<uuid>.jpg`; implementations may rewrite it.
    async fn upload(&self, bytes: Vec<u8>, destination_hint: &str) -> Result<String, StorageError>;

    fn storage_name(&self) -> &str;
}

pub fn install(storage: Arc<dyn AttachmentStorage>) -> anyhow::Result<()> {
    STORAGE
        .set(storage)
        .map_err(|_| anyhow::anyhow!("Attachment storage already installed"))
}

pub fn get_storage() -> anyhow::Result<Arc<dyn AttachmentStorage>> {
    STORAGE
        .get()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Attachment storage has not been initialized"))
}

/// Storage key for a stage attachment
pub fn destination_hint(load_id: &str, stage_key: &str, file_name: &str) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!(
        "loads/{}/{}/{}{}",
        load_id,
        stage_key,
        uuid::Uuid::new_v4(),
        extension
    )
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps uploads in memory; can be told to fail
    #[derive(Default)]
    pub struct MemoryStorage {
        pub uploads: Mutex<Vec<(String, usize)>>,
        pub fail: bool,
    }

    impl MemoryStorage {
        pub fn failing() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AttachmentStorage for MemoryStorage {
        async fn upload(
            &self,
            bytes: Vec<u8>,
            destination_hint: &str,
        ) -> Result<String, StorageError> {
            if self.fail {
                return Err(StorageError::Timeout(1));
            }
            self.uploads
                .lock()
                .unwrap()
                .push((destination_hint.to_string(), bytes.len()));
            Ok(format!("mem://{}", destination_hint))
        }

        fn storage_name(&self) -> &str {
            "memory"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_hint_keeps_lowercase_extension() {
        let hint = destination_hint("abc", "stage5", "NF-123.PDF");
        assert!(hint.starts_with("loads/abc/stage5/"));
        assert!(hint.ends_with(".pdf"));

        let bare = destination_hint("abc", "stage1", "photo");
        assert!(!bare.contains('.'));
    }
}
