use crate::domain::model::CountingResult;
use crate::domain::ports::{ResultRepository, StorageDependency};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// 以 JSON Lines 附加寫入本機檔案，每次 save 一行。
#[derive(Debug, Clone)]
pub struct FileResultRepository {
    path: PathBuf,
}

impl FileResultRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultRepository for FileResultRepository {
    async fn save(&self, record: &CountingResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let line = serde_json::json!({
            "recorded_at": Utc::now().to_rfc3339(),
            "result": record,
        });
        let mut bytes = serde_json::to_vec(&line)?;
        bytes.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    fn dependency(&self) -> StorageDependency {
        StorageDependency::new(
            "File",
            "Append counting results",
            self.path().display().to_string(),
        )
    }
}
