use crate::domain::model::{CountingResult, InboundMessage};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// `receive` 的結果：收到訊息，或在等待時被要求停止。
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Message(InboundMessage),
    Cancelled,
}

#[async_trait]
pub trait MessageSource: Send {
    fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// 等待下一則訊息；`shutdown` 被取消時立即回傳 `Received::Cancelled`。
    async fn receive(&mut self, shutdown: &CancellationToken) -> Result<Received>;

    fn close(&mut self);
}

/// 儲存端在遙測裡的樣子：相依類型、目標名稱、執行的指令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDependency {
    pub dependency_type: String,
    pub name: String,
    pub command: String,
}

impl StorageDependency {
    pub fn new(
        dependency_type: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            dependency_type: dependency_type.into(),
            name: name.into(),
            command: command.into(),
        }
    }
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn save(&self, record: &CountingResult) -> Result<()>;

    fn dependency(&self) -> StorageDependency {
        StorageDependency::new("InProc", "save counting result", "")
    }
}

#[async_trait]
impl<R: ResultRepository + ?Sized> ResultRepository for Box<R> {
    async fn save(&self, record: &CountingResult) -> Result<()> {
        (**self).save(record).await
    }

    fn dependency(&self) -> StorageDependency {
        (**self).dependency()
    }
}

#[async_trait]
impl<R: ResultRepository + ?Sized> ResultRepository for std::sync::Arc<R> {
    async fn save(&self, record: &CountingResult) -> Result<()> {
        (**self).save(record).await
    }

    fn dependency(&self) -> StorageDependency {
        (**self).dependency()
    }
}
