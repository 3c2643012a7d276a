use crate::core::processor::{MessageProcessor, ProcessOutcome};
use crate::domain::ports::{MessageSource, Received, ResultRepository};
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// 結束時的處理統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub received: u64,
    pub saved: u64,
    pub skipped_invalid: u64,
    pub save_failed: u64,
    pub receive_errors: u64,
}

impl WorkerSummary {
    fn record(&mut self, outcome: ProcessOutcome) {
        self.received += 1;
        match outcome {
            ProcessOutcome::Saved => self.saved += 1,
            ProcessOutcome::SkippedInvalid => self.skipped_invalid += 1,
            ProcessOutcome::SaveFailed => self.save_failed += 1,
        }
    }
}

/// 單一 consumer 的處理迴圈：一次只處理一則訊息，處理完才取下一則。
pub struct Worker<M: MessageSource, R: ResultRepository> {
    source: M,
    processor: MessageProcessor<R>,
    topic: String,
    group_id: String,
}

impl<M: MessageSource, R: ResultRepository> Worker<M, R> {
    pub fn new(
        source: M,
        processor: MessageProcessor<R>,
        topic: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            processor,
            topic: topic.into(),
            group_id: group_id.into(),
        }
    }

    /// 執行到 `shutdown` 被取消為止。只有訂閱失敗會回傳錯誤。
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<WorkerSummary> {
        tracing::info!("Topic = {}", self.topic);
        tracing::info!("Group Id = {}", self.group_id);
        tracing::info!("⏳ Waiting for messages...");

        self.source.subscribe(&self.topic)?;

        let mut summary = WorkerSummary::default();
        loop {
            match self.source.receive(&shutdown).await {
                Ok(Received::Message(message)) => {
                    let outcome = self.processor.process(&message).await;
                    summary.record(outcome);
                }
                Ok(Received::Cancelled) => {
                    tracing::info!("🛑 Shutdown requested, stopping consumer loop");
                    break;
                }
                Err(e) => {
                    summary.receive_errors += 1;
                    tracing::error!(error = %e, "Kafka consumer error");
                }
            }
        }

        self.source.close();

        tracing::info!(
            received = summary.received,
            saved = summary.saved,
            skipped_invalid = summary.skipped_invalid,
            save_failed = summary.save_failed,
            receive_errors = summary.receive_errors,
            "Worker stopped"
        );

        Ok(summary)
    }
}
