use crate::domain::model::{CountingResult, InboundMessage};
use crate::domain::ports::ResultRepository;
use crate::telemetry::{DependencyEvent, TelemetrySink};
use crate::utils::error::{Result, WorkerError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// 單則訊息處理完的終止狀態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Saved,
    SkippedInvalid,
    SaveFailed,
}

/// 處理單則訊息：計時、記錄、送遙測、解析、儲存（儲存呼叫也送一筆遙測）。
///
/// 任何單則訊息的失敗都只記錄日誌，不會往外拋，也不會重試。
pub struct MessageProcessor<R: ResultRepository> {
    repository: R,
    telemetry: Arc<dyn TelemetrySink>,
}

impl<R: ResultRepository> MessageProcessor<R> {
    pub fn new(repository: R, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            repository,
            telemetry,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn process(&self, message: &InboundMessage) -> ProcessOutcome {
        let start = Utc::now();
        let watch = Instant::now();

        let content = message.payload_str();
        tracing::info!(
            partition = message.partition,
            offset = message.offset,
            timestamp = ?message.timestamp,
            "[{} | new message] {}",
            message.topic,
            content
        );

        let elapsed = watch.elapsed();
        self.telemetry.track_dependency(DependencyEvent::consume(
            &message.topic,
            content,
            start,
            elapsed,
        ));

        let record = match parse_message(message) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(offset = message.offset, "Message carried a null result, skipping");
                return ProcessOutcome::SkippedInvalid;
            }
            Err(e) => {
                tracing::error!(reason = %e, "❌ invalid data for the result");
                return ProcessOutcome::SkippedInvalid;
            }
        };

        let save_start = Utc::now();
        let save_watch = Instant::now();
        let saved = self.repository.save(&record).await;
        self.telemetry.track_dependency(DependencyEvent::storage(
            self.repository.dependency(),
            save_start,
            save_watch.elapsed(),
            saved.is_ok(),
        ));

        match saved {
            Ok(()) => {
                tracing::info!(fields = record.len(), "✅ result saved successfully");
                ProcessOutcome::Saved
            }
            Err(e) => {
                tracing::error!("❌ error while saving: {}", e);
                ProcessOutcome::SaveFailed
            }
        }
    }
}

fn parse_message(message: &InboundMessage) -> Result<Option<CountingResult>> {
    match message.payload.as_deref() {
        Some(payload) => CountingResult::parse(payload),
        None => Err(WorkerError::InvalidPayload {
            reason: "message has no payload".to_string(),
        }),
    }
}
