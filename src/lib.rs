pub mod config;
pub mod core;
pub mod domain;
pub mod kafka;
pub mod storage;
pub mod telemetry;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use config::{StorageKind, WorkerConfig};
pub use crate::core::{
    processor::{MessageProcessor, ProcessOutcome},
    worker::{Worker, WorkerSummary},
};
pub use domain::model::{CountingResult, InboundMessage};
pub use domain::ports::{MessageSource, Received, ResultRepository};
pub use kafka::{KafkaMessageSource, KafkaSettings};
pub use storage::{FileResultRepository, PgResultRepository};
pub use telemetry::{AppInsightsTelemetry, DependencyEvent, LogTelemetry, TelemetrySink};
pub use utils::error::{Result, WorkerError};
