pub mod app_insights;

use crate::domain::ports::StorageDependency;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub use app_insights::{AppInsightsConnection, AppInsightsTelemetry};

/// 外部相依呼叫的遙測事件（consume 與儲存）。
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEvent {
    pub dependency_type: String,
    pub name: String,
    pub data: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
    pub success: bool,
}

impl DependencyEvent {
    /// consume 事件一律回報成功，即使之後解析或儲存失敗。
    pub fn consume(topic: &str, payload: &str, start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            dependency_type: "Kafka".to_string(),
            name: format!("Consume {}", topic),
            data: payload.to_string(),
            start,
            duration,
            success: true,
        }
    }

    /// 儲存呼叫的事件，成功與否依實際結果。
    pub fn storage(
        dependency: StorageDependency,
        start: DateTime<Utc>,
        duration: Duration,
        success: bool,
    ) -> Self {
        Self {
            dependency_type: dependency.dependency_type,
            name: dependency.name,
            data: dependency.command,
            start,
            duration,
            success,
        }
    }
}

/// 遙測輸出端。實作不得阻塞或讓處理流程失敗。
pub trait TelemetrySink: Send + Sync {
    fn track_dependency(&self, event: DependencyEvent);
}

/// 沒有設定 Application Insights 時使用：只寫一筆 debug 日誌。
#[derive(Debug, Clone, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn track_dependency(&self, event: DependencyEvent) {
        tracing::debug!(
            dependency_type = %event.dependency_type,
            name = %event.name,
            start = %event.start.to_rfc3339(),
            duration_ms = event.duration.as_secs_f64() * 1000.0,
            success = event.success,
            "dependency tracked"
        );
    }
}
