#![allow(dead_code)]

use async_trait::async_trait;
use counting_worker::domain::ports::StorageDependency;
use counting_worker::telemetry::{DependencyEvent, TelemetrySink};
use counting_worker::{
    CountingResult, InboundMessage, MessageSource, Received, Result, ResultRepository, WorkerError,
};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

/// 擷取日誌輸出，方便斷言
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(self.buffer.clone())
    }
}

impl LogCapture {
    /// 只對目前執行緒生效；測試請用單執行緒 runtime
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

/// 記錄所有 save 呼叫；`categoria` 為 "boom" 的結果會儲存失敗
#[derive(Clone, Default)]
pub struct RecordingRepository {
    saved: Arc<Mutex<Vec<CountingResult>>>,
    attempts: Arc<Mutex<usize>>,
}

impl RecordingRepository {
    pub fn saved(&self) -> Vec<CountingResult> {
        self.saved.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ResultRepository for RecordingRepository {
    async fn save(&self, record: &CountingResult) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        if record.get_str("categoria") == Some("boom") {
            return Err(WorkerError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn dependency(&self) -> StorageDependency {
        StorageDependency::new("SQL", "INSERT counting_results", INSERT_COMMAND)
    }
}

pub const INSERT_COMMAND: &str =
    "INSERT INTO counting_results (payload, recorded_at) VALUES ($1, $2)";

#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    events: Arc<Mutex<Vec<DependencyEvent>>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<DependencyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn track_dependency(&self, event: DependencyEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub enum Step {
    Message(InboundMessage),
    BrokerError,
}

#[derive(Debug, Clone, Default)]
pub struct SourceState {
    pub subscribed: Option<String>,
    pub receives: usize,
    pub closed: bool,
}

/// 依腳本回傳訊息的來源。腳本用完後會等待取消，
/// 或在 `stop_when_drained` 時自行取消。
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    stop_when_drained: bool,
    state: Arc<Mutex<SourceState>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            stop_when_drained: false,
            state: Arc::default(),
        }
    }

    pub fn stop_when_drained(mut self) -> Self {
        self.stop_when_drained = true;
        self
    }

    pub fn state(&self) -> Arc<Mutex<SourceState>> {
        self.state.clone()
    }
}

pub fn messages(topic: &str, payloads: &[&str]) -> Vec<Step> {
    payloads
        .iter()
        .enumerate()
        .map(|(i, payload)| {
            let mut message = InboundMessage::new(topic, *payload);
            message.offset = i as i64;
            Step::Message(message)
        })
        .collect()
}

#[async_trait]
impl MessageSource for ScriptedSource {
    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.state.lock().unwrap().subscribed = Some(topic.to_string());
        Ok(())
    }

    async fn receive(&mut self, shutdown: &CancellationToken) -> Result<Received> {
        self.state.lock().unwrap().receives += 1;

        if shutdown.is_cancelled() {
            return Ok(Received::Cancelled);
        }

        match self.steps.pop_front() {
            Some(Step::Message(message)) => Ok(Received::Message(message)),
            Some(Step::BrokerError) => Err(KafkaError::MessageConsumption(
                RDKafkaErrorCode::BrokerTransportFailure,
            )
            .into()),
            None => {
                if self.stop_when_drained {
                    shutdown.cancel();
                }
                shutdown.cancelled().await;
                Ok(Received::Cancelled)
            }
        }
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed = true;
    }
}
