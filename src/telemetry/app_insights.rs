use crate::telemetry::{DependencyEvent, TelemetrySink};
use crate::utils::error::{Result, WorkerError};
use crate::utils::validation::{non_blank, validate_url};
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com/";

const FIELD: &str = "connection_strings.application_insights";

/// 解析後的 Application Insights 連線字串
/// (`InstrumentationKey=...;IngestionEndpoint=https://...`)。
#[derive(Debug, Clone, PartialEq)]
pub struct AppInsightsConnection {
    pub instrumentation_key: String,
    pub track_url: Url,
}

impl AppInsightsConnection {
    pub fn parse(connection_string: &str) -> Result<Self> {
        let mut instrumentation_key = None;
        let mut ingestion_endpoint = None;

        for part in connection_string
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            let (name, value) =
                part.split_once('=')
                    .ok_or_else(|| WorkerError::InvalidConfigValueError {
                        field: FIELD.to_string(),
                        value: part.to_string(),
                        reason: "expected Key=Value pairs separated by ';'".to_string(),
                    })?;

            match name.trim().to_ascii_lowercase().as_str() {
                "instrumentationkey" => instrumentation_key = Some(value.trim().to_string()),
                "ingestionendpoint" => ingestion_endpoint = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let instrumentation_key = non_blank(instrumentation_key.as_deref())
            .ok_or_else(|| WorkerError::MissingConfigError {
                field: format!("{}.InstrumentationKey", FIELD),
            })?
            .to_string();

        let endpoint = ingestion_endpoint.unwrap_or_else(|| DEFAULT_INGESTION_ENDPOINT.to_string());
        validate_url(FIELD, &endpoint)?;

        let mut base = Url::parse(&endpoint).map_err(|e| WorkerError::config(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let track_url = base
            .join("v2/track")
            .map_err(|e| WorkerError::config(e.to_string()))?;

        Ok(Self {
            instrumentation_key,
            track_url,
        })
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    name: String,
    time: String,
    #[serde(rename = "iKey")]
    i_key: &'a str,
    tags: BTreeMap<&'static str, &'a str>,
    data: EnvelopeData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeData<'a> {
    base_type: &'static str,
    base_data: RemoteDependencyData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDependencyData<'a> {
    ver: u8,
    name: &'a str,
    data: &'a str,
    duration: String,
    success: bool,
    #[serde(rename = "type")]
    dependency_type: &'a str,
}

/// 將相依事件送往 Application Insights 的 track 端點。
/// 送出在背景 task 進行，失敗只記錄 warn。
#[derive(Debug, Clone)]
pub struct AppInsightsTelemetry {
    client: Client,
    connection: AppInsightsConnection,
    role_name: String,
}

impl AppInsightsTelemetry {
    pub fn new(connection: AppInsightsConnection, role_name: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            connection,
            role_name: role_name.into(),
        })
    }

    pub fn envelope(&self, event: &DependencyEvent) -> serde_json::Value {
        let key = &self.connection.instrumentation_key;
        let mut tags = BTreeMap::new();
        tags.insert("ai.cloud.role", self.role_name.as_str());

        let envelope = Envelope {
            name: format!(
                "Microsoft.ApplicationInsights.{}.RemoteDependency",
                key.replace('-', "")
            ),
            time: event.start.to_rfc3339_opts(SecondsFormat::Micros, true),
            i_key: key,
            tags,
            data: EnvelopeData {
                base_type: "RemoteDependencyData",
                base_data: RemoteDependencyData {
                    ver: 2,
                    name: &event.name,
                    data: &event.data,
                    duration: format_duration(event.duration),
                    success: event.success,
                    dependency_type: &event.dependency_type,
                },
            },
        };

        // 結構只含字串與數字，序列化不會失敗
        serde_json::to_value(envelope).unwrap_or_default()
    }

    pub async fn send(&self, event: &DependencyEvent) -> Result<()> {
        let body = serde_json::Value::Array(vec![self.envelope(event)]);
        self.client
            .post(self.connection.track_url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl TelemetrySink for AppInsightsTelemetry {
    fn track_dependency(&self, event: DependencyEvent) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No async runtime available, telemetry event dropped");
                return;
            }
        };

        let sink = self.clone();
        handle.spawn(async move {
            if let Err(e) = sink.send(&event).await {
                tracing::warn!(error = %e, "Failed to send dependency telemetry");
            }
        });
    }
}

/// Application Insights 的 `d.hh:mm:ss.ffffff` 時間格式
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!(
        "{}.{:02}:{:02}:{:02}.{:06}",
        days,
        hours,
        minutes,
        seconds,
        duration.subsec_micros()
    )
}
