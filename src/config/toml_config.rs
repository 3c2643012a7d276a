use crate::kafka::KafkaSettings;
use crate::telemetry::AppInsightsConnection;
use crate::utils::error::{Result, WorkerError};
use crate::utils::validation::{
    non_blank, validate_non_empty_string, validate_path, validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub connection_strings: ConnectionStrings,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub host: String,
    #[serde(default)]
    pub username: String,
    pub group_id: String,
    pub topic: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionStrings {
    /// Kafka 密碼；空白代表不驗證
    pub kafka: Option<String>,
    pub application_insights: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Postgres,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub kind: StorageKind,
    pub output_path: Option<String>,
}

impl WorkerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| WorkerError::config(format!("TOML parsing error: {}", e)))
    }

    /// 載入檔案後再套用環境變數覆蓋
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${KAFKA_SECRET})，未設定的變數換成空字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| WorkerError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(result.to_string())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup("KAFKA_HOST") {
            self.kafka.host = host;
        }
        if let Some(username) = lookup("KAFKA_USERNAME") {
            self.kafka.username = username;
        }
        if let Some(group_id) = lookup("KAFKA_GROUP_ID") {
            self.kafka.group_id = group_id;
        }
        if let Some(topic) = lookup("KAFKA_TOPIC") {
            self.kafka.topic = topic;
        }
        if let Some(secret) = lookup("KAFKA_SECRET") {
            self.connection_strings.kafka = Some(secret);
        }
        if let Some(conn) = lookup("APPLICATIONINSIGHTS_CONNECTION_STRING") {
            self.connection_strings.application_insights = Some(conn);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.connection_strings.database = Some(url);
        }
    }

    pub fn kafka_settings(&self) -> KafkaSettings {
        KafkaSettings {
            host: self.kafka.host.clone(),
            username: self.kafka.username.clone(),
            group_id: self.kafka.group_id.clone(),
            topic: self.kafka.topic.clone(),
            secret: non_blank(self.connection_strings.kafka.as_deref()).map(str::to_string),
        }
    }

    /// 未設定時回傳 `None`，改用日誌遙測
    pub fn telemetry_connection(&self) -> Result<Option<AppInsightsConnection>> {
        non_blank(self.connection_strings.application_insights.as_deref())
            .map(AppInsightsConnection::parse)
            .transpose()
    }

    pub fn database_url(&self) -> Result<&str> {
        let url = validate_required_field(
            "connection_strings.database",
            &self.connection_strings.database,
        )?;
        validate_non_empty_string("connection_strings.database", url)?;
        Ok(url.as_str())
    }

    pub fn output_path(&self) -> Result<&str> {
        let path = validate_required_field("storage.output_path", &self.storage.output_path)?;
        validate_path("storage.output_path", path)?;
        Ok(path.as_str())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("kafka.host", &self.kafka.host)?;
        validate_non_empty_string("kafka.group_id", &self.kafka.group_id)?;
        validate_non_empty_string("kafka.topic", &self.kafka.topic)?;

        if self.kafka_settings().is_authenticated() {
            validate_non_empty_string("kafka.username", &self.kafka.username)?;
        }

        match self.storage.kind {
            StorageKind::Postgres => {
                self.database_url()?;
            }
            StorageKind::File => {
                self.output_path()?;
            }
        }

        self.telemetry_connection()?;
        Ok(())
    }
}

impl Validate for WorkerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
