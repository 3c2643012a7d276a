pub mod consumer;

use crate::utils::validation::non_blank;
use rdkafka::config::ClientConfig;

pub use consumer::KafkaMessageSource;

/// Kafka 連線設定。`secret` 有值時改用 SASL_SSL。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KafkaSettings {
    pub host: String,
    pub username: String,
    pub group_id: String,
    pub topic: String,
    pub secret: Option<String>,
}

impl KafkaSettings {
    pub fn is_authenticated(&self) -> bool {
        non_blank(self.secret.as_deref()).is_some()
    }
}

/// 依設定組出 consumer 的 librdkafka 參數。
pub fn client_config(settings: &KafkaSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", &settings.host);
    config.set("group.id", &settings.group_id);
    config.set("auto.offset.reset", "earliest");

    if let Some(secret) = non_blank(settings.secret.as_deref()) {
        config.set("security.protocol", "SASL_SSL");
        config.set("sasl.mechanism", "PLAIN");
        config.set("sasl.username", &settings.username);
        config.set("sasl.password", secret);
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: Option<&str>) -> KafkaSettings {
        KafkaSettings {
            host: "broker.servicebus.windows.net:9093".to_string(),
            username: "$ConnectionString".to_string(),
            group_id: "worker-contagem".to_string(),
            topic: "topic-contagem".to_string(),
            secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn test_authenticated_transport_when_secret_present() {
        let settings = settings(Some("Endpoint=sb://secret"));
        assert!(settings.is_authenticated());

        let config = client_config(&settings);
        assert_eq!(
            config.get("bootstrap.servers"),
            Some("broker.servicebus.windows.net:9093")
        );
        assert_eq!(config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(config.get("sasl.mechanism"), Some("PLAIN"));
        assert_eq!(config.get("sasl.username"), Some("$ConnectionString"));
        assert_eq!(config.get("sasl.password"), Some("Endpoint=sb://secret"));
        assert_eq!(config.get("group.id"), Some("worker-contagem"));
        assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
    }

    #[test]
    fn test_plain_transport_when_secret_blank_or_absent() {
        for secret in [None, Some(""), Some("   ")] {
            let settings = settings(secret);
            assert!(!settings.is_authenticated());

            let config = client_config(&settings);
            assert_eq!(config.get("security.protocol"), None);
            assert_eq!(config.get("sasl.mechanism"), None);
            assert_eq!(config.get("sasl.username"), None);
            assert_eq!(config.get("sasl.password"), None);
            assert_eq!(config.get("group.id"), Some("worker-contagem"));
            assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
        }
    }
}
