use crate::domain::model::InboundMessage;
use crate::domain::ports::{MessageSource, Received};
use crate::kafka::{client_config, KafkaSettings};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use tokio_util::sync::CancellationToken;

/// 以 rdkafka `StreamConsumer` 實作的訊息來源。
/// offset 由 librdkafka 自動提交。
pub struct KafkaMessageSource {
    consumer: StreamConsumer,
    subscribed: bool,
}

impl KafkaMessageSource {
    /// 建立 consumer，尚未訂閱任何 topic。失敗時直接回傳錯誤，不重試。
    pub fn connect(settings: &KafkaSettings) -> Result<Self> {
        let consumer: StreamConsumer = client_config(settings).create()?;

        tracing::info!(
            host = %settings.host,
            group_id = %settings.group_id,
            authenticated = settings.is_authenticated(),
            "Kafka consumer created"
        );

        Ok(Self {
            consumer,
            subscribed: false,
        })
    }
}

fn to_inbound(message: &BorrowedMessage<'_>) -> InboundMessage {
    InboundMessage {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        payload: message
            .payload()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        timestamp: message
            .timestamp()
            .to_millis()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
    }
}

#[async_trait]
impl MessageSource for KafkaMessageSource {
    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.consumer.subscribe(&[topic])?;
        self.subscribed = true;
        Ok(())
    }

    async fn receive(&mut self, shutdown: &CancellationToken) -> Result<Received> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Ok(Received::Cancelled),
            message = self.consumer.recv() => {
                let message = message?;
                Ok(Received::Message(to_inbound(&message)))
            }
        }
    }

    fn close(&mut self) {
        if self.subscribed {
            self.consumer.unsubscribe();
            self.subscribed = false;
            tracing::info!("Kafka consumer unsubscribed");
        }
    }
}

impl Drop for KafkaMessageSource {
    fn drop(&mut self) {
        self.close();
    }
}
