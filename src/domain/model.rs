use crate::utils::error::{Result, WorkerError};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// 上游回報的一筆計數結果。
///
/// 欄位由上游 schema 決定，這裡只保證是「平坦」的物件：
/// 鍵一律轉小寫（不分大小寫比對），值只能是純量。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct CountingResult {
    fields: BTreeMap<String, Value>,
}

impl CountingResult {
    /// 解析訊息內容。`null` 文件回傳 `Ok(None)`，不視為錯誤。
    pub fn parse(payload: &str) -> Result<Option<Self>> {
        serde_json::from_str::<Option<Self>>(payload).map_err(|e| WorkerError::InvalidPayload {
            reason: e.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(&name.to_lowercase())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

struct CountingResultVisitor;

impl<'de> Visitor<'de> for CountingResultVisitor {
    type Value = CountingResult;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flat JSON object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = BTreeMap::new();

        // 依文件順序讀取，大小寫衝突時以後出現的鍵為準
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            if value.is_object() || value.is_array() {
                return Err(de::Error::custom(format!(
                    "field `{}` must be a scalar value",
                    key
                )));
            }
            fields.insert(key.to_lowercase(), value);
        }

        Ok(CountingResult { fields })
    }
}

impl<'de> Deserialize<'de> for CountingResult {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CountingResultVisitor)
    }
}

/// 從 broker 收到的訊息（已複製成擁有權的版本）。key 不處理。
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            payload: Some(payload.into()),
            timestamp: None,
        }
    }

    pub fn payload_str(&self) -> &str {
        self.payload.as_deref().unwrap_or_default()
    }
}
