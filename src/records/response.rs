//! Aggregator batches: the payload of every feed message.

use super::EntityRecord;
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;

/// How the feed labelled a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageType {
    /// Full snapshot of current truth for the topic.
    InitialDump,
    /// Incremental rows and changes.
    Update,
    /// Any other label. Treated as a snapshot if none arrived yet, else as an update.
    Other(String),
}

impl MessageType {
    fn from_wire(label: Option<String>) -> Self {
        match label.as_deref() {
            Some("INITIAL_DUMP") => MessageType::InitialDump,
            Some("UPDATE") => MessageType::Update,
            Some(other) => MessageType::Other(other.to_string()),
            None => MessageType::Other(String::new()),
        }
    }
}

/// One decoded feed message.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawResponse")]
pub struct AggregatorResponse {
    pub version: Option<String>,
    pub format: Option<String>,
    pub message_type: MessageType,
    pub records: Vec<EntityRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    records: Vec<Value>,
}

impl From<RawResponse> for AggregatorResponse {
    fn from(raw: RawResponse) -> Self {
        let version = raw.version.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        });
        Self {
            version,
            format: raw.format,
            message_type: MessageType::from_wire(raw.message_type),
            records: raw.records.into_iter().map(EntityRecord::from_value).collect(),
        }
    }
}

impl AggregatorResponse {
    /// Snapshot batch.
    pub fn initial(records: Vec<EntityRecord>) -> Self {
        Self::with_type(MessageType::InitialDump, records)
    }

    /// Incremental batch.
    pub fn update(records: Vec<EntityRecord>) -> Self {
        Self::with_type(MessageType::Update, records)
    }

    fn with_type(message_type: MessageType, records: Vec<EntityRecord>) -> Self {
        Self {
            version: Some("1".to_string()),
            format: Some("AGGREGATOR".to_string()),
            message_type,
            records,
        }
    }

    /// Decode a message from a JSON string.
    ///
    /// Only a malformed envelope is an error; bad rows decode to unknown.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_mixed_batch() {
        let response = AggregatorResponse::from_value(json!({
            "version": "1",
            "format": "AGGREGATOR",
            "messageType": "UPDATE",
            "records": [
                {"_type": "MATCH", "id": "m1", "name": "A vs B"},
                {"_type": "UPDATE", "entityType": "BETTING_OFFER", "id": "bo1",
                 "changedProperties": {"odds": 2.1}},
                {"_type": "SOMETHING_NEW", "id": "x"},
                {"_type": "DELETE", "entityType": "MARKET", "id": "mk3"}
            ]
        }))
        .unwrap();

        assert_eq!(response.message_type, MessageType::Update);
        assert_eq!(response.records.len(), 4);
        assert!(matches!(response.records[0], EntityRecord::Entity(_)));
        assert!(matches!(response.records[1], EntityRecord::Change(_)));
        assert!(response.records[2].is_unknown());
        assert!(matches!(response.records[3], EntityRecord::Change(_)));
    }

    #[test]
    fn test_unlabelled_batch() {
        let response = AggregatorResponse::from_json(r#"{"records": []}"#).unwrap();
        assert_eq!(response.message_type, MessageType::Other(String::new()));
        assert!(response.records.is_empty());
    }

    #[test]
    fn test_malformed_envelope_is_error() {
        assert!(AggregatorResponse::from_json(r#"{"records": 5}"#).is_err());
        assert!(AggregatorResponse::from_json("not json").is_err());
    }
}
