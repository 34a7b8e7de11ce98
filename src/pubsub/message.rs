//! Message envelopes
//!
//! Payloads are arbitrary JSON values. On the wire the JSON encoding of the
//! payload travels base64 encoded in the `data` field; received bytes that are
//! not valid JSON come back as a string value.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// String-to-string message attributes
pub type Attributes = BTreeMap<String, String>;

/// A message ready to publish.
///
/// `attributes: None` (absent) and `Some(empty)` are kept distinct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl OutboundMessage {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            attributes: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A message delivered by a pull.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub ack_id: String,
    pub publish_time: Option<DateTime<Utc>>,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

/// Build an outbound message from any serializable payload
pub fn make_message<T: Serialize + ?Sized>(
    data: &T,
    attributes: Option<Attributes>,
) -> Result<OutboundMessage> {
    Ok(OutboundMessage {
        data: serde_json::to_value(data)?,
        attributes,
    })
}

/// Strip the delivery fields so a received message can be published again
pub fn to_outbound(message: &ReceivedMessage) -> OutboundMessage {
    OutboundMessage {
        data: message.data.clone(),
        attributes: message.attributes.clone(),
    }
}

/// [`to_outbound`] over one or many messages
pub fn reset_messages<'a>(
    messages: impl IntoIterator<Item = &'a ReceivedMessage>,
) -> Vec<OutboundMessage> {
    messages.into_iter().map(to_outbound).collect()
}

/// Collect ack ids from one or many messages (`Some(&m)`, a slice, a `Vec`...)
pub fn pluck_ack_ids<'a>(messages: impl IntoIterator<Item = &'a ReceivedMessage>) -> Vec<String> {
    messages.into_iter().map(|m| m.ack_id.clone()).collect()
}

/// Encode a payload for the wire `data` field
pub fn encode_data(data: &Value) -> Result<String> {
    let bytes = serde_json::to_vec(data)?;
    Ok(STANDARD.encode(bytes))
}

/// Decode a wire `data` field back into a payload
pub fn decode_data(encoded: &str) -> Result<Value> {
    if encoded.is_empty() {
        return Ok(Value::Null);
    }
    let bytes = STANDARD.decode(encoded)?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        // Published by something other than this library
        Err(_) => Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
    }
}
