//! REST dispatch
//!
//! Maps the [`PubsubService`] operations onto Pub/Sub v1 REST calls.

use super::message::{self, Attributes, OutboundMessage, ReceivedMessage};
use super::service::PubsubService;
use super::types::{Page, PageQuery, PullOptions, Subscription, SubscriptionOptions, Topic};
use crate::error::{Error, Result};
use crate::gcp::client::GcpClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

#[async_trait]
impl PubsubService for GcpClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn create_topic(&self, topic: &Topic) -> Result<Topic> {
        tracing::info!("create_topic: {}", topic);
        let url = self.pubsub_url(topic.name());
        let response = self.put(&url, Some(&json!({}))).await?;
        Ok(topic_from_value(&response).unwrap_or_else(|| topic.clone()))
    }

    async fn list_topics(&self, query: &PageQuery) -> Result<Page<Topic>> {
        let url = add_page_params(&self.project_url("topics"), query);
        let response = self.get(&url).await?;
        Ok(split_page(response, "topics", topic_from_value))
    }

    async fn delete_topic(&self, topic: &Topic) -> Result<()> {
        tracing::info!("delete_topic: {}", topic);
        self.delete(&self.pubsub_url(topic.name())).await?;
        Ok(())
    }

    async fn create_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        tracing::info!(
            "create_subscription: {} on {}",
            subscription,
            subscription.topic()
        );

        let mut body = Map::new();
        body.insert(
            "topic".to_string(),
            Value::String(subscription.topic().name().to_string()),
        );
        if let Some(seconds) = subscription.options().ack_deadline_seconds {
            body.insert("ackDeadlineSeconds".to_string(), json!(seconds));
        }

        let url = self.pubsub_url(subscription.name());
        let response = self.put(&url, Some(&Value::Object(body))).await?;

        // Keep the caller's client-side options (auto ack, interval) on the returned reference
        let mut options = subscription.options().clone();
        if let Some(seconds) = ack_deadline_from_value(&response) {
            options.ack_deadline_seconds = Some(seconds);
        }
        Ok(Subscription::from_parts(
            subscription.name(),
            subscription.topic().clone(),
            options,
        ))
    }

    async fn list_subscriptions(&self, query: &PageQuery) -> Result<Page<Subscription>> {
        let url = add_page_params(&self.project_url("subscriptions"), query);
        let response = self.get(&url).await?;
        Ok(split_page(response, "subscriptions", subscription_from_value))
    }

    async fn delete_subscription(&self, subscription: &Subscription) -> Result<()> {
        tracing::info!("delete_subscription: {}", subscription);
        self.delete(&self.pubsub_url(subscription.name())).await?;
        Ok(())
    }

    async fn publish(&self, topic: &Topic, messages: &[OutboundMessage]) -> Result<Vec<String>> {
        tracing::debug!("publish: {} message(s) to {}", messages.len(), topic);

        let wire = messages
            .iter()
            .map(outbound_to_value)
            .collect::<Result<Vec<_>>>()?;

        let url = self.pubsub_url(&format!("{}:publish", topic.name()));
        let response = self.post(&url, Some(&json!({ "messages": wire }))).await?;

        Ok(response
            .get("messageIds")
            .and_then(|v| v.as_array())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn pull(
        &self,
        subscription: &Subscription,
        options: &PullOptions,
    ) -> Result<Vec<ReceivedMessage>> {
        let body = json!({
            "maxMessages": options.max_messages,
            "returnImmediately": options.return_immediately,
        });

        let url = self.pubsub_url(&format!("{}:pull", subscription.name()));
        let response = self.post(&url, Some(&body)).await?;

        let messages = response
            .get("receivedMessages")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().map(received_from_value).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();

        tracing::debug!("pull: {} message(s) from {}", messages.len(), subscription);
        Ok(messages)
    }

    async fn acknowledge(&self, subscription: &Subscription, ack_ids: &[String]) -> Result<()> {
        tracing::debug!("acknowledge: {} id(s) on {}", ack_ids.len(), subscription);
        let url = self.pubsub_url(&format!("{}:acknowledge", subscription.name()));
        self.post(&url, Some(&json!({ "ackIds": ack_ids }))).await?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn add_page_params(url: &str, query: &PageQuery) -> String {
    let mut query_parts: Vec<String> = Vec::new();

    if let Some(size) = query.page_size {
        query_parts.push(format!("pageSize={}", size));
    }
    if let Some(token) = query.page_token.as_deref() {
        query_parts.push(format!("pageToken={}", urlencoding::encode(token)));
    }

    if query_parts.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, query_parts.join("&"))
    }
}

/// Split a listing response into its items, cursor, and remaining metadata.
/// An empty `nextPageToken` counts as absent.
fn split_page<T>(
    mut response: Value,
    items_key: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Page<T> {
    let raw_items = response
        .as_object_mut()
        .and_then(|map| map.remove(items_key))
        .unwrap_or(Value::Null);

    let items = raw_items
        .as_array()
        .map(|arr| arr.iter().filter_map(&parse).collect())
        .unwrap_or_default();

    let next_page_token = response
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Page {
        items,
        next_page_token,
        response,
    }
}

fn topic_from_value(value: &Value) -> Option<Topic> {
    value
        .get("name")
        .and_then(|v| v.as_str())
        .map(Topic::from_name)
}

fn subscription_from_value(value: &Value) -> Option<Subscription> {
    let name = value.get("name").and_then(|v| v.as_str())?;
    // Subscriptions outlive their topic; the service then reports "_deleted-topic_"
    let topic = value
        .get("topic")
        .and_then(|v| v.as_str())
        .map(Topic::from_name)
        .unwrap_or_else(|| Topic::from_name("-"));

    let options = SubscriptionOptions {
        ack_deadline_seconds: ack_deadline_from_value(value),
        ..SubscriptionOptions::default()
    };

    Some(Subscription::from_parts(name, topic, options))
}

fn ack_deadline_from_value(value: &Value) -> Option<u32> {
    value
        .get("ackDeadlineSeconds")
        .and_then(|v| v.as_u64())
        .and_then(|s| u32::try_from(s).ok())
}

fn outbound_to_value(outbound: &OutboundMessage) -> Result<Value> {
    let mut map = Map::new();
    map.insert(
        "data".to_string(),
        Value::String(message::encode_data(&outbound.data)?),
    );
    if let Some(attributes) = &outbound.attributes {
        map.insert("attributes".to_string(), json!(attributes));
    }
    Ok(Value::Object(map))
}

fn received_from_value(value: &Value) -> Result<ReceivedMessage> {
    let ack_id = value
        .get("ackId")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Response("received message without an ackId".to_string()))?
        .to_string();

    let inner = value.get("message").cloned().unwrap_or(Value::Null);

    let data = match inner.get("data").and_then(|v| v.as_str()) {
        Some(encoded) => message::decode_data(encoded)?,
        None => Value::Null,
    };

    let attributes = inner.get("attributes").and_then(|v| v.as_object()).map(|map| {
        map.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect::<Attributes>()
    });

    let publish_time = inner
        .get("publishTime")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(ReceivedMessage {
        message_id: inner
            .get("messageId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        ack_id,
        publish_time,
        data,
        attributes,
    })
}
