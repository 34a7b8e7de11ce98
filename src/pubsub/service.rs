//! Capability surface of the messaging service.
//!
//! Everything above this trait (provisioning, pagination, bulk deletes, message
//! helpers) is written against it; [`crate::gcp::client::GcpClient`] implements
//! it over the Pub/Sub REST API.

use super::message::{OutboundMessage, ReceivedMessage};
use super::types::{Page, PageQuery, PullOptions, Subscription, SubscriptionOptions, Topic};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PubsubService: Send + Sync {
    /// Project every topic and subscription reference is scoped to
    fn project_id(&self) -> &str;

    /// Reference a topic by id or full name. Local only.
    fn topic(&self, name: &str) -> Topic {
        Topic::new(self.project_id(), name)
    }

    /// Reference a subscription on `topic`, in the topic's project or else
    /// this service's. Local only.
    fn subscription(&self, topic: &Topic, id: &str, options: SubscriptionOptions) -> Subscription {
        let project_id = topic.project_id().unwrap_or_else(|| self.project_id());
        Subscription::in_project(project_id, topic, id, options)
    }

    /// Fails with [`crate::ErrorKind::AlreadyExists`] if the topic exists
    async fn create_topic(&self, topic: &Topic) -> Result<Topic>;

    async fn list_topics(&self, query: &PageQuery) -> Result<Page<Topic>>;

    async fn delete_topic(&self, topic: &Topic) -> Result<()>;

    /// Fails with [`crate::ErrorKind::AlreadyExists`] if the subscription exists
    async fn create_subscription(&self, subscription: &Subscription) -> Result<Subscription>;

    async fn list_subscriptions(&self, query: &PageQuery) -> Result<Page<Subscription>>;

    async fn delete_subscription(&self, subscription: &Subscription) -> Result<()>;

    /// Returns the server-assigned message ids, in order
    async fn publish(&self, topic: &Topic, messages: &[OutboundMessage]) -> Result<Vec<String>>;

    async fn pull(
        &self,
        subscription: &Subscription,
        options: &PullOptions,
    ) -> Result<Vec<ReceivedMessage>>;

    async fn acknowledge(&self, subscription: &Subscription, ack_ids: &[String]) -> Result<()>;
}
