//! In-memory Pub/Sub used by the integration tests.
//!
//! Resources live in ordered maps so listing is deterministic. Deletions
//! record how many are in flight at once.

#![allow(dead_code)]

use async_trait::async_trait;
use oakpubsub::pubsub::{
    OutboundMessage, Page, PageQuery, PubsubService, PullOptions, ReceivedMessage, Subscription,
    Topic,
};
use oakpubsub::{Error, ErrorKind, Result};
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const PROJECT: &str = "test-project";

#[derive(Default)]
struct State {
    topics: BTreeMap<String, Topic>,
    subscriptions: BTreeMap<String, Subscription>,
    queues: BTreeMap<String, VecDeque<ReceivedMessage>>,
    acked: Vec<String>,
    deleted: Vec<String>,
    next_id: u64,
}

#[derive(Default)]
pub struct FakePubsub {
    state: Mutex<State>,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub ack_calls: AtomicUsize,
    pub pull_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delete_delay: Option<Duration>,
    fail_on_create: Mutex<Option<ErrorKind>>,
    fail_delete_of: Mutex<Option<String>>,
}

fn api_error(kind: ErrorKind, message: &str) -> Error {
    let status = match kind {
        ErrorKind::AlreadyExists => 409,
        ErrorKind::NotFound => 404,
        ErrorKind::PermissionDenied => 403,
        _ => 500,
    };
    Error::Api {
        kind,
        status,
        message: message.to_string(),
    }
}

impl FakePubsub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deletions sleep for `delay` so overlapping calls can be observed
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    pub fn with_topics(self, ids: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for id in ids {
                let topic = Topic::new(PROJECT, id);
                state.topics.insert(topic.name().to_string(), topic);
            }
        }
        self
    }

    pub fn with_subscriptions(self, topic: &Topic, ids: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for id in ids {
                let sub = Subscription::new(topic, id, Default::default());
                state.subscriptions.insert(sub.name().to_string(), sub);
            }
        }
        self
    }

    /// Every following create fails with `kind`
    pub fn fail_creates_with(&self, kind: ErrorKind) {
        *self.fail_on_create.lock().unwrap() = Some(kind);
    }

    /// Deleting the resource with this short id fails
    pub fn fail_delete_of(&self, id: &str) {
        *self.fail_delete_of.lock().unwrap() = Some(id.to_string());
    }

    pub fn topic_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.topics.values().map(|t| t.id().to_string()).collect()
    }

    pub fn subscription_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.subscriptions.values().map(|s| s.id().to_string()).collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn acked(&self) -> Vec<String> {
        self.state.lock().unwrap().acked.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn check_create_failure(&self) -> Result<()> {
        match *self.fail_on_create.lock().unwrap() {
            Some(kind) => Err(api_error(kind, "injected failure")),
            None => Ok(()),
        }
    }

    async fn tracked_delete(&self, name: &str) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self.fail_delete_of.lock().unwrap().clone();
        if failing.as_deref() == Some(oakpubsub::pubsub::types::short_name(name)) {
            return Err(api_error(ErrorKind::PermissionDenied, "injected delete failure"));
        }
        Ok(())
    }

    /// Keyset pagination: the cursor is the last name handed out, so
    /// deleting already-listed resources never shifts later pages
    fn page_of<T: Clone>(items: Vec<(String, T)>, query: &PageQuery) -> Page<T> {
        let size = query.page_size.unwrap_or(1000) as usize;
        let remaining: Vec<(String, T)> = items
            .into_iter()
            .filter(|(name, _)| match query.page_token.as_deref() {
                Some(after) => name.as_str() > after,
                None => true,
            })
            .collect();

        let next = if remaining.len() > size {
            Some(remaining[size - 1].0.clone())
        } else {
            None
        };
        Page {
            items: remaining.into_iter().take(size).map(|(_, item)| item).collect(),
            next_page_token: next,
            response: json!({ "after": query.page_token }),
        }
    }
}

#[async_trait]
impl PubsubService for FakePubsub {
    fn project_id(&self) -> &str {
        PROJECT
    }

    async fn create_topic(&self, topic: &Topic) -> Result<Topic> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_create_failure()?;

        let mut state = self.state.lock().unwrap();
        if state.topics.contains_key(topic.name()) {
            return Err(api_error(
                ErrorKind::AlreadyExists,
                "Resource already exists in the project",
            ));
        }
        state.topics.insert(topic.name().to_string(), topic.clone());
        Ok(topic.clone())
    }

    async fn list_topics(&self, query: &PageQuery) -> Result<Page<Topic>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let topics: Vec<(String, Topic)> = self
            .state
            .lock()
            .unwrap()
            .topics
            .iter()
            .map(|(name, topic)| (name.clone(), topic.clone()))
            .collect();
        Ok(Self::page_of(topics, query))
    }

    async fn delete_topic(&self, topic: &Topic) -> Result<()> {
        self.tracked_delete(topic.name()).await?;
        let mut state = self.state.lock().unwrap();
        match state.topics.remove(topic.name()) {
            Some(_) => {
                state.deleted.push(topic.id().to_string());
                Ok(())
            },
            None => Err(api_error(ErrorKind::NotFound, "Resource not found")),
        }
    }

    async fn create_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_create_failure()?;

        let mut state = self.state.lock().unwrap();
        if !state.topics.contains_key(subscription.topic().name()) {
            return Err(api_error(ErrorKind::NotFound, "Topic not found"));
        }
        if state.subscriptions.contains_key(subscription.name()) {
            return Err(api_error(
                ErrorKind::AlreadyExists,
                "Resource already exists in the project",
            ));
        }
        state
            .subscriptions
            .insert(subscription.name().to_string(), subscription.clone());
        Ok(subscription.clone())
    }

    async fn list_subscriptions(&self, query: &PageQuery) -> Result<Page<Subscription>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let subs: Vec<(String, Subscription)> = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .map(|(name, sub)| (name.clone(), sub.clone()))
            .collect();
        Ok(Self::page_of(subs, query))
    }

    async fn delete_subscription(&self, subscription: &Subscription) -> Result<()> {
        self.tracked_delete(subscription.name()).await?;
        let mut state = self.state.lock().unwrap();
        match state.subscriptions.remove(subscription.name()) {
            Some(_) => {
                state.deleted.push(subscription.id().to_string());
                Ok(())
            },
            None => Err(api_error(ErrorKind::NotFound, "Resource not found")),
        }
    }

    async fn publish(&self, topic: &Topic, messages: &[OutboundMessage]) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        if !state.topics.contains_key(topic.name()) {
            return Err(api_error(ErrorKind::NotFound, "Topic not found"));
        }

        let targets: Vec<String> = state
            .subscriptions
            .values()
            .filter(|s| s.topic() == topic)
            .map(|s| s.name().to_string())
            .collect();

        let mut ids = Vec::new();
        for message in messages {
            state.next_id += 1;
            let id = state.next_id.to_string();
            for target in &targets {
                let delivered = ReceivedMessage {
                    message_id: id.clone(),
                    ack_id: format!("{}-ack-{}", target, id),
                    publish_time: Some(chrono::Utc::now()),
                    data: message.data.clone(),
                    attributes: message.attributes.clone(),
                };
                state
                    .queues
                    .entry(target.clone())
                    .or_default()
                    .push_back(delivered);
            }
            ids.push(id);
        }
        Ok(ids)
    }

    async fn pull(
        &self,
        subscription: &Subscription,
        options: &PullOptions,
    ) -> Result<Vec<ReceivedMessage>> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let queue = state.queues.entry(subscription.name().to_string()).or_default();
        let take = (options.max_messages as usize).min(queue.len());
        Ok(queue.drain(..take).collect())
    }

    async fn acknowledge(&self, _subscription: &Subscription, ack_ids: &[String]) -> Result<()> {
        self.ack_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().acked.extend(ack_ids.iter().cloned());
        Ok(())
    }
}
