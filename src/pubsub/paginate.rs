//! Page-at-a-time enumeration of topics and subscriptions.
//!
//! Each page is handed to an async handler, and the next page is only
//! requested after that handler has finished. An error from either the
//! listing call or the handler stops the walk; pages already handled stay
//! handled.

use super::service::PubsubService;
use super::types::{Page, PageQuery, Subscription, Topic};
use crate::error::{Error, Result};
use serde_json::Value;
use std::future::Future;

/// Default number of resources requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Outcome of a completed walk
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub pages: usize,
    pub items: usize,
    /// Metadata of the last page
    pub response: Value,
}

/// Walk a cursor-paginated listing, awaiting `handler` for each page in order.
///
/// `list` is called with an explicit page size and no cursor first, then with
/// each returned cursor until a page comes back without one.
pub async fn for_each_page<T, L, LF, H, HF>(
    mut list: L,
    page_size: u32,
    mut handler: H,
) -> Result<PageSummary>
where
    L: FnMut(PageQuery) -> LF,
    LF: Future<Output = Result<Page<T>>>,
    H: FnMut(Vec<T>) -> HF,
    HF: Future<Output = Result<()>>,
{
    if page_size == 0 {
        return Err(Error::usage("page size must be greater than zero"));
    }

    let mut query = PageQuery::first(page_size);
    let mut pages = 0;
    let mut items = 0;

    loop {
        let Page {
            items: batch,
            next_page_token,
            response,
        } = list(query.clone()).await?;

        pages += 1;
        items += batch.len();
        tracing::debug!(
            "page {}: {} item(s), more: {}",
            pages,
            batch.len(),
            next_page_token.is_some()
        );

        handler(batch).await?;

        match next_page_token {
            Some(token) => query = query.next(token),
            None => {
                return Ok(PageSummary {
                    pages,
                    items,
                    response,
                })
            },
        }
    }
}

/// [`for_each_page`] over the project's topics
pub async fn for_each_topic_page<S, H, HF>(
    service: &S,
    page_size: u32,
    handler: H,
) -> Result<PageSummary>
where
    S: PubsubService + ?Sized,
    H: FnMut(Vec<Topic>) -> HF,
    HF: Future<Output = Result<()>>,
{
    for_each_page(
        move |query| async move { service.list_topics(&query).await },
        page_size,
        handler,
    )
    .await
}

/// [`for_each_page`] over the project's subscriptions
pub async fn for_each_subscription_page<S, H, HF>(
    service: &S,
    page_size: u32,
    handler: H,
) -> Result<PageSummary>
where
    S: PubsubService + ?Sized,
    H: FnMut(Vec<Subscription>) -> HF,
    HF: Future<Output = Result<()>>,
{
    for_each_page(
        move |query| async move { service.list_subscriptions(&query).await },
        page_size,
        handler,
    )
    .await
}

/// Collect every topic of the project
pub async fn list_all_topics<S>(service: &S, page_size: u32) -> Result<Vec<Topic>>
where
    S: PubsubService + ?Sized,
{
    let mut all = Vec::new();
    for_each_topic_page(service, page_size, |topics| {
        all.extend(topics);
        async { Ok(()) }
    })
    .await?;
    Ok(all)
}

/// Collect every subscription of the project
pub async fn list_all_subscriptions<S>(service: &S, page_size: u32) -> Result<Vec<Subscription>>
where
    S: PubsubService + ?Sized,
{
    let mut all = Vec::new();
    for_each_subscription_page(service, page_size, |subscriptions| {
        all.extend(subscriptions);
        async { Ok(()) }
    })
    .await?;
    Ok(all)
}
