//! Bulk deletion of topics and subscriptions whose short name matches a
//! regular expression.
//!
//! Arguments are checked synchronously: the outer `Result` of each function
//! carries usage errors before any request is made, and the returned future
//! does the listing and deleting. Matching is an unanchored search on the
//! short name, so anchor the pattern (`^tmp-`) to match prefixes only.

use super::paginate::{for_each_page, PageSummary};
use super::service::PubsubService;
use super::types::{short_name, Page, PageQuery, Subscription, Topic};
use crate::error::{Error, Result};
use futures::{stream, StreamExt, TryStreamExt};
use regex::Regex;
use std::future::Future;

/// Default number of deletions in flight at once
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Compiled short-name filter
#[derive(Debug, Clone)]
pub struct NameMatcher {
    regex: Regex,
}

impl NameMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::usage(format!("invalid name pattern '{}': {}", pattern, e)))?;
        Ok(Self { regex })
    }

    /// Match against the last path segment of a resource name
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(short_name(name))
    }

    /// Keep only the items whose name matches
    pub fn retain<T>(&self, items: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
        items
            .into_iter()
            .filter(|item| self.matches(name(item)))
            .collect()
    }
}

fn check_args(page_size: u32, concurrency: usize) -> Result<()> {
    if page_size == 0 {
        return Err(Error::usage("page size must be greater than zero"));
    }
    if concurrency == 0 {
        return Err(Error::usage("concurrency must be greater than zero"));
    }
    Ok(())
}

/// Run `delete` over `items` with at most `concurrency` calls in flight,
/// failing as a whole if any call fails
async fn delete_all<T, F, Fut>(items: Vec<T>, concurrency: usize, delete: F) -> Result<usize>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let count = items.len();
    stream::iter(items)
        .map(delete)
        .buffer_unordered(concurrency)
        .try_collect::<Vec<()>>()
        .await?;
    Ok(count)
}

/// Walk a listing page by page and delete the items whose name matches,
/// finishing each page's deletions before the next page is requested
async fn delete_matching<T, L, LF, D, DF>(
    list: L,
    matcher: NameMatcher,
    page_size: u32,
    concurrency: usize,
    name: fn(&T) -> &str,
    delete: D,
    kind: &'static str,
) -> Result<PageSummary>
where
    L: FnMut(PageQuery) -> LF,
    LF: Future<Output = Result<Page<T>>>,
    D: Fn(T) -> DF,
    DF: Future<Output = Result<()>>,
{
    let matcher = &matcher;
    let delete = &delete;
    for_each_page(list, page_size, move |items| {
        let doomed = matcher.retain(items, name);
        async move {
            if doomed.is_empty() {
                return Ok(());
            }
            tracing::info!("Deleting {} matching {}(s)", doomed.len(), kind);
            delete_all(doomed, concurrency, delete).await?;
            Ok(())
        }
    })
    .await
}

/// Delete every topic whose short name matches `pattern`
pub fn delete_topics_matching<'a, S>(
    service: &'a S,
    pattern: &str,
    page_size: u32,
    concurrency: usize,
) -> Result<impl Future<Output = Result<PageSummary>> + 'a>
where
    S: PubsubService + ?Sized,
{
    let matcher = NameMatcher::new(pattern)?;
    check_args(page_size, concurrency)?;

    Ok(delete_matching(
        move |query: PageQuery| async move { service.list_topics(&query).await },
        matcher,
        page_size,
        concurrency,
        Topic::name,
        move |topic: Topic| async move { service.delete_topic(&topic).await },
        "topic",
    ))
}

/// Delete every subscription whose short name matches `pattern`
pub fn delete_subscriptions_matching<'a, S>(
    service: &'a S,
    pattern: &str,
    page_size: u32,
    concurrency: usize,
) -> Result<impl Future<Output = Result<PageSummary>> + 'a>
where
    S: PubsubService + ?Sized,
{
    let matcher = NameMatcher::new(pattern)?;
    check_args(page_size, concurrency)?;

    Ok(delete_matching(
        move |query: PageQuery| async move { service.list_subscriptions(&query).await },
        matcher,
        page_size,
        concurrency,
        Subscription::name,
        move |subscription: Subscription| async move {
            service.delete_subscription(&subscription).await
        },
        "subscription",
    ))
}
