//! Content sources: where a crawl gets a node's content and outgoing edges.
//!
//! [`ContentSource`] is the crawler's only extension point. The crawler does
//! all deduplication and scheduling, so implementations only answer "what is
//! at this node". Decorators ([`DelayedSource`], [`TimeoutSource`],
//! [`CountingSource`]) wrap any other source.

use crate::error::{FetchError, Result, ScanError};
use crate::node::NodeId;
use crate::result::FetchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Returns the content of `node` and the nodes it links to.
    async fn fetch(&self, node: &NodeId) -> std::result::Result<FetchResult, FetchError>;
}

#[async_trait]
impl<S> ContentSource for Arc<S>
where
    S: ContentSource + ?Sized,
{
    async fn fetch(&self, node: &NodeId) -> std::result::Result<FetchResult, FetchError> {
        (**self).fetch(node).await
    }
}

/// One entry of a canned graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub body: String,
    #[serde(default)]
    pub links: Vec<NodeId>,
}

/// In-memory table of pages. Read-only once handed to a crawler.
#[derive(Debug, Clone, Default)]
pub struct CannedSource {
    pages: BTreeMap<NodeId, Page>,
}

impl CannedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page<I, L>(mut self, node: impl Into<NodeId>, body: impl Into<String>, links: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<NodeId>,
    {
        self.pages.insert(
            node.into(),
            Page {
                body: body.into(),
                links: links.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Parses a graph of the form `{"<node>": {"body": "...", "links": ["..."]}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let pages: BTreeMap<NodeId, Page> = serde_json::from_str(json)?;
        if pages.is_empty() {
            return Err(ScanError::Graph("graph contains no pages".to_string()));
        }
        Ok(Self { pages })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).map_err(|e| match e {
            ScanError::JsonError(e) => {
                ScanError::Graph(format!("{}: {}", path.display(), e))
            }
            other => other,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.pages)?)
    }

    /// The four-page golang.org table used by the default `trawl crawl` run.
    pub fn golang_tour() -> Self {
        Self::new()
            .with_page(
                "https://golang.org/",
                "The Go Programming Language",
                ["https://golang.org/pkg/", "https://golang.org/cmd/"],
            )
            .with_page(
                "https://golang.org/pkg/",
                "Packages",
                [
                    "https://golang.org/",
                    "https://golang.org/cmd/",
                    "https://golang.org/pkg/fmt/",
                    "https://golang.org/pkg/os/",
                ],
            )
            .with_page(
                "https://golang.org/pkg/fmt/",
                "Package fmt",
                ["https://golang.org/", "https://golang.org/pkg/"],
            )
            .with_page(
                "https://golang.org/pkg/os/",
                "Package os",
                ["https://golang.org/", "https://golang.org/pkg/"],
            )
    }

    pub fn pages(&self) -> impl Iterator<Item = (&NodeId, &Page)> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl ContentSource for CannedSource {
    async fn fetch(&self, node: &NodeId) -> std::result::Result<FetchResult, FetchError> {
        match self.pages.get(node) {
            Some(page) => Ok(FetchResult::new(page.body.clone(), page.links.clone())),
            None => Err(FetchError::NotFound { node: node.clone() }),
        }
    }
}

/// Adds a fixed latency in front of another source.
pub struct DelayedSource<S> {
    inner: S,
    delay: Duration,
}

impl<S: ContentSource> DelayedSource<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for DelayedSource<S> {
    async fn fetch(&self, node: &NodeId) -> std::result::Result<FetchResult, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(node).await
    }
}

/// Bounds how long a single fetch of the inner source may take.
pub struct TimeoutSource<S> {
    inner: S,
    limit: Duration,
}

impl<S: ContentSource> TimeoutSource<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for TimeoutSource<S> {
    async fn fetch(&self, node: &NodeId) -> std::result::Result<FetchResult, FetchError> {
        match tokio::time::timeout(self.limit, self.inner.fetch(node)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!("Fetch of {} timed out after {:?}", node, self.limit);
                Err(FetchError::Unreachable {
                    node: node.clone(),
                    reason: format!("timed out after {:?}", self.limit),
                })
            }
        }
    }
}

/// Records how many times each node was requested from the inner source.
pub struct CountingSource<S> {
    inner: S,
    counts: Mutex<HashMap<NodeId, usize>>,
}

impl<S: ContentSource> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn count(&self, node: &str) -> usize {
        self.lock_counts().get(node).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.lock_counts().values().sum()
    }

    /// Highest number of requests any single node received.
    pub fn max_per_node(&self) -> usize {
        self.lock_counts().values().copied().max().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<NodeId, usize> {
        self.lock_counts()
            .iter()
            .map(|(node, count)| (node.clone(), *count))
            .collect()
    }

    fn lock_counts(&self) -> std::sync::MutexGuard<'_, HashMap<NodeId, usize>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for CountingSource<S> {
    async fn fetch(&self, node: &NodeId) -> std::result::Result<FetchResult, FetchError> {
        *self.lock_counts().entry(node.clone()).or_insert(0) += 1;
        self.inner.fetch(node).await
    }
}
