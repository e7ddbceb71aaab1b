use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Content of one node and the edges discovered in it, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub content: String,
    pub edges: Vec<NodeId>,
}

impl FetchResult {
    pub fn new(content: impl Into<String>, edges: Vec<NodeId>) -> Self {
        Self {
            content: content.into(),
            edges,
        }
    }
}

/// A single record delivered to the crawl's output sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrawlEvent {
    Found {
        node: NodeId,
        content: String,
        depth: i64,
    },
    Failed {
        node: NodeId,
        reason: String,
        depth: i64,
    },
}

impl CrawlEvent {
    pub fn node(&self) -> &NodeId {
        match self {
            CrawlEvent::Found { node, .. } | CrawlEvent::Failed { node, .. } => node,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CrawlEvent::Failed { .. })
    }
}

/// Counters for a finished crawl. Results themselves only flow through the sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub root: Option<NodeId>,
    pub max_depth: i64,
    pub fetched: usize,
    pub failed: usize,
    pub visited: usize,
    pub panicked_tasks: usize,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn attempted(&self) -> usize {
        self.fetched + self.failed
    }
}
