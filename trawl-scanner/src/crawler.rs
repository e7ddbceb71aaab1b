use crate::error::{Result, ScanError};
use crate::node::NodeId;
use crate::result::{CrawlEvent, CrawlSummary};
use crate::source::ContentSource;
use crate::visited::VisitedSet;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

pub type ProgressCallback = Arc<dyn Fn(NodeId, i64) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: i64 = 4;

pub struct Crawler {
    source: Arc<dyn ContentSource>,
    max_depth: i64,
    max_in_flight: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

/// State shared by every task of one crawl run.
struct CrawlContext {
    source: Arc<dyn ContentSource>,
    visited: VisitedSet,
    permits: Option<Semaphore>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    fetched: AtomicUsize,
    failed: AtomicUsize,
    panicked: AtomicUsize,
}

impl CrawlContext {
    fn emit(&self, event: CrawlEvent) {
        if let Some(ref callback) = self.result_callback {
            callback(event);
        }
    }
}

impl Crawler {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_DEPTH,
            max_in_flight: None,
            progress_callback: None,
            result_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: i64) -> Self {
        self.max_depth = depth;
        self
    }

    /// Caps the number of fetches running at once. Unbounded when unset.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Sink for found/failed records. Called once per record, from whichever
    /// task produced it.
    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn max_depth(&self) -> i64 {
        self.max_depth
    }

    /// Crawls from `root` and returns once every task it spawned has finished.
    ///
    /// Fetch failures are reported through the result callback and never fail
    /// the crawl. Each call starts with an empty visited set.
    pub async fn crawl(&self, root: impl Into<NodeId>) -> Result<CrawlSummary> {
        let root = root.into();

        if self.max_in_flight == Some(0) {
            return Err(ScanError::InvalidConfig(
                "max in-flight fetches must be at least 1".to_string(),
            ));
        }

        match self.max_in_flight {
            Some(limit) => info!(
                "Starting crawl of {} to depth {} ({} fetches in flight)",
                root, self.max_depth, limit
            ),
            None => info!("Starting crawl of {} to depth {}", root, self.max_depth),
        }

        let ctx = Arc::new(CrawlContext {
            source: self.source.clone(),
            visited: VisitedSet::new(),
            permits: self.max_in_flight.map(Semaphore::new),
            progress_callback: self.progress_callback.clone(),
            result_callback: self.result_callback.clone(),
            fetched: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            panicked: AtomicUsize::new(0),
        });

        let start = Instant::now();
        tokio::spawn(Self::visit(ctx.clone(), root.clone(), self.max_depth)).await?;

        let summary = CrawlSummary {
            root: Some(root),
            max_depth: self.max_depth,
            fetched: ctx.fetched.load(Ordering::SeqCst),
            failed: ctx.failed.load(Ordering::SeqCst),
            visited: ctx.visited.len(),
            panicked_tasks: ctx.panicked.load(Ordering::SeqCst),
            elapsed: start.elapsed(),
        };

        info!(
            "Crawl complete. Fetched {} pages, {} failed, in {:?}",
            summary.fetched, summary.failed, summary.elapsed
        );
        Ok(summary)
    }

    /// One crawl task: gate, fetch, report, fan out, join.
    ///
    /// A node at depth 1 still spawns its children at depth 0; those gate out
    /// without fetching.
    fn visit(ctx: Arc<CrawlContext>, node: NodeId, depth: i64) -> BoxFuture<'static, ()> {
        async move {
            if depth <= 0 {
                trace!("Depth exhausted at {}", node);
                return;
            }
            if !ctx.visited.add(&node) {
                trace!("Already visited {}", node);
                return;
            }

            if let Some(ref callback) = ctx.progress_callback {
                callback(node.clone(), depth);
            }

            debug!("Fetching {} (depth {})", node, depth);
            let outcome = {
                // Held for the fetch only, never across the join below.
                let _permit = match ctx.permits {
                    Some(ref permits) => permits.acquire().await.ok(),
                    None => None,
                };
                ctx.source.fetch(&node).await
            };

            let page = match outcome {
                Ok(page) => page,
                Err(e) => {
                    debug!("Crawl error for {}: {}", node, e);
                    ctx.failed.fetch_add(1, Ordering::SeqCst);
                    ctx.emit(CrawlEvent::Failed {
                        node,
                        reason: e.to_string(),
                        depth,
                    });
                    return;
                }
            };

            ctx.fetched.fetch_add(1, Ordering::SeqCst);
            ctx.emit(CrawlEvent::Found {
                node: node.clone(),
                content: page.content,
                depth,
            });

            let mut children = JoinSet::new();
            for edge in page.edges {
                debug!("[{}] Spawning {} at depth {}", node, edge, depth - 1);
                children.spawn(Self::visit(ctx.clone(), edge, depth - 1));
            }

            while let Some(joined) = children.join_next().await {
                if let Err(e) = joined {
                    warn!("Crawl task below {} did not finish: {}", node, e);
                    ctx.panicked.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        .boxed()
    }
}
