use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use trawl_scanner::{
    CannedSource, ContentSource, CountingSource, CrawlEvent, CrawlSummary, Crawler,
    DelayedSource, NodeId, TimeoutSource, DEFAULT_MAX_DEPTH,
};

pub const DEFAULT_ROOT: &str = "https://golang.org/";

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub root: String,
    pub max_depth: i64,
    /// Fetch concurrency cap. `None` spawns without limit.
    pub max_in_flight: Option<usize>,
    /// Simulated latency added to every fetch.
    pub delay: Option<Duration>,
    /// Latency bound per fetch; slower fetches fail as unreachable.
    pub timeout: Option<Duration>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_in_flight: None,
            delay: None,
            timeout: None,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting individual crawl records as they come in
pub type CrawlEventCallback = Arc<dyn Fn(&CrawlEvent) + Send + Sync>;

/// Everything observed during one crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub summary: CrawlSummary,
    /// Records in arrival order. Arrival order across branches is arbitrary.
    pub events: Vec<CrawlEvent>,
    /// How often each node was requested from the source.
    pub request_counts: BTreeMap<NodeId, usize>,
}

impl CrawlOutcome {
    pub fn found(&self) -> impl Iterator<Item = &CrawlEvent> {
        self.events.iter().filter(|e| !e.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CrawlEvent> {
        self.events.iter().filter(|e| e.is_failure())
    }

    /// Nodes requested more than once. Always empty for a correct crawl.
    pub fn duplicate_requests(&self) -> Vec<&NodeId> {
        self.request_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(node, _)| node)
            .collect()
    }
}

/// Layers the configured decorators over `graph`, innermost first:
/// delay, then timeout, then request counting.
pub fn build_source(
    graph: CannedSource,
    options: &CrawlOptions,
) -> Arc<CountingSource<Arc<dyn ContentSource>>> {
    let mut source: Arc<dyn ContentSource> = Arc::new(graph);
    if let Some(delay) = options.delay {
        source = Arc::new(DelayedSource::new(source, delay));
    }
    if let Some(limit) = options.timeout {
        source = Arc::new(TimeoutSource::new(source, limit));
    }
    Arc::new(CountingSource::new(source))
}

/// One console line per record, in the form `found: <node> "<content>"` or the
/// fetch error's message.
pub fn format_event_line(event: &CrawlEvent) -> String {
    match event {
        CrawlEvent::Found { node, content, .. } => format!("found: {} {:?}", node, content),
        CrawlEvent::Failed { reason, .. } => reason.clone(),
    }
}

/// Execute a crawl over `graph` with the given options.
///
/// `progress_callback` receives a start message, then one message per fetch.
pub async fn execute_crawl(
    options: CrawlOptions,
    graph: CannedSource,
    progress_callback: Option<CrawlProgressCallback>,
    event_callback: Option<CrawlEventCallback>,
) -> Result<CrawlOutcome> {
    let source = build_source(graph, &options);

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("invalid progress bar template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Crawling {} to depth {}",
            options.root, options.max_depth
        ));
    }

    let internal_progress_callback: trawl_scanner::ProgressCallback = {
        let pb_clone = progress_bar.clone();
        let count_clone = processed_count.clone();
        let user_callback = progress_callback.clone();
        Arc::new(move |node: NodeId, depth: i64| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Crawling... {} nodes [depth {}] {}", count, depth, node));
            }
            if let Some(ref callback) = user_callback {
                callback(format!("Fetching {} (depth {})", node, depth));
            }
        })
    };

    let events: Arc<StdMutex<Vec<CrawlEvent>>> = Arc::new(StdMutex::new(Vec::new()));

    let result_callback: trawl_scanner::ResultCallback = {
        let events_clone = events.clone();
        let pb_clone = progress_bar.clone();
        Arc::new(move |event: CrawlEvent| {
            if let Some(ref cb) = event_callback {
                match pb_clone {
                    Some(ref pb) => pb.suspend(|| cb(&event)),
                    None => cb(&event),
                }
            }
            events_clone
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        })
    };

    let mut crawler = Crawler::new(source.clone())
        .with_max_depth(options.max_depth)
        .with_progress_callback(internal_progress_callback)
        .with_result_callback(result_callback);
    if let Some(limit) = options.max_in_flight {
        crawler = crawler.with_max_in_flight(limit);
    }

    let summary = crawler
        .crawl(options.root.as_str())
        .await
        .with_context(|| format!("Failed to crawl {}", options.root))?;

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} nodes processed", total));
    }

    let events = std::mem::take(&mut *events.lock().unwrap_or_else(PoisonError::into_inner));
    debug!("Crawl of {} produced {} records", options.root, events.len());

    let outcome = CrawlOutcome {
        summary,
        events,
        request_counts: source.snapshot(),
    };
    for node in outcome.duplicate_requests() {
        warn!("{} was requested more than once", node);
    }
    Ok(outcome)
}
