pub mod crawler;
pub mod error;
pub mod node;
pub mod result;
pub mod source;
pub mod visited;

pub use crawler::{Crawler, ProgressCallback, ResultCallback, DEFAULT_MAX_DEPTH};
pub use error::{FetchError, ScanError};
pub use node::NodeId;
pub use result::{CrawlEvent, CrawlSummary, FetchResult};
pub use source::{CannedSource, ContentSource, CountingSource, DelayedSource, Page, TimeoutSource};
pub use visited::VisitedSet;
