pub mod commands;

// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    crawl_options_from_matches, expand_path, load_graph_from_source, render_graph_listing,
};

// Re-export crawl functionality from trawl-core
pub use trawl_core::crawl::{
    execute_crawl, format_event_line, CrawlEventCallback, CrawlOptions, CrawlProgressCallback,
};
