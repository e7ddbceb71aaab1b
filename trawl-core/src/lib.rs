use colored::Colorize;

pub mod crawl;
pub mod report;

pub use crawl::{
    build_source, execute_crawl, format_event_line, CrawlEventCallback, CrawlOptions,
    CrawlOutcome, CrawlProgressCallback, DEFAULT_ROOT,
};

const BANNER: &str = r#"
  _                       _
 | |_ _ __ __ ___      __| |
 | __| '__/ _` \ \ /\ / /| |
 | |_| | | (_| |\ V  V / | |
  \__|_|  \__,_| \_/\_/  |_|
"#;

pub fn print_banner() {
    eprintln!("{}", BANNER.bright_cyan().bold());
    eprintln!(
        "  {} {}\n",
        "trawl".bold(),
        format!("v{} - depth-bounded concurrent crawler", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
