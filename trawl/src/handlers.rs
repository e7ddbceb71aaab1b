use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug};
use trawl_core::report::{ReportFormat, gather_report_data, generate_report, save_report};
use trawl_core::{
    CrawlEventCallback, CrawlOptions, CrawlOutcome, CrawlProgressCallback, execute_crawl,
    format_event_line,
};
use trawl_scanner::{CannedSource, CrawlEvent};

/// Logs go to stderr so stdout carries only crawl records and reports.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Load the graph to crawl from a file, or fall back to the built-in demo table
pub fn load_graph_from_source(graph_file: Option<&PathBuf>) -> Result<CannedSource> {
    match graph_file {
        Some(path) => {
            let path = expand_path(path);
            CannedSource::from_json_file(&path)
                .with_context(|| format!("Failed to load graph file {}", path.display()))
        }
        None => Ok(CannedSource::golang_tour()),
    }
}

/// Build crawl options from the `crawl` subcommand's arguments
pub fn crawl_options_from_matches(args: &ArgMatches, quiet: bool) -> CrawlOptions {
    let defaults = CrawlOptions::default();
    CrawlOptions {
        root: args
            .get_one::<String>("url")
            .cloned()
            .unwrap_or(defaults.root),
        max_depth: args
            .get_one::<i64>("depth")
            .copied()
            .unwrap_or(defaults.max_depth),
        max_in_flight: args.get_one::<usize>("max-in-flight").copied(),
        delay: args
            .get_one::<u64>("delay-ms")
            .map(|ms| Duration::from_millis(*ms)),
        timeout: args
            .get_one::<u64>("timeout-ms")
            .map(|ms| Duration::from_millis(*ms)),
        show_progress_bars: !quiet && !args.get_flag("no-progress"),
    }
}

/// Writes one record as a single line: found records to `out`, failures to `err`.
pub fn write_event(out: &mut impl Write, err: &mut impl Write, event: &CrawlEvent) -> io::Result<()> {
    let line = format_event_line(event);
    match event {
        CrawlEvent::Found { .. } => writeln!(out, "{}", line),
        CrawlEvent::Failed { .. } => writeln!(err, "{}", line.red()),
    }
}

/// Live console sink. Each record is one locked write, so lines from
/// concurrent branches never interleave.
pub fn print_event(event: &CrawlEvent) {
    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();
    // A closed pipe (e.g. `| head`) must not abort the crawl.
    write_event(&mut out, &mut err, event).ok();
}

/// Human-readable listing of every node in a graph and its outgoing edges
pub fn render_graph_listing(graph: &CannedSource) -> String {
    let mut listing = String::new();
    for (node, page) in graph.pages() {
        listing.push_str(&format!("{} {:?}\n", node, page.body));
        for link in &page.links {
            listing.push_str(&format!("  -> {}\n", link));
        }
    }
    listing.push_str(&format!("\n{} nodes\n", graph.len()));
    listing
}

/// Per-node request counts, one line each
pub fn render_request_stats(outcome: &CrawlOutcome) -> String {
    let mut stats = String::from("# Requests per node:\n");
    for (node, count) in &outcome.request_counts {
        stats.push_str(&format!("  {:>3}  {}\n", count, node));
    }
    let duplicates = outcome.duplicate_requests().len();
    stats.push_str(&format!("  nodes requested more than once: {}\n", duplicates));
    stats
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool) -> Result<()> {
    let options = crawl_options_from_matches(args, quiet);
    let graph = load_graph_from_source(args.get_one::<PathBuf>("graph"))?;
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = args.get_one::<PathBuf>("output").map(|p| expand_path(p));
    let show_stats = args.get_flag("stats");

    if !quiet {
        eprintln!(
            "{} {} (max depth {}, {} nodes in graph)",
            "Crawling".bright_blue().bold(),
            options.root,
            options.max_depth,
            graph.len()
        );
        if let Some(limit) = options.max_in_flight {
            eprintln!("Fetches in flight: at most {}", limit);
        }
        eprintln!();
    }

    let sink: CrawlEventCallback = Arc::new(print_event);
    let progress: CrawlProgressCallback = Arc::new(|msg: String| debug!("{}", msg));
    let outcome = execute_crawl(options, graph, Some(progress), Some(sink)).await?;

    let data = gather_report_data(&outcome);
    let report = generate_report(&data, format).context("Failed to render report")?;

    match output {
        Some(path) => {
            save_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!("\n{} {}", "Report saved to".green(), path.display());
            }
        }
        None => {
            println!();
            print!("{}", report);
        }
    }

    if show_stats {
        println!();
        print!("{}", render_request_stats(&outcome));
    }

    Ok(())
}

pub fn handle_graph(args: &ArgMatches) -> Result<()> {
    let graph = load_graph_from_source(args.get_one::<PathBuf>("graph"))?;
    if args.get_flag("json") {
        println!("{}", graph.to_json_string()?);
    } else {
        print!("{}", render_graph_listing(&graph));
    }
    Ok(())
}
