use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use trawl::commands::command_argument_builder;
use trawl::handlers::*;
use trawl_core::{CrawlEventCallback, execute_crawl};
use trawl_scanner::{CrawlEvent, NodeId};

fn crawl_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["trawl", "crawl"];
    argv.extend_from_slice(args);
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .expect("arguments should parse");
    let (name, sub) = matches.subcommand().expect("crawl subcommand");
    assert_eq!(name, "crawl");
    sub.clone()
}

fn write_graph(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", json).unwrap();
    file
}

const DIAMOND: &str = r#"{
    "A": {"body": "alpha", "links": ["B", "C"]},
    "B": {"body": "beta", "links": ["C"]},
    "C": {"body": "gamma"}
}"#;

#[test]
fn test_load_graph_defaults_to_golang_tour() {
    let graph = load_graph_from_source(None).unwrap();
    assert_eq!(graph.len(), 4);
}

#[test]
fn test_load_graph_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let file = write_graph(DIAMOND);
    let path = PathBuf::from(file.path());

    let graph = load_graph_from_source(Some(&path))?;
    assert_eq!(graph.len(), 3);
    Ok(())
}

#[test]
fn test_load_graph_missing_file() {
    let path = PathBuf::from("/nonexistent/graph.json");
    let err = load_graph_from_source(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Failed to load graph file"));
}

#[test]
fn test_load_graph_invalid_json() {
    let file = write_graph("[1, 2, 3]");
    let path = PathBuf::from(file.path());
    assert!(load_graph_from_source(Some(&path)).is_err());
}

#[test]
fn test_expand_path_leaves_plain_paths_alone() {
    let path = PathBuf::from("/tmp/graph.json");
    assert_eq!(expand_path(&path), path);
}

#[test]
fn test_expand_path_expands_tilde() {
    let expanded = expand_path(&PathBuf::from("~/graph.json"));
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("graph.json"));
}

#[test]
fn test_crawl_options_defaults() {
    let options = crawl_options_from_matches(&crawl_matches(&[]), false);

    assert_eq!(options.root, "https://golang.org/");
    assert_eq!(options.max_depth, 4);
    assert_eq!(options.max_in_flight, None);
    assert_eq!(options.delay, None);
    assert_eq!(options.timeout, None);
    assert!(options.show_progress_bars);
}

#[test]
fn test_crawl_options_from_flags() {
    let matches = crawl_matches(&[
        "-u",
        "A",
        "-d",
        "2",
        "--max-in-flight",
        "3",
        "--delay-ms",
        "15",
        "--timeout-ms",
        "250",
        "--no-progress",
    ]);
    let options = crawl_options_from_matches(&matches, false);

    assert_eq!(options.root, "A");
    assert_eq!(options.max_depth, 2);
    assert_eq!(options.max_in_flight, Some(3));
    assert_eq!(options.delay, Some(Duration::from_millis(15)));
    assert_eq!(options.timeout, Some(Duration::from_millis(250)));
    assert!(!options.show_progress_bars);
}

#[test]
fn test_crawl_options_quiet_disables_progress() {
    let options = crawl_options_from_matches(&crawl_matches(&[]), true);
    assert!(!options.show_progress_bars);
}

#[test]
fn test_crawl_accepts_negative_depth() {
    let options = crawl_options_from_matches(&crawl_matches(&["-d", "-1"]), true);
    assert_eq!(options.max_depth, -1);
}

#[test]
fn test_crawl_rejects_unknown_format() {
    let result = command_argument_builder().try_get_matches_from(["trawl", "crawl", "-f", "html"]);
    assert!(result.is_err());
}

#[test]
fn test_render_graph_listing() {
    let graph = load_graph_from_source(None).unwrap();
    let listing = render_graph_listing(&graph);

    assert!(listing.contains(r#"https://golang.org/ "The Go Programming Language""#));
    assert!(listing.contains("  -> https://golang.org/pkg/fmt/"));
    assert!(listing.ends_with("4 nodes\n"));
}

#[tokio::test]
async fn test_handle_crawl_writes_text_report() -> Result<(), Box<dyn std::error::Error>> {
    let graph = write_graph(DIAMOND);
    let dir = TempDir::new()?;
    let report_path = dir.path().join("report.txt");

    let matches = crawl_matches(&[
        "-u",
        "A",
        "-d",
        "3",
        "-g",
        graph.path().to_str().unwrap(),
        "-o",
        report_path.to_str().unwrap(),
    ]);
    handle_crawl(&matches, true).await?;

    let report = std::fs::read_to_string(&report_path)?;
    assert!(report.contains("Root:         A"));
    assert!(report.contains("Pages fetched: 3"));
    assert!(report.contains("Failed fetches: 0"));
    Ok(())
}

#[tokio::test]
async fn test_handle_crawl_writes_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let report_path = dir.path().join("report.json");

    let matches = crawl_matches(&["-f", "json", "-o", report_path.to_str().unwrap()]);
    handle_crawl(&matches, true).await?;

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report_path)?)?;
    assert_eq!(value["report"]["summary"]["fetched"], 4);
    assert_eq!(value["report"]["summary"]["failed"], 1);
    assert_eq!(
        value["report"]["failures"][0]["node"],
        "https://golang.org/cmd/"
    );
    Ok(())
}

#[tokio::test]
async fn test_handle_crawl_reports_bad_graph_file() {
    let matches = crawl_matches(&["-g", "/nonexistent/graph.json"]);
    let err = handle_crawl(&matches, true).await.unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/graph.json"));
}

#[test]
fn test_write_event_routes_records() {
    let mut out = Vec::new();
    let mut err = Vec::new();

    write_event(
        &mut out,
        &mut err,
        &CrawlEvent::Found {
            node: NodeId::from("A"),
            content: "alpha".to_string(),
            depth: 2,
        },
    )
    .unwrap();
    write_event(
        &mut out,
        &mut err,
        &CrawlEvent::Failed {
            node: NodeId::from("B"),
            reason: "not found: B".to_string(),
            depth: 1,
        },
    )
    .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "found: A \"alpha\"\n");
    let err = String::from_utf8(err).unwrap();
    assert_eq!(err.lines().count(), 1);
    assert!(err.contains("not found: B"));
}

/// Log sink for a scoped subscriber.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

#[tokio::test]
async fn test_quiet_crawl_reports_each_failure_once() {
    // Same log level as a run without -v.
    let logs = SharedBuf::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let (out_sink, err_sink) = (out.clone(), err.clone());
    let sink: CrawlEventCallback = Arc::new(move |event: &CrawlEvent| {
        let (mut out, mut err) = (out_sink.clone(), err_sink.clone());
        write_event(&mut out, &mut err, event).unwrap();
    });

    let options = crawl_options_from_matches(&crawl_matches(&["--no-progress"]), true);
    let graph = load_graph_from_source(None).unwrap();
    let outcome = execute_crawl(options, graph, None, Some(sink)).await.unwrap();

    assert_eq!(outcome.summary.failed, 1);
    let failures = err.contents();
    assert_eq!(failures.lines().count(), 1);
    assert!(failures.contains("not found: https://golang.org/cmd/"));
    assert_eq!(out.contents().lines().count(), 4);

    let logs = logs.contents();
    assert!(
        !logs.contains("https://golang.org/cmd/"),
        "failure was also logged: {}",
        logs
    );
}
