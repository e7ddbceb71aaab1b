// Report generation from a finished crawl

use crate::crawl::CrawlOutcome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use trawl_scanner::CrawlEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub root: String,
    pub max_depth: i64,
    pub crawl_info: CrawlInfo,
    pub pages: Vec<PageEntry>,
    pub failures: Vec<FailureEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_requests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlInfo {
    pub fetched: usize,
    pub failed: usize,
    pub visited: usize,
    pub panicked_tasks: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub node: String,
    pub depth: i64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub node: String,
    pub depth: i64,
    pub reason: String,
}

/// Orders pages and failures by distance from the root (highest remaining
/// depth first), then by node, so reports are stable across runs.
pub fn gather_report_data(outcome: &CrawlOutcome) -> ReportData {
    let mut pages = Vec::new();
    let mut failures = Vec::new();

    for event in &outcome.events {
        match event {
            CrawlEvent::Found {
                node,
                content,
                depth,
            } => pages.push(PageEntry {
                node: node.to_string(),
                depth: *depth,
                content: content.clone(),
            }),
            CrawlEvent::Failed {
                node,
                reason,
                depth,
            } => failures.push(FailureEntry {
                node: node.to_string(),
                depth: *depth,
                reason: reason.clone(),
            }),
        }
    }

    pages.sort_by(|a, b| b.depth.cmp(&a.depth).then_with(|| a.node.cmp(&b.node)));
    failures.sort_by(|a, b| b.depth.cmp(&a.depth).then_with(|| a.node.cmp(&b.node)));

    let summary = &outcome.summary;
    ReportData {
        root: summary
            .root
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_default(),
        max_depth: summary.max_depth,
        crawl_info: CrawlInfo {
            fetched: summary.fetched,
            failed: summary.failed,
            visited: summary.visited,
            panicked_tasks: summary.panicked_tasks,
            elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
        },
        pages,
        failures,
        duplicate_requests: outcome
            .duplicate_requests()
            .into_iter()
            .map(|n| n.to_string())
            .collect(),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                 TRAWL CRAWL REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Root:         {}\n", data.root));
    report.push_str(&format!("Max depth:    {}\n", data.max_depth));
    report.push_str(&format!("Duration:     {} ms\n\n", data.crawl_info.elapsed_ms));

    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages fetched: {}\n", data.crawl_info.fetched));
    report.push_str(&format!("  Failed fetches: {}\n", data.crawl_info.failed));
    report.push_str(&format!("  Nodes visited: {}\n", data.crawl_info.visited));
    if data.crawl_info.panicked_tasks > 0 {
        report.push_str(&format!(
            "  Aborted tasks: {}\n",
            data.crawl_info.panicked_tasks
        ));
    }
    report.push('\n');

    if !data.pages.is_empty() {
        report.push_str("## Pages\n");
        for page in &data.pages {
            report.push_str(&format!(
                "  [remaining depth {}] {} {:?}\n",
                page.depth, page.node, page.content
            ));
        }
        report.push('\n');
    }

    if !data.failures.is_empty() {
        report.push_str("## Failures\n");
        for failure in &data.failures {
            report.push_str(&format!(
                "  [remaining depth {}] {}\n",
                failure.depth, failure.reason
            ));
        }
        report.push('\n');
    }

    if !data.duplicate_requests.is_empty() {
        report.push_str("## Duplicate requests\n");
        for node in &data.duplicate_requests {
            report.push_str(&format!("  {}\n", node));
        }
        report.push('\n');
    }

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Trawl",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "crawl": {
                "root": data.root,
                "max_depth": data.max_depth,
                "duration_ms": data.crawl_info.elapsed_ms,
            },
            "summary": {
                "fetched": data.crawl_info.fetched,
                "failed": data.crawl_info.failed,
                "visited": data.crawl_info.visited,
                "panicked_tasks": data.crawl_info.panicked_tasks,
            },
            "pages": data.pages,
            "failures": data.failures,
            "duplicate_requests": data.duplicate_requests,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
