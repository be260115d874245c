// Result export and crawl reports

use crate::crawl::extract_url_path;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;
use weaver_scanner::{StreamSnapshot, UrlResult};

const CSV_HEADERS: [&str; 5] = ["URL", "Status Code", "Parent URL", "Depth", "Timestamp"];

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

/// One exported row. Field names follow the JSON export contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRecord<'a> {
    url: &'a str,
    status_code: Option<u16>,
    parent_url: Option<&'a str>,
    depth: u32,
    timestamp: String,
}

impl<'a> From<&'a UrlResult> for ExportRecord<'a> {
    fn from(result: &'a UrlResult) -> Self {
        Self {
            url: &result.url,
            status_code: result.status_code,
            parent_url: result.parent_url.as_deref(),
            depth: result.depth,
            timestamp: format_timestamp(&result.timestamp),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Every cell is double-quoted; rows are separated by `\n` with no trailing newline.
pub fn export_csv(results: &[UrlResult]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for result in results {
        writer.write_record([
            result.url.clone(),
            result
                .status_code
                .map(|code| code.to_string())
                .unwrap_or_default(),
            result.parent_url.clone().unwrap_or_default(),
            result.depth.to_string(),
            format_timestamp(&result.timestamp),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    let mut csv = String::from_utf8(bytes).context("CSV output is not valid UTF-8")?;
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

pub fn export_json(results: &[UrlResult]) -> serde_json::Result<String> {
    let records: Vec<ExportRecord> = results.iter().map(ExportRecord::from).collect();
    serde_json::to_string_pretty(&records)
}

fn colored_status(status_code: Option<u16>) -> String {
    match status_code {
        Some(code @ 100..=199) => code.to_string().white().to_string(),
        Some(code @ 200..=299) => code.to_string().green().to_string(),
        Some(code @ 300..=399) => code.to_string().cyan().to_string(),
        Some(code @ 400..=499) => code.to_string().yellow().to_string(),
        Some(code @ 500..=599) => code.to_string().red().to_string(),
        Some(code) => code.to_string(),
        None => "ERR".red().bold().to_string(),
    }
}

/// Generate a human-readable summary of a finished run
pub fn generate_crawl_report(snapshot: &StreamSnapshot) -> String {
    let results = &snapshot.results;

    let mut report = String::new();
    report.push_str(DIVIDER);
    report.push_str("\n\n# Summary:\n");
    if let Some(ref config) = snapshot.config {
        report.push_str(&format!("  Seed: {}\n", config.seed_url));
        report.push_str(&format!(
            "  Max depth: {} ({})\n",
            config.max_depth,
            config.scope_label()
        ));
    }
    report.push_str(&format!("  Pages crawled: {}\n", results.len()));
    report.push_str(&format!("  Succeeded: {}\n", snapshot.counters.processed));
    report.push_str(&format!("  Errors: {}\n", snapshot.counters.errored));

    let deepest = results.iter().map(|r| r.depth).max().unwrap_or(0);
    report.push_str(&format!("  Deepest level reached: {}\n", deepest));

    report.push('\n');
    report.push_str(DIVIDER);
    report.push_str("\n\n");

    let mut by_host: BTreeMap<String, Vec<&UrlResult>> = BTreeMap::new();
    for result in results {
        if let Ok(url) = Url::parse(&result.url)
            && let Some(host) = url.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(result);
        }
    }

    for (host, host_results) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", host_results.len()));

        for result in host_results {
            report.push_str(&format!(
                "  {} {} {}\n",
                colored_status(result.status_code),
                extract_url_path(&result.url),
                format!("(depth {})", result.depth).bright_black()
            ));
        }
        report.push('\n');
    }

    report
}

/// Render `snapshot` in the requested format
pub fn render_report(snapshot: &StreamSnapshot, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(snapshot)),
        ReportFormat::Json => Ok(export_json(&snapshot.results)?),
        ReportFormat::Csv => export_csv(&snapshot.results),
    }
}

pub fn write_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
