use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;
use weaver_scanner::{
    CrawlConfig, CrawlEvent, Crawler, FetchSettings, LogEntry, RunCounters, RunState, Severity,
    StreamSnapshot,
};

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub config: CrawlConfig,
    /// Per-request fetch timeout
    pub timeout: Duration,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            config,
            timeout: FetchSettings::default().timeout,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Render a log entry as a single terminal line
pub fn format_log_entry(entry: &LogEntry) -> String {
    let marker = match entry.severity {
        Severity::Info => "[*]".blue(),
        Severity::Success => "[+]".green(),
        Severity::Warning => "[!]".yellow(),
        Severity::Error => "[-]".red(),
    };
    format!(
        "{} {} {}",
        entry.timestamp.format("%H:%M:%S").to_string().bright_black(),
        marker,
        entry.message
    )
}

pub fn progress_message(counters: &RunCounters) -> String {
    format!(
        "Crawling... {} processed, {} errors, {} queued",
        counters.processed, counters.errored, counters.queued
    )
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Starting crawl...");
    pb
}

/// Execute a crawl with the bundled HTTP fetcher.
/// Returns the final state of the run once it is idle again.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<StreamSnapshot> {
    let crawler = Crawler::with_http(FetchSettings::with_timeout(options.timeout))
        .context("Failed to build HTTP client")?;

    drive_crawl(
        &crawler,
        options.config,
        options.show_progress_bars,
        progress_callback,
    )
    .await
}

/// Start a run on `crawler` and follow its event stream until it is idle.
///
/// Log entries go to `progress_callback` and counters drive the spinner.
/// Ctrl+C requests a cooperative stop; a second Ctrl+C stops waiting for the
/// drain and returns whatever has been recorded so far.
pub async fn drive_crawl(
    crawler: &Crawler,
    config: CrawlConfig,
    show_progress_bars: bool,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<StreamSnapshot> {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    if tx.send(()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Unable to listen for Ctrl+C: {}", e);
                    break;
                }
            }
        }
    });

    let result =
        drive_crawl_with_interrupts(crawler, config, show_progress_bars, progress_callback, rx)
            .await;
    listener.abort();
    result
}

/// Like [`drive_crawl`], with interrupts delivered over `interrupts`.
///
/// The first interrupt stops the run; the second abandons the drain and
/// returns while the run is still `Stopping`. A closed channel is ignored.
pub async fn drive_crawl_with_interrupts(
    crawler: &Crawler,
    config: CrawlConfig,
    show_progress_bars: bool,
    progress_callback: Option<CrawlProgressCallback>,
    mut interrupts: mpsc::UnboundedReceiver<()>,
) -> Result<StreamSnapshot> {
    let seed = config.seed_url.clone();
    let run_id = crawler
        .start(config)
        .with_context(|| format!("Failed to start crawl of {}", seed))?;
    debug!("Following run {}", run_id);

    let progress_bar = show_progress_bars.then(spinner);
    let mut events = crawler.subscribe();

    let mut interrupts_open = true;
    let mut interrupt_count = 0u32;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(CrawlEvent::Log(entry)) => {
                    if let Some(ref callback) = progress_callback {
                        let line = format_log_entry(&entry);
                        match progress_bar {
                            Some(ref pb) => pb.suspend(|| callback(line)),
                            None => callback(line),
                        }
                    }
                }
                Some(CrawlEvent::Counters(counters)) => {
                    if let Some(ref pb) = progress_bar {
                        pb.set_message(progress_message(&counters));
                    }
                }
                Some(CrawlEvent::State(RunState::Idle)) | None => break,
                Some(_) => {}
            },
            interrupt = interrupts.recv(), if interrupts_open => match interrupt {
                Some(()) => {
                    interrupt_count += 1;
                    if interrupt_count == 1 {
                        crawler.stop();
                    } else {
                        warn!("Interrupted again, not waiting for in-flight requests");
                        break;
                    }
                }
                None => interrupts_open = false,
            },
        }
    }

    let snapshot = crawler.snapshot();

    if let Some(pb) = progress_bar {
        let verb = if interrupt_count > 0 { "stopped" } else { "complete" };
        pb.finish_with_message(format!(
            "Crawl {}! {} URLs processed",
            verb,
            snapshot.results.len()
        ));
    }

    Ok(snapshot)
}
