use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;
use weaver_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
use weaver_core::report::{ReportFormat, render_report, write_report};
use weaver_scanner::CrawlConfig;
use weaver_scanner::config::DEFAULT_MAX_DEPTH;

/// Diagnostics go to stderr so they never mix with a report on stdout.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build and validate a crawl config from the `crawl` subcommand's arguments
pub fn build_config(sub_matches: &ArgMatches) -> Result<CrawlConfig> {
    let url = sub_matches
        .get_one::<Url>("url")
        .context("--url must be provided")?;
    let depth = sub_matches
        .get_one::<u32>("depth")
        .copied()
        .unwrap_or(DEFAULT_MAX_DEPTH);
    let include_subdomains = sub_matches.get_flag("include-subdomains");

    let config = CrawlConfig::new(url.as_str())
        .with_max_depth(depth)
        .with_same_domain_only(!include_subdomains);
    config
        .validate()
        .with_context(|| format!("Invalid crawl target {}", url))?;

    Ok(config)
}

pub fn parse_format(sub_matches: &ArgMatches) -> ReportFormat {
    sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Expand a leading `~` to the user's home directory
pub fn expand_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Expand `raw` and give it the report format's extension if it has none
pub fn resolve_output_path(raw: &str, format: ReportFormat) -> PathBuf {
    let mut path = expand_output_path(raw);
    if path.extension().is_none() {
        path.set_extension(format.extension());
    }
    path
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_crawl_header(config: &CrawlConfig, timeout: Duration) {
    print_divider();
    println!(
        "{} Crawling {}",
        "→".blue().bold(),
        config.seed_url.bright_white()
    );
    println!(
        "  Max depth: {}",
        config.max_depth.to_string().cyan()
    );
    println!("  Scope: {}", config.scope_label().cyan());
    println!("  Timeout: {}s", timeout.as_secs().to_string().cyan());
    print_divider();
    println!();
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let config = build_config(sub_matches)?;
    let format = parse_format(sub_matches);
    let timeout = Duration::from_secs(*sub_matches.get_one::<u64>("timeout").unwrap_or(&10));
    let output = sub_matches
        .get_one::<String>("output")
        .map(|raw| resolve_output_path(raw, format));

    if !quiet {
        print_crawl_header(&config, timeout);
    }

    let options = CrawlOptions {
        config,
        timeout,
        show_progress_bars: !quiet,
    };

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{}", msg);
        }))
    };

    let snapshot = execute_crawl(options, progress_callback).await?;

    let report = render_report(&snapshot, format).context("Failed to render report")?;

    match output {
        Some(path) => {
            write_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!(
                    "\n{} Saved {} results to {}",
                    "✓".green().bold(),
                    snapshot.results.len(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => {
            if !quiet {
                println!();
            }
            print!("{}", report);
            if format != ReportFormat::Text {
                println!();
            }
        }
    }

    Ok(())
}
