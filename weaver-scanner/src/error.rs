use thiserror::Error;

/// Reasons a [`CrawlConfig`](crate::CrawlConfig) is rejected before a run starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Seed URL is empty")]
    EmptySeed,

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeedUrl { url: String, reason: String },

    #[error("Unsupported scheme '{0}' (only http and https can be crawled)")]
    UnsupportedScheme(String),

    #[error("Seed URL has no host: {0}")]
    MissingHost(String),

    #[error("Max depth {depth} is outside the allowed range {min}..={max}")]
    DepthOutOfRange { depth: u32, min: u32, max: u32 },
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid crawl configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error("No async runtime available to drive the crawl")]
    NoRuntime,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
