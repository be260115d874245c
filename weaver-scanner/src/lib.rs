pub mod aggregator;
pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod result;
pub mod scope;
pub mod stream;

pub use config::CrawlConfig;
pub use crawler::Crawler;
pub use error::{ConfigError, CrawlError};
pub use fetch::{FetchSettings, Fetcher, HtmlLinkExtractor, HttpFetcher, LinkExtractor};
pub use frontier::{Frontier, FrontierItem};
pub use result::{FetchOutcome, LogEntry, RunCounters, RunState, Severity, UrlResult};
pub use scope::{ScopeFilter, is_in_scope};
pub use stream::{CrawlEvent, EventStream, RunId, StreamSnapshot};
