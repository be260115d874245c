use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 10;
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Maximum number of fetches in flight at once.
pub const DEFAULT_WORKERS: usize = 4;

/// Input for a single crawl run. Immutable once the run has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlConfig {
    pub seed_url: String,
    pub max_depth: u32,
    pub same_domain_only: bool,
}

impl CrawlConfig {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            same_domain_only: true,
        }
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_same_domain_only(mut self, same_domain_only: bool) -> Self {
        self.same_domain_only = same_domain_only;
        self
    }

    /// Checks the depth bounds and parses the seed, returning it as an absolute URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.max_depth) {
            return Err(ConfigError::DepthOutOfRange {
                depth: self.max_depth,
                min: MIN_DEPTH,
                max: MAX_DEPTH,
            });
        }

        let raw = self.seed_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::EmptySeed);
        }

        let seed = Url::parse(raw).map_err(|e| ConfigError::InvalidSeedUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(ConfigError::UnsupportedScheme(seed.scheme().to_string()));
        }
        if seed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingHost(raw.to_string()));
        }

        Ok(seed)
    }

    pub fn scope_label(&self) -> &'static str {
        if self.same_domain_only {
            "same domain only"
        } else {
            "including subdomains"
        }
    }
}
