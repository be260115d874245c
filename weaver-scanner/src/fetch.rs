use crate::error::Result;
use crate::result::FetchOutcome;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches one URL and reports its status and outbound links.
///
/// Implementations must bound their own latency and must not fail: network
/// errors are reported as a [`FetchOutcome`] with no status code. Returned
/// links must already be absolute.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

/// Pulls outbound links out of a response body.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, body: &str, base: &Url) -> Vec<String>;
}

/// Resolves `href` against `base`, skipping anchors and non-navigational schemes.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Extracts `<a href>` targets from HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &str, base: &Url) -> Vec<String> {
        let document = Html::parse_document(body);
        let Ok(link_selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(base, href))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl FetchSettings {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            connect_timeout: timeout / 2,
            ..Self::default()
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_redirects: 5,
            user_agent: concat!("Weaver/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default [`Fetcher`] backed by a pooled `reqwest` client.
pub struct HttpFetcher {
    client: Client,
    extractor: Arc<dyn LinkExtractor>,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent)
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .build()?;

        Ok(Self {
            client,
            extractor: Arc::new(HtmlLinkExtractor),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn fetch_and_parse(&self, url: &Url) -> std::result::Result<FetchOutcome, reqwest::Error> {
        debug!("Fetching {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        if !response.status().is_success() || !is_html {
            return Ok(FetchOutcome::new(status_code, Vec::new()));
        }

        // The status is already known; a truncated body only costs the links.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to read body of {}: {}", final_url, e);
                return Ok(FetchOutcome::new(status_code, Vec::new()));
            }
        };
        let links = self.extractor.extract(&body, &final_url);
        debug!("Found {} links on {}", links.len(), final_url);

        Ok(FetchOutcome::new(status_code, links))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        match self.fetch_and_parse(url).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_timeout() => FetchOutcome::with_error(format!("timed out: {}", e)),
            Err(e) => FetchOutcome::with_error(e.to_string()),
        }
    }
}
