use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a [`Fetcher`](crate::Fetcher) reports back for a single URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// `None` when no response was received at all.
    pub status_code: Option<u16>,
    /// Absolute outbound links, in document order.
    pub links: Vec<String>,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn new(status_code: u16, links: Vec<String>) -> Self {
        Self {
            status_code: Some(status_code),
            links,
            error: None,
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            status_code: None,
            links: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn classification(&self) -> Classification {
        Classification::of(self.status_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Any response below 400.
    Success,
    ClientError,
    ServerError,
    /// Timeout, DNS, connection refused and friends.
    FetchFailed,
}

impl Classification {
    pub fn of(status_code: Option<u16>) -> Self {
        match status_code {
            None => Classification::FetchFailed,
            Some(code) if code >= 500 => Classification::ServerError,
            Some(code) if code >= 400 => Classification::ClientError,
            Some(_) => Classification::Success,
        }
    }

    pub fn is_error(self) -> bool {
        !matches!(self, Classification::Success)
    }
}

/// One record per dequeued and fetched frontier item. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlResult {
    pub id: Uuid,
    pub url: String,
    pub status_code: Option<u16>,
    /// `None` for the seed.
    pub parent_url: Option<String>,
    pub depth: u32,
    pub timestamp: DateTime<Utc>,
}

impl UrlResult {
    pub fn classification(&self) -> Classification {
        Classification::of(self.status_code)
    }

    pub fn is_error(&self) -> bool {
        self.classification().is_error()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Pending frontier items.
    pub queued: usize,
    /// Results that completed with a status below 400.
    pub processed: usize,
    /// Results with status >= 400 or no status at all.
    pub errored: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Stopping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(Classification::of(Some(200)), Classification::Success);
        assert_eq!(Classification::of(Some(301)), Classification::Success);
        assert_eq!(Classification::of(Some(399)), Classification::Success);
        assert_eq!(Classification::of(Some(400)), Classification::ClientError);
        assert_eq!(Classification::of(Some(404)), Classification::ClientError);
        assert_eq!(Classification::of(Some(500)), Classification::ServerError);
        assert_eq!(Classification::of(Some(503)), Classification::ServerError);
        assert_eq!(Classification::of(None), Classification::FetchFailed);
    }

    #[test]
    fn test_with_error_has_no_status_or_links() {
        let outcome = FetchOutcome::with_error("connection refused");
        assert_eq!(outcome.status_code, None);
        assert!(outcome.links.is_empty());
        assert_eq!(outcome.classification(), Classification::FetchFailed);
    }

    #[test]
    fn test_url_result_serializes_camel_case() {
        let result = UrlResult {
            id: Uuid::nil(),
            url: "https://example.com/".to_string(),
            status_code: None,
            parent_url: None,
            depth: 1,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("statusCode").unwrap().is_null());
        assert!(json.get("parentUrl").unwrap().is_null());
        assert_eq!(json["depth"], 1);
    }
}
