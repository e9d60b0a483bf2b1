//! HTTP client for the WaniKani v2 API.

use reqwest::Client;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use wkstats_types::{Snapshot, StageTotals};

/// Default WaniKani API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.wanikani.com";

/// API revision sent with every request.
const WANIKANI_REVISION: &str = "20170710";

/// Request timeout for each API call.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Error type for WaniKani API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API host could not be reached.
    #[error("WaniKani not reachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("WaniKani returned HTTP {status}")]
    Status { status: u16 },

    /// The response body did not match the expected shape.
    #[error("Unexpected WaniKani response: {0}")]
    Malformed(String),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP transport failure after the request was accepted.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl Error {
    /// Whether this error came from the upstream API (unreachable or
    /// non-success status) rather than from parsing or configuration.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Unreachable { .. } | Error::Status { .. } | Error::Request(_)
        )
    }
}

/// Result type for WaniKani API operations.
pub type Result<T> = std::result::Result<T, Error>;

// ==========================================================================
// Response Types
// ==========================================================================

/// One page of the `/v2/assignments` collection.
#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentsPage {
    pub pages: PageInfo,
    pub data: Vec<Assignment>,
}

/// Pagination cursor; `next_url` is absent on the last page.
#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    pub next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Assignment {
    pub data: AssignmentData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentData {
    pub srs_stage: u8,
}

/// The `/v2/user` response.
#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub data: UserData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub level: u32,
}

// ==========================================================================
// WaniKaniClient Implementation
// ==========================================================================

/// Client for the WaniKani v2 API.
///
/// Fetching is idempotent and has no side effects beyond the outbound
/// requests; two calls yield two independent snapshots.
///
/// # Example
///
/// ```no_run
/// use wkstats_client::{WaniKaniClient, DEFAULT_BASE_URL};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WaniKaniClient::new("my-api-key", DEFAULT_BASE_URL)?;
/// let snapshot = client.fetch_snapshot().await?;
/// println!("Level {} with {} burned items", snapshot.level, snapshot.stages.burned);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WaniKaniClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WaniKaniClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Personal access token, sent as a bearer credential
    /// * `base_url` - API base URL (see [`DEFAULT_BASE_URL`])
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Request)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current SRS stage totals and user level as one snapshot.
    ///
    /// Pages through `/v2/assignments`, counting each assignment's
    /// `srs_stage` into the named buckets, then reads the user level
    /// from `/v2/user`. The snapshot's date is today in UTC.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let totals = self.fetch_stage_totals().await?;
        let level = self.fetch_user_level().await?;

        let now = OffsetDateTime::now_utc();
        Ok(Snapshot {
            date: now.date(),
            stages: totals,
            level,
            recorded_at: now,
        })
    }

    /// Accumulate per-stage counts across all assignment pages.
    async fn fetch_stage_totals(&self) -> Result<StageTotals> {
        let mut totals = StageTotals::default();
        let mut next_url = Some(format!("{}/v2/assignments", self.base_url));

        while let Some(url) = next_url {
            debug!("Fetching assignments page: {}", url);
            let page: AssignmentsPage = self.get_json(&url).await?;

            for assignment in &page.data {
                totals.record_stage_number(assignment.data.srs_stage);
            }

            next_url = page.pages.next_url;
        }

        debug!(
            "Assignment totals: apprentice={} guru={} master={} enlightened={} burned={}",
            totals.apprentice, totals.guru, totals.master, totals.enlightened, totals.burned
        );

        Ok(totals)
    }

    /// Fetch the user's current level.
    async fn fetch_user_level(&self) -> Result<u32> {
        let url = format!("{}/v2/user", self.base_url);
        let user: UserResponse = self.get_json(&url).await?;

        if user.data.level == 0 {
            return Err(Error::Malformed("user level must be positive".to_string()));
        }

        Ok(user.data.level)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Wanikani-Revision", WANIKANI_REVISION)
            .send()
            .await
            .map_err(|e| Error::Unreachable {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = WaniKaniClient::new("key", "not-a-url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_new_normalizes_trailing_slash() {
        let client = WaniKaniClient::new("key", "https://api.wanikani.com/").unwrap();
        assert_eq!(client.base_url(), "https://api.wanikani.com");
    }

    #[test]
    fn test_assignments_page_parsing() {
        let json = r#"{
            "object": "collection",
            "pages": {
                "per_page": 500,
                "next_url": "https://api.wanikani.com/v2/assignments?page_after_id=80469434",
                "previous_url": null
            },
            "total_count": 1600,
            "data": [
                { "id": 80463006, "object": "assignment", "data": { "srs_stage": 8, "subject_id": 8761 } },
                { "id": 80463007, "object": "assignment", "data": { "srs_stage": 2, "subject_id": 8762 } }
            ]
        }"#;

        let page: AssignmentsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].data.srs_stage, 8);
        assert!(page.pages.next_url.is_some());
    }

    #[test]
    fn test_last_page_has_no_next_url() {
        let json = r#"{"pages": {"next_url": null}, "data": []}"#;
        let page: AssignmentsPage = serde_json::from_str(json).unwrap();
        assert!(page.pages.next_url.is_none());
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_user_response_parsing() {
        let json = r#"{
            "object": "user",
            "data": { "level": 23, "username": "example_user" }
        }"#;

        let user: UserResponse = serde_json::from_str(json).unwrap();
        assert_eq!(user.data.level, 23);
    }

    #[test]
    fn test_malformed_body_is_not_an_upstream_error() {
        let err = Error::Malformed("missing field `data`".to_string());
        assert!(!err.is_upstream());
        assert!(Error::Status { status: 500 }.is_upstream());
    }

    #[tokio::test]
    async fn test_fetch_against_unreachable_host() {
        // Port 9 (discard) is never listening locally.
        let client = WaniKaniClient::new("key", "http://127.0.0.1:9").unwrap();
        let result = client.fetch_snapshot().await;

        match result {
            Err(Error::Unreachable { url, .. }) => {
                assert!(url.contains("/v2/assignments"));
            }
            other => panic!("expected Unreachable, got {:?}", other.map(|_| ())),
        }
    }
}
