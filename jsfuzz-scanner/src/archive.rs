use crate::cache::{CacheKey, FetchCache};
use crate::client::fetch_status;
use crate::error::{Result, ScanError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const WAYBACK_CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

// The CDX index is slow for large domains.
const ARCHIVE_TIMEOUT_SECS: u64 = 60;

/// Lists the historical URLs an archive index knows for a domain.
pub struct ArchiveResolver {
    client: Client,
    endpoint: String,
    cache: Arc<FetchCache<Vec<String>>>,
}

impl ArchiveResolver {
    pub fn new(client: Client, cache: Arc<FetchCache<Vec<String>>>) -> Self {
        Self {
            client,
            endpoint: WAYBACK_CDX_ENDPOINT.to_string(),
            cache,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Archived URLs for `domain`, in index order. A failed query is logged and
    /// yields an empty list; the empty result is cached like any other.
    pub async fn archived_pages(&self, domain: &str) -> Vec<String> {
        self.cache
            .get_or_fetch(CacheKey::domain(domain), || async {
                match self.query(domain).await {
                    Ok(pages) => {
                        info!("Archive lists {} pages for {}", pages.len(), domain);
                        pages
                    }
                    Err(e) => {
                        warn!("Failed to retrieve archived pages for domain {}: {}", domain, e);
                        Vec::new()
                    }
                }
            })
            .await
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>> {
        debug!("Querying archive index {} for {}", self.endpoint, domain);

        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", self.endpoint, e)))?;

        let pattern = format!("{}/*", domain);
        let request = self
            .client
            .get(endpoint)
            .query(&[
                ("url", pattern.as_str()),
                ("output", "json"),
                ("collapse", "urlkey"),
            ])
            .timeout(Duration::from_secs(ARCHIVE_TIMEOUT_SECS));

        let body = fetch_status(request, &self.endpoint).await?;
        parse_cdx(&body)
    }
}

/// Parse a CDX `output=json` body: an array of records whose third field is
/// the archived URL. The header record and short records are skipped.
pub fn parse_cdx(body: &str) -> Result<Vec<String>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| ScanError::ParseError(format!("Malformed CDX response: {}", e)))?;

    let pages = records
        .into_iter()
        .enumerate()
        .filter(|(idx, record)| !(*idx == 0 && is_header(record)))
        .filter_map(|(_, mut record)| {
            if record.len() > 2 {
                Some(record.swap_remove(2))
            } else {
                None
            }
        })
        .collect();

    Ok(pages)
}

fn is_header(record: &[String]) -> bool {
    record.first().map(String::as_str) == Some("urlkey")
        && record.get(2).map(String::as_str) == Some("original")
}
