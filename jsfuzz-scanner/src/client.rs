use crate::error::{Result, ScanError};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = "jsfuzz/0.1";

/// Build the shared HTTP client used by every discovery stage and by the prober.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ScanError::Other(format!("Failed to create HTTP client: {}", e)))
}

/// GET `url` and return the body, treating any non-2xx status as an error.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    fetch_status(client.get(url), url).await
}

/// Send a prepared request and return the body of a 2xx response.
pub(crate) async fn fetch_status(request: RequestBuilder, url: &str) -> Result<String> {
    debug!("Fetching {}", url);

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.text().await?)
}
