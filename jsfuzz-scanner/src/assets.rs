use crate::cache::{CacheKey, FetchCache};
use crate::client::fetch_text;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lists the JavaScript files a page pulls in through `<script src>`.
pub struct AssetScanner {
    client: Client,
    cache: Arc<FetchCache<Vec<String>>>,
}

impl AssetScanner {
    pub fn new(client: Client, cache: Arc<FetchCache<Vec<String>>>) -> Self {
        Self { client, cache }
    }

    /// Script sources referenced by `page_url`, as written in the page.
    /// Fetch failures are logged and produce an empty list.
    pub async fn js_assets(&self, page_url: &str) -> Vec<String> {
        self.cache
            .get_or_fetch(CacheKey::page(page_url), || async {
                match fetch_text(&self.client, page_url).await {
                    Ok(html) => {
                        let assets = script_sources(&html);
                        debug!("{} references {} scripts", page_url, assets.len());
                        assets
                    }
                    Err(e) => {
                        warn!("Failed to retrieve JavaScript files from URL {}: {}", page_url, e);
                        Vec::new()
                    }
                }
            })
            .await
    }
}

/// `src` values of every `<script>` element that end in `.js`, in document
/// order. The suffix check is case-sensitive and no URL is resolved.
pub fn script_sources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse("script[src]").expect("static selector");

    document
        .select(&script_selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| src.ends_with(".js"))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_client;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[test]
    fn test_script_sources_filters_on_js_suffix() {
        let html = r#"<html><head>
            <script src="a.js"></script>
            <script src="b.css"></script>
            <script src="c.JS"></script>
            <script src="https://x.com/d.js"></script>
        </head></html>"#;

        assert_eq!(script_sources(html), vec!["a.js", "https://x.com/d.js"]);
    }

    #[test]
    fn test_script_sources_ignores_inline_and_other_tags() {
        let html = r#"<html><body>
            <script>var inline = "/api/x.js";</script>
            <link href="/style.js" rel="preload">
            <img src="/pixel.js">
            <script type="module" src="/static/main.js"></script>
        </body></html>"#;

        assert_eq!(script_sources(html), vec!["/static/main.js"]);
    }

    #[tokio::test]
    async fn test_js_assets_fetches_each_page_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(r#"<script src="/app.js"></script>"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let scanner = AssetScanner::new(client, Arc::new(FetchCache::new()));
        let page = format!("{}/index.html", server.uri());

        assert_eq!(scanner.js_assets(&page).await, vec!["/app.js"]);
        assert_eq!(scanner.js_assets(&page).await, vec!["/app.js"]);
    }

    #[tokio::test]
    async fn test_js_assets_non_success_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let scanner = AssetScanner::new(client, Arc::new(FetchCache::new()));

        assert!(scanner.js_assets(&format!("{}/gone", server.uri())).await.is_empty());
    }
}
