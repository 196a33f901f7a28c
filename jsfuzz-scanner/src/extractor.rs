//! Static endpoint and parameter mining over JavaScript source.
//!
//! Each asset is fetched once. Both passes run over the same text, so a fetch
//! failure empties both result lists together.

use crate::cache::{CacheKey, FetchCache};
use crate::client::fetch_text;
use crate::error::Result;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};

/// Quoted string literals that look like URLs or absolute paths.
pub const ENDPOINT_PATTERNS: &[&str] = &[
    r#""(https?://.*?)""#,
    r#""(http?://.*?)""#,
    r#""(/.*?)""#,
    r#"'(https?://.*?)'"#,
    r#"'(/.*?)'"#,
    r#""(//.*?)""#,
];

/// Identifiers used as object keys, named function expressions, and function
/// signatures. The trailing context is matched but sits outside the capture.
pub const PARAMETER_PATTERNS: &[&str] = &[
    r"(\w+):",
    r"\b(\w+)\b\s*=\s*function\(\)",
    r"\b(\w+)\b\s*:\s*function\(\)",
    r"function\s*\w+\s*\(([\w,\s]+)\)",
];

/// Endpoints and parameters mined from one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub endpoints: Vec<String>,
    pub parameters: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.parameters.is_empty()
    }
}

/// Ordered regular expressions for the two extraction passes.
#[derive(Debug, Clone)]
pub struct PatternTable {
    endpoints: Vec<Regex>,
    parameters: Vec<Regex>,
}

impl PatternTable {
    pub fn new(endpoints: &[&str], parameters: &[&str]) -> Result<Self> {
        Ok(Self {
            endpoints: compile(endpoints)?,
            parameters: compile(parameters)?,
        })
    }

    /// Every first-group match of every endpoint pattern, in pattern order.
    pub fn extract_endpoints(&self, source: &str) -> Vec<String> {
        self.endpoints
            .iter()
            .flat_map(|pattern| captures(pattern, source))
            .map(String::from)
            .collect()
    }

    /// Every first-group match of every parameter pattern, in pattern order.
    /// A capture holding a comma-separated argument list yields each name.
    pub fn extract_parameters(&self, source: &str) -> Vec<String> {
        self.parameters
            .iter()
            .flat_map(|pattern| captures(pattern, source))
            .flat_map(|capture| capture.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn extract(&self, source: &str) -> Extraction {
        Extraction {
            endpoints: self.extract_endpoints(source),
            parameters: self.extract_parameters(source),
        }
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::new(ENDPOINT_PATTERNS, PARAMETER_PATTERNS).expect("built-in patterns compile")
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).map_err(Into::into))
        .collect()
}

fn captures<'s>(pattern: &Regex, source: &'s str) -> Vec<&'s str> {
    pattern
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

pub struct StaticExtractor {
    client: Client,
    patterns: Arc<PatternTable>,
    cache: Arc<FetchCache<Extraction>>,
}

impl StaticExtractor {
    pub fn new(client: Client, cache: Arc<FetchCache<Extraction>>) -> Self {
        Self {
            client,
            patterns: Arc::new(PatternTable::default()),
            cache,
        }
    }

    pub fn with_patterns(mut self, patterns: PatternTable) -> Self {
        self.patterns = Arc::new(patterns);
        self
    }

    /// Fetch `asset_url` (at most once per run) and mine it.
    pub async fn extract(&self, asset_url: &str) -> Extraction {
        self.cache
            .get_or_fetch(CacheKey::asset(asset_url), || async {
                match fetch_text(&self.client, asset_url).await {
                    Ok(source) => {
                        let extraction = self.patterns.extract(&source);
                        debug!(
                            "{}: {} endpoints, {} parameters",
                            asset_url,
                            extraction.endpoints.len(),
                            extraction.parameters.len()
                        );
                        extraction
                    }
                    Err(e) => {
                        warn!("Failed to retrieve JavaScript code from URL {}: {}", asset_url, e);
                        Extraction::default()
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_client;
    use crate::error::ScanError;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const SOURCE: &str = r#"
        const users = fetch("/api/users");
        const orders = fetch('/api/orders');
        function f(id, name) { return id + name; }
    "#;

    #[test]
    fn test_quoted_paths_are_endpoints() {
        let table = PatternTable::default();
        assert_eq!(table.extract_endpoints(SOURCE), vec!["/api/users", "/api/orders"]);
    }

    #[test]
    fn test_function_signature_yields_each_argument() {
        let table = PatternTable::default();
        let parameters = table.extract_parameters(SOURCE);
        assert!(parameters.contains(&"id".to_string()));
        assert!(parameters.contains(&"name".to_string()));
    }

    #[test]
    fn test_endpoint_matches_keep_pattern_order_and_duplicates() {
        let table = PatternTable::default();
        let source = r#"a("http://api.example.com/v1"); b("/x"); c("/x");"#;

        // A plain http URL matches both of the first two patterns.
        assert_eq!(
            table.extract_endpoints(source),
            vec![
                "http://api.example.com/v1",
                "http://api.example.com/v1",
                "/x",
                "/x"
            ]
        );
    }

    #[test]
    fn test_object_keys_and_named_functions() {
        let table = PatternTable::default();
        let source = "var cfg = { token: 1 }; handler = function() {}; obj = { run: function() {} };";

        assert_eq!(
            table.extract_parameters(source),
            vec!["token", "run", "handler", "run"]
        );
    }

    #[test]
    fn test_custom_table() {
        let table = PatternTable::new(&[r"fetch\(`([^`]+)`\)"], &[r"data-(\w+)"]).unwrap();
        let extraction = table.extract("fetch(`/graphql`); data-user data-role");

        assert_eq!(extraction.endpoints, vec!["/graphql"]);
        assert_eq!(extraction.parameters, vec!["user", "role"]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = PatternTable::new(&["(unclosed"], &[]);
        assert!(matches!(result, Err(ScanError::Pattern(_))));
    }

    #[tokio::test]
    async fn test_extract_fetches_asset_once_and_is_deterministic() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/static/app.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/javascript")
                    .set_body_string(SOURCE),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let extractor = StaticExtractor::new(client, Arc::new(FetchCache::new()));
        let url = format!("{}/static/app.js", server.uri());

        let first = extractor.extract(&url).await;
        let second = extractor.extract(&url).await;

        assert_eq!(first, second);
        assert_eq!(first.endpoints, vec!["/api/users", "/api/orders"]);
        assert_eq!(first.parameters, vec!["id", "name"]);
    }

    #[tokio::test]
    async fn test_extract_failure_empties_both_passes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broken.js"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let extractor = StaticExtractor::new(client, Arc::new(FetchCache::new()));

        let extraction = extractor.extract(&format!("{}/broken.js", server.uri())).await;
        assert!(extraction.is_empty());
    }
}
