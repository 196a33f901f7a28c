// Pipeline orchestration: archive -> assets -> extraction -> payloads -> dispatch

use crate::dispatch::{
    CompletionCallback, DispatchGate, DispatchSummary, DispatchTask, HttpMethod, HttpProber,
    MAX_CONCURRENT_REQUESTS, ParamPlacement, Prober,
};
use crate::payload::{ExpansionPolicy, FuzzValues, synthesize};
use jsfuzz_scanner::archive::WAYBACK_CDX_ENDPOINT;
use jsfuzz_scanner::client::DEFAULT_TIMEOUT_SECS;
use jsfuzz_scanner::{
    ArchiveResolver, AssetScanner, FetchCache, PatternTable, StaticExtractor, build_client,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Options for configuring a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub method: HttpMethod,
    pub param_placement: ParamPlacement,
    pub fuzz_values: FuzzValues,
    pub expansion: ExpansionPolicy,
    /// Join relative asset URLs onto their page and relative endpoints onto
    /// their asset before fetching or probing them. Off by default: mined
    /// URLs are used exactly as found.
    pub resolve_relative: bool,
    pub archive_endpoint: String,
    pub show_progress_bars: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            method: HttpMethod::Get,
            param_placement: ParamPlacement::Body,
            fuzz_values: FuzzValues::default(),
            expansion: ExpansionPolicy::Full,
            resolve_relative: false,
            archive_endpoint: WAYBACK_CDX_ENDPOINT.to_string(),
            show_progress_bars: false,
        }
    }
}

/// Counts gathered over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub domains: usize,
    pub pages: usize,
    pub assets: usize,
    pub endpoints: usize,
    pub parameters: usize,
    pub payloads: usize,
    pub dispatch: DispatchSummary,
}

pub struct Pipeline<P: Prober = HttpProber> {
    resolver: ArchiveResolver,
    scanner: AssetScanner,
    extractor: StaticExtractor,
    gate: DispatchGate<P>,
    config: PipelineConfig,
}

impl Pipeline<HttpProber> {
    pub fn new(config: PipelineConfig) -> Result<Self, String> {
        let client = build_client(config.request_timeout).map_err(|e| e.to_string())?;
        let prober = HttpProber::new(client.clone());
        Ok(Self::with_prober(config, client, prober))
    }
}

impl<P: Prober> Pipeline<P> {
    /// Build a pipeline around an explicit prober. Each pipeline owns fresh
    /// caches, so nothing is shared between runs.
    pub fn with_prober(config: PipelineConfig, client: Client, prober: P) -> Self {
        // Archive and page lookups both produce URL lists; typed keys keep the
        // two kinds apart in the one cache.
        let url_lists = Arc::new(FetchCache::new());
        let sources = Arc::new(FetchCache::new());

        let resolver = ArchiveResolver::new(client.clone(), url_lists.clone())
            .with_endpoint(config.archive_endpoint.clone());
        let scanner = AssetScanner::new(client.clone(), url_lists);
        let extractor = StaticExtractor::new(client, sources);
        let gate = DispatchGate::new(prober, config.max_concurrent_requests)
            .with_progress_bar(config.show_progress_bars);

        Self {
            resolver,
            scanner,
            extractor,
            gate,
            config,
        }
    }

    pub fn with_patterns(mut self, patterns: PatternTable) -> Self {
        self.extractor = self.extractor.with_patterns(patterns);
        self
    }

    pub fn with_completion_callback(mut self, callback: CompletionCallback) -> Self {
        self.gate = self.gate.with_completion_callback(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run discovery for every domain, then dispatch all resulting probes and
    /// wait for them. Discovery failures only empty their own branch.
    pub async fn run(&self, domains: &[String]) -> Result<RunSummary, String> {
        let (tasks, mut summary) = self.discover(domains).await;
        summary.dispatch = self.gate.dispatch(tasks).await?;
        Ok(summary)
    }

    /// Sequential discovery: domain, then page, then asset, in input order.
    pub async fn discover(&self, domains: &[String]) -> (Vec<DispatchTask>, RunSummary) {
        let mut summary = RunSummary::default();
        let mut tasks = Vec::new();

        for domain in domains.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            summary.domains += 1;
            info!("Resolving archived pages for {}", domain);

            let pages = self.resolver.archived_pages(domain).await;
            summary.pages += pages.len();

            for page in &pages {
                let assets = self.scanner.js_assets(page).await;
                summary.assets += assets.len();

                for asset in &assets {
                    let asset_url = self.resolve(page, asset);
                    let extraction = self.extractor.extract(&asset_url).await;
                    summary.endpoints += extraction.endpoints.len();
                    summary.parameters += extraction.parameters.len();

                    let endpoints: Vec<String> = extraction
                        .endpoints
                        .iter()
                        .map(|endpoint| self.resolve(&asset_url, endpoint))
                        .collect();

                    let payloads = synthesize(
                        &endpoints,
                        &extraction.parameters,
                        &self.config.fuzz_values,
                        self.config.expansion,
                    );
                    debug!("{}: {} payloads", asset_url, payloads.len());
                    summary.payloads += payloads.len();

                    tasks.extend(
                        payloads
                            .into_iter()
                            .map(|payload| {
                                DispatchTask::new(payload, self.config.method)
                                    .with_placement(self.config.param_placement)
                            }),
                    );
                }
            }
        }

        info!(
            "Discovery complete: {} pages, {} assets, {} payloads",
            summary.pages, summary.assets, summary.payloads
        );
        (tasks, summary)
    }

    fn resolve(&self, base: &str, reference: &str) -> String {
        if self.config.resolve_relative {
            resolve_url(base, reference)
        } else {
            reference.to_string()
        }
    }
}

/// Join `reference` onto `base`. Anything that does not resolve is returned
/// unchanged.
pub fn resolve_url(base: &str, reference: &str) -> String {
    Url::parse(base)
        .ok()
        .and_then(|base_url| base_url.join(reference).ok())
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|| reference.to_string())
}
