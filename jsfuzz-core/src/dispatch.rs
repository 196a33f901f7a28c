// Bounded-concurrency probe dispatch

use crate::payload::Payload;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};

/// Default ceiling on simultaneously in-flight probes
pub const MAX_CONCURRENT_REQUESTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }

    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(format!("Unsupported HTTP method '{}'", other)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a probe carries its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamPlacement {
    /// Form-encoded request body, whatever the method
    #[default]
    Body,
    /// URL query string, no body
    Query,
}

/// A payload bound to the method it is sent with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTask {
    pub payload: Payload,
    pub method: HttpMethod,
    pub placement: ParamPlacement,
}

impl DispatchTask {
    pub fn new(payload: Payload, method: HttpMethod) -> Self {
        Self {
            payload,
            method,
            placement: ParamPlacement::Body,
        }
    }

    pub fn with_placement(mut self, placement: ParamPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Form body sent with the request. GET carries one too unless the
    /// parameters were moved to the query string.
    pub fn body(&self) -> Option<&BTreeMap<String, String>> {
        match self.placement {
            ParamPlacement::Body => Some(&self.payload.params),
            ParamPlacement::Query => None,
        }
    }

    pub fn query(&self) -> Option<&BTreeMap<String, String>> {
        match self.placement {
            ParamPlacement::Body => None,
            ParamPlacement::Query => Some(&self.payload.params),
        }
    }
}

/// How a probe ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A response arrived with this status
    Status(u16),
    /// The request hit the per-request timeout
    Timeout,
    /// Connection, DNS, TLS or URL error
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Status(100..=399))
    }
}

/// Emitted once per finished task
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub endpoint: String,
    pub method: HttpMethod,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

/// Callback invoked as each task finishes
pub type CompletionCallback = Arc<dyn Fn(ProbeReport) + Send + Sync>;

/// Sends one probe. Implementations must not panic on transport errors;
/// every failure is reported through [`ProbeOutcome`].
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, task: &DispatchTask) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Issues probes over HTTP and discards the response body
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Prober for HttpProber {
    fn probe(&self, task: &DispatchTask) -> impl Future<Output = ProbeOutcome> + Send {
        async move {
            let mut request = self
                .client
                .request(task.method.as_reqwest(), task.payload.endpoint.as_str());

            if let Some(body) = task.body() {
                request = request.form(body);
            }
            if let Some(query) = task.query() {
                request = request.query(query);
            }

            match request.send().await {
                Ok(response) => ProbeOutcome::Status(response.status().as_u16()),
                Err(e) if e.is_timeout() => ProbeOutcome::Timeout,
                Err(e) => ProbeOutcome::Failed(e.to_string()),
            }
        }
    }
}

/// Aggregate completion counts for one dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub submitted: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub http_errors: usize,
    pub timeouts: usize,
    pub failed: usize,
    pub by_status: BTreeMap<u16, usize>,
}

impl DispatchSummary {
    fn record(&mut self, outcome: &ProbeOutcome) {
        self.completed += 1;
        match outcome {
            ProbeOutcome::Status(code) => {
                *self.by_status.entry(*code).or_insert(0) += 1;
                if outcome.is_success() {
                    self.succeeded += 1;
                } else {
                    self.http_errors += 1;
                }
            }
            ProbeOutcome::Timeout => self.timeouts += 1,
            ProbeOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Runs every submitted task while keeping at most `capacity` unresolved.
pub struct DispatchGate<P: Prober = HttpProber> {
    prober: Arc<P>,
    capacity: usize,
    completion_callback: Option<CompletionCallback>,
    show_progress_bar: bool,
}

impl<P: Prober> DispatchGate<P> {
    pub fn new(prober: P, capacity: usize) -> Self {
        Self {
            prober: Arc::new(prober),
            capacity: capacity.max(1),
            completion_callback: None,
            show_progress_bar: false,
        }
    }

    pub fn with_completion_callback(mut self, callback: CompletionCallback) -> Self {
        self.completion_callback = Some(callback);
        self
    }

    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Dispatch all `tasks` and wait for every one of them. A slot is taken
    /// before each task is spawned, so submission stalls while the gate is
    /// full; the slot is returned when the task ends, whatever its outcome.
    pub async fn dispatch(&self, tasks: Vec<DispatchTask>) -> Result<DispatchSummary, String> {
        let total = tasks.len();
        if total == 0 {
            return Ok(DispatchSummary::default());
        }

        info!("Dispatching {} probes with {} in flight at most", total, self.capacity);

        let progress_bar = if self.show_progress_bar {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {pos}/{len} probes {msg}")
                    .map_err(|e| format!("Invalid progress template: {}", e))?
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let semaphore = Arc::new(Semaphore::new(self.capacity));
        let summary = Arc::new(Mutex::new(DispatchSummary {
            submitted: total,
            ..Default::default()
        }));

        let mut handles = Vec::with_capacity(total);

        for task in tasks {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| format!("Dispatch gate closed: {}", e))?;

            let prober = self.prober.clone();
            let callback = self.completion_callback.clone();
            let summary = summary.clone();
            let pb = progress_bar.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;

                let start = Instant::now();
                let outcome = prober.probe(&task).await;
                let elapsed = start.elapsed();

                debug!(
                    "{} {} -> {:?} in {:?}",
                    task.method, task.payload.endpoint, outcome, elapsed
                );

                summary.lock().await.record(&outcome);

                if let Some(ref pb) = pb {
                    pb.inc(1);
                }

                if let Some(callback) = callback {
                    callback(ProbeReport {
                        endpoint: task.payload.endpoint,
                        method: task.method,
                        outcome,
                        elapsed,
                    });
                }
            }));
        }

        // Join everything before reporting a failed task so no probe is left running.
        let joined = futures::future::join_all(handles).await;

        if let Some(ref pb) = progress_bar {
            pb.finish_with_message("done");
        }

        for result in joined {
            result.map_err(|e| format!("Probe task failed: {}", e))?;
        }

        let summary = summary.lock().await.clone();
        info!(
            "Dispatch complete: {}/{} probes resolved",
            summary.completed, summary.submitted
        );
        Ok(summary)
    }
}
