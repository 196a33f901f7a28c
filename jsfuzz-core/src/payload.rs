// Payload synthesis: the cross product of mined endpoints and parameters

use std::collections::BTreeMap;
use tracing::debug;

/// Value placed into every parameter when no wordlist is in use
pub const FUZZ_MARKER: &str = "FUZZ";

/// One probe target: an endpoint and a single parameter set to a fuzz value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
}

impl Payload {
    pub fn new(endpoint: &str, parameter: &str, value: &str) -> Self {
        let mut params = BTreeMap::new();
        params.insert(parameter.to_string(), value.to_string());
        Self {
            endpoint: endpoint.to_string(),
            params,
        }
    }
}

/// Where fuzz values come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzValues {
    /// A single fixed marker for every parameter
    Marker(String),
    /// Every word of a wordlist for every parameter
    Wordlist(Vec<String>),
}

impl FuzzValues {
    pub fn values(&self) -> &[String] {
        match self {
            FuzzValues::Marker(marker) => std::slice::from_ref(marker),
            FuzzValues::Wordlist(words) => words,
        }
    }
}

impl Default for FuzzValues {
    fn default() -> Self {
        FuzzValues::Marker(FUZZ_MARKER.to_string())
    }
}

/// How much of the cross product is kept for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionPolicy {
    /// Every combination
    #[default]
    Full,
    /// The first N combinations, in endpoint-major order
    Capped(usize),
}

impl ExpansionPolicy {
    pub fn limit(&self) -> usize {
        match self {
            ExpansionPolicy::Full => usize::MAX,
            ExpansionPolicy::Capped(max) => *max,
        }
    }
}

/// Number of payloads the full cross product would produce
pub fn expansion_size(endpoints: usize, parameters: usize, values: &FuzzValues) -> usize {
    endpoints
        .saturating_mul(parameters)
        .saturating_mul(values.values().len())
}

/// Pair every endpoint with every parameter and every fuzz value.
/// Duplicates in the inputs are kept; nothing is filtered.
pub fn synthesize(
    endpoints: &[String],
    parameters: &[String],
    values: &FuzzValues,
    policy: ExpansionPolicy,
) -> Vec<Payload> {
    let full = expansion_size(endpoints.len(), parameters.len(), values);
    let limit = policy.limit();
    if full > limit {
        debug!("Capping payload expansion at {} of {}", limit, full);
    }

    endpoints
        .iter()
        .flat_map(|endpoint| {
            parameters.iter().flat_map(move |parameter| {
                values
                    .values()
                    .iter()
                    .map(move |value| Payload::new(endpoint, parameter, value))
            })
        })
        .take(limit)
        .collect()
}
