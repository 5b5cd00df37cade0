//! Remote hybrid sampler client
//!
//! Blocking HTTP adapter for a hybrid sampling service. The model is
//! shipped as explicit JSON (member-id lists, linear array, quadratic
//! triples, offset) so the remote side needs no shared types. The
//! request carries a hard timeout; every failure mode surfaces as a
//! typed [`SamplerError`] for the caller to handle.

use std::time::Duration;

use constellation_qubo::QuadraticBinaryModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Result, SampleRecord, SampleSet, Sampler, SamplerError};

/// Default end-to-end request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HybridConfig {
    /// Sampling endpoint, e.g. `https://solver.example.com/v1/sample`
    pub endpoint: String,
    /// Hard deadline for the whole request
    pub timeout: Duration,
    /// Bearer token, if the service requires one
    pub auth_token: Option<String>,
    /// Free-form label echoed into service-side run tracking
    pub label: String,
}

impl HybridConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            auth_token: None,
            label: "constellation-planner".to_string(),
        }
    }
}

/// Wire form of a [`QuadraticBinaryModel`]: variable i is the list of
/// its member satellite ids; quadratic terms are `(i, j, weight)` with
/// `i < j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireModel {
    pub variables: Vec<Vec<usize>>,
    pub linear: Vec<f64>,
    pub quadratic: Vec<(usize, usize, f64)>,
    pub offset: f64,
}

impl WireModel {
    pub fn from_model(model: &QuadraticBinaryModel) -> Self {
        let mut quadratic: Vec<(usize, usize, f64)> = model
            .quadratic_terms()
            .map(|((i, j), w)| (i, j, w))
            .collect();
        quadratic.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        Self {
            variables: model
                .variables()
                .iter()
                .map(|c| c.members().collect())
                .collect(),
            linear: model.linear().to_vec(),
            quadratic,
            offset: model.offset(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    label: &'a str,
    model: WireModel,
}

#[derive(Debug, Deserialize)]
struct WireSample {
    /// 0/1 per variable, arena order
    assignment: Vec<u8>,
    energy: f64,
    #[serde(default)]
    occurrences: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    samples: Vec<WireSample>,
}

fn into_sample_set(response: WireResponse, num_vars: usize) -> Result<SampleSet> {
    let mut records = Vec::with_capacity(response.samples.len());
    for sample in response.samples {
        if sample.assignment.len() != num_vars {
            return Err(SamplerError::AssignmentMismatch(
                sample.assignment.len(),
                num_vars,
            ));
        }
        records.push(SampleRecord {
            assignment: sample.assignment.into_iter().map(|v| v != 0).collect(),
            energy: sample.energy,
            occurrences: sample.occurrences.unwrap_or(1),
        });
    }
    Ok(SampleSet::new(records).aggregate())
}

/// Client for the remote hybrid sampling service
pub struct HybridClient {
    config: HybridConfig,
}

impl HybridClient {
    pub fn new(config: HybridConfig) -> Self {
        Self { config }
    }
}

impl Sampler for HybridClient {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn sample(&self, model: &QuadraticBinaryModel) -> Result<SampleSet> {
        if model.is_empty() {
            return Err(SamplerError::EmptyModel);
        }

        let wire = WireModel::from_model(model);
        debug!(
            variables = wire.variables.len(),
            quadratic = wire.quadratic.len(),
            "submitting model to hybrid sampler"
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| SamplerError::Transport(e.to_string()))?;

        let mut request = client.post(&self.config.endpoint).json(&WireRequest {
            label: &self.config.label,
            model: wire,
        });
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                SamplerError::Timeout
            } else {
                SamplerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SamplerError::Status(status.as_u16()));
        }

        let parsed: WireResponse = response
            .json()
            .map_err(|e| SamplerError::MalformedResponse(e.to_string()))?;

        info!(samples = parsed.samples.len(), "hybrid sampler responded");
        into_sample_set(parsed, model.num_variables())
    }
}
