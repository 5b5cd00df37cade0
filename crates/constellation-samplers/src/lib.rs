//! Constellation Sampler Adapters
//!
//! The model core treats every solver as a black box behind [`Sampler`]:
//! hand over a [`QuadraticBinaryModel`], get back a set of assignments
//! with energies, keep the lowest. Two adapters are provided: a local
//! simulated annealer for small instances and a client for a remote
//! hybrid sampling service for large ones. Retry and backoff policy, if
//! any, belongs to the caller.

use constellation_qubo::QuadraticBinaryModel;
use thiserror::Error;

pub mod anneal;
pub mod hybrid;

pub use anneal::SimulatedAnnealer;
pub use hybrid::{HybridClient, HybridConfig};

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("model has no variables; no candidate met the score threshold")]
    EmptyModel,
    #[error("request to hybrid sampler timed out")]
    Timeout,
    #[error("transport failure talking to hybrid sampler: {0}")]
    Transport(String),
    #[error("hybrid sampler returned HTTP {0}")]
    Status(u16),
    #[error("hybrid sampler response malformed: {0}")]
    MalformedResponse(String),
    #[error("sampler returned an assignment of {0} variables, model has {1}")]
    AssignmentMismatch(usize, usize),
}

pub type Result<T> = std::result::Result<T, SamplerError>;

/// One candidate solution from a sampler
#[derive(Debug, Clone)]
pub struct SampleRecord {
    /// 0/1 value per model variable, in arena order
    pub assignment: Vec<bool>,
    pub energy: f64,
    /// How many reads produced this exact assignment
    pub occurrences: u32,
}

/// All assignments returned by one sampling call
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    records: Vec<SampleRecord>,
}

impl SampleSet {
    pub fn new(records: Vec<SampleRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Merge identical assignments, summing occurrences, and order by
    /// ascending energy. Stochastic samplers rediscover the same ground
    /// state many times over repeated reads.
    pub fn aggregate(mut self) -> Self {
        self.records
            .sort_by(|a, b| match a.energy.partial_cmp(&b.energy) {
                Some(ord) => ord.then_with(|| a.assignment.cmp(&b.assignment)),
                None => std::cmp::Ordering::Equal,
            });
        let mut merged: Vec<SampleRecord> = Vec::new();
        for record in self.records {
            match merged.last_mut() {
                Some(last) if last.assignment == record.assignment => {
                    last.occurrences += record.occurrences;
                }
                _ => merged.push(record),
            }
        }
        Self { records: merged }
    }

    /// Lowest-energy record, if any
    pub fn best(&self) -> Option<&SampleRecord> {
        self.records
            .iter()
            .min_by(|a, b| match a.energy.partial_cmp(&b.energy) {
                Some(ord) => ord,
                None => std::cmp::Ordering::Equal,
            })
    }
}

/// A black-box solver for quadratic binary models.
///
/// `sample` blocks until the backend produces assignments or fails;
/// failures (including timeouts) surface as typed [`SamplerError`]s,
/// never as silent fallbacks.
pub trait Sampler {
    fn name(&self) -> &str;

    fn sample(&self, model: &QuadraticBinaryModel) -> Result<SampleSet>;
}
