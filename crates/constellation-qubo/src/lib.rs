//! Constellation QUBO Library
//!
//! Encodes the satellite-to-constellation partitioning problem as a
//! quadratic unconstrained binary optimization (QUBO) model. We wish to
//! divide m satellites into k disjoint constellations of m/k satellites
//! each, maximizing the summed per-constellation coverage score.
//!
//! Each size-k subset of the satellite universe that clears a score
//! threshold becomes one binary variable. The assembled model combines:
//!
//! - a linear bias of minus the coverage score per variable (the sampler
//!   minimizes energy, so higher score means more favorable),
//! - a fixed quadratic penalty on every pair of variables that share a
//!   satellite, large enough that true minima never co-select them,
//! - the quadratic expansion of `strength * (sum(x) - T)^2`, forcing
//!   exactly T variables on at the minimum-energy point.
//!
//! Solving is out of scope here: the model is handed to an external
//! sampler and the winning assignment comes back for reporting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod enumerate;
pub mod model;
pub mod report;
pub mod score;

pub use enumerate::{combination_count, Combinations};
pub use model::{BuildConfig, ModelBuilder, QuadraticBinaryModel};
pub use report::{SelectionReport, SelectedConstellation};
pub use score::ScoreStrategy;

/// Score threshold below which candidates are discarded (inclusive keep)
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.4;

/// Quadratic penalty for a pair of candidates sharing a satellite.
/// Each linear bias is at most 1 in magnitude, so 2.0 always outweighs
/// the combined benefit of selecting two overlapping candidates.
pub const DEFAULT_OVERLAP_WEIGHT: f64 = 2.0;

/// Strength of the exactly-T cardinality constraint
pub const DEFAULT_CARDINALITY_STRENGTH: f64 = 1.0;

/// Upper bound on enumerated candidates before assembly is refused
pub const DEFAULT_MAX_CANDIDATES: u64 = 10_000_000;

/// Satellite universe limit imposed by the bitmask candidate encoding
pub const MAX_SATELLITES: usize = 64;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("satellite universe of {0} exceeds the supported maximum of {MAX_SATELLITES}")]
    TooManySatellites(usize),
    #[error("coverage for satellite {0} is {1}, outside [0, 1]")]
    CoverageOutOfRange(usize, f64),
    #[error("candidate count C({n}, {k}) = {count} exceeds budget of {budget}")]
    CandidateBudget {
        n: usize,
        k: usize,
        count: u64,
        budget: u64,
    },
    #[error("constellation size must be at least 1")]
    EmptyConstellation,
    #[error("{0} satellites cannot be split evenly into {1} constellations")]
    IndivisibleUniverse(usize, usize),
    #[error("assignment has {0} entries but the model has {1} variables")]
    AssignmentMismatch(usize, usize),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Immutable per-satellite coverage probabilities for one planning run.
///
/// Index i holds the probability that satellite i covers the target
/// region at any one time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageMap {
    probabilities: Vec<f64>,
}

impl CoverageMap {
    /// Validate and freeze a coverage table. Fails if the universe is
    /// larger than [`MAX_SATELLITES`] or any probability leaves [0, 1].
    pub fn new(probabilities: Vec<f64>) -> Result<Self> {
        if probabilities.len() > MAX_SATELLITES {
            return Err(ModelError::TooManySatellites(probabilities.len()));
        }
        for (i, &p) in probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(&p) || !p.is_finite() {
                return Err(ModelError::CoverageOutOfRange(i, p));
            }
        }
        Ok(Self { probabilities })
    }

    /// Number of satellites in the universe
    pub fn num_satellites(&self) -> usize {
        self.probabilities.len()
    }

    /// Coverage probability of one satellite
    pub fn probability(&self, satellite: usize) -> f64 {
        self.probabilities[satellite]
    }
}

/// A candidate constellation: a fixed-size subset of satellite ids.
///
/// Stored as a bitmask so equality, hashing and the overlap test are
/// single-word operations. Identity is the member set, independent of
/// construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(u64);

impl Candidate {
    /// Build from an explicit member list. Ids must be below
    /// [`MAX_SATELLITES`]; duplicates collapse.
    pub fn from_members(members: &[usize]) -> Self {
        let mut bits = 0u64;
        for &m in members {
            debug_assert!(m < MAX_SATELLITES);
            bits |= 1 << m;
        }
        Self(bits)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Member count
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when the two candidates share at least one satellite
    pub fn overlaps(self, other: Candidate) -> bool {
        self.0 & other.0 != 0
    }

    /// Member ids in ascending order
    pub fn members(self) -> impl Iterator<Item = usize> {
        let bits = self.0;
        (0..MAX_SATELLITES).filter(move |i| bits & (1 << i) != 0)
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, m) in self.members().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", m)?;
        }
        write!(f, "]")
    }
}
