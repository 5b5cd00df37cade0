//! Candidate scoring
//!
//! Two scoring strategies exist because they express different physical
//! assumptions about what "coverage" of a constellation means, and the
//! choice materially changes which candidates clear the threshold. The
//! strategy is an explicit parameter everywhere, never an implicit
//! default baked into a call site.

use serde::{Deserialize, Serialize};

use crate::{Candidate, CoverageMap};

/// How a candidate constellation's coverage score is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStrategy {
    /// Mean of member coverage probabilities.
    Average,
    /// Probability that at least one member covers the target, treating
    /// member coverage events as independent: 1 - prod(1 - p_i).
    Union,
}

impl Default for ScoreStrategy {
    fn default() -> Self {
        ScoreStrategy::Union
    }
}

impl ScoreStrategy {
    /// Coverage score of `candidate`, in [0, 1] for any valid coverage
    /// map. Pure: no side effects, no randomness.
    pub fn score(self, candidate: Candidate, coverage: &CoverageMap) -> f64 {
        match self {
            ScoreStrategy::Average => {
                let len = candidate.len();
                if len == 0 {
                    return 0.0;
                }
                let sum: f64 = candidate.members().map(|m| coverage.probability(m)).sum();
                sum / len as f64
            }
            ScoreStrategy::Union => {
                let miss: f64 = candidate
                    .members()
                    .map(|m| 1.0 - coverage.probability(m))
                    .product();
                1.0 - miss
            }
        }
    }
}

impl std::fmt::Display for ScoreStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreStrategy::Average => write!(f, "average"),
            ScoreStrategy::Union => write!(f, "union"),
        }
    }
}

impl std::str::FromStr for ScoreStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "average" => Ok(ScoreStrategy::Average),
            "union" => Ok(ScoreStrategy::Union),
            other => Err(format!(
                "unknown score strategy '{}' (expected 'average' or 'union')",
                other
            )),
        }
    }
}
