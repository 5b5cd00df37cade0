//! Selection extraction and reporting
//!
//! Turns a winning sampler assignment back into constellations. Scores
//! are recomputed from the coverage map with the chosen strategy, not
//! read out of the model's internal biases, so the report is honest even
//! if the model was built with different knobs. Heuristic samplers may
//! violate the cardinality constraint; the report states what actually
//! came back.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Candidate, CoverageMap, ModelError, QuadraticBinaryModel, Result, ScoreStrategy};

/// One chosen constellation with its recomputed score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedConstellation {
    pub members: Vec<usize>,
    pub score: f64,
}

/// Final selection report, the hand-off point for printing or external
/// rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    pub strategy: ScoreStrategy,
    pub target_count: usize,
    pub selected: Vec<SelectedConstellation>,
    pub total_score: f64,
    /// `total_score / target_count`
    pub normalized_score: f64,
    /// Whether the sampler honored the exactly-T constraint
    pub meets_target: bool,
    /// Chosen pairs still sharing a satellite (0 for a clean partition)
    pub overlapping_pairs: usize,
    pub generated_at: String,
}

impl SelectionReport {
    /// Extract the report for one assignment over `model`'s variables.
    /// Selected constellations keep the model's deterministic arena
    /// order.
    pub fn extract(
        model: &QuadraticBinaryModel,
        assignment: &[bool],
        coverage: &CoverageMap,
        strategy: ScoreStrategy,
        target_count: usize,
    ) -> Result<Self> {
        if assignment.len() != model.num_variables() {
            return Err(ModelError::AssignmentMismatch(
                assignment.len(),
                model.num_variables(),
            ));
        }

        let chosen: Vec<Candidate> = assignment
            .iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .map(|(i, _)| model.candidate(i))
            .collect();

        let mut overlapping_pairs = 0;
        for i in 0..chosen.len() {
            for j in i + 1..chosen.len() {
                if chosen[i].overlaps(chosen[j]) {
                    overlapping_pairs += 1;
                }
            }
        }

        let selected: Vec<SelectedConstellation> = chosen
            .iter()
            .map(|&c| SelectedConstellation {
                members: c.members().collect(),
                score: strategy.score(c, coverage),
            })
            .collect();

        let total_score: f64 = selected.iter().map(|s| s.score).sum();
        let normalized_score = if target_count > 0 {
            total_score / target_count as f64
        } else {
            0.0
        };

        let meets_target = chosen.len() == target_count;
        if !meets_target {
            warn!(
                selected = chosen.len(),
                target = target_count,
                "sampler returned a selection violating the cardinality constraint"
            );
        }
        if overlapping_pairs > 0 {
            warn!(overlapping_pairs, "selection contains residual overlap");
        }

        Ok(Self {
            strategy,
            target_count,
            selected,
            total_score,
            normalized_score,
            meets_target,
            overlapping_pairs,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
