//! QUBO model assembly
//!
//! Translates scored candidates, the disjointness requirement and the
//! exactly-T cardinality constraint into a single quadratic binary model
//! minimized by an external sampler.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    Candidate, CoverageMap, ModelError, Result, ScoreStrategy, enumerate::Combinations,
    DEFAULT_CARDINALITY_STRENGTH, DEFAULT_MAX_CANDIDATES, DEFAULT_OVERLAP_WEIGHT,
    DEFAULT_SCORE_THRESHOLD,
};

/// Assembly parameters. `target_count` is the number of constellations
/// to select; everything else has a conventional default.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Number of constellations to choose (T)
    pub target_count: usize,
    /// Candidates scoring below this are discarded; the bound is inclusive
    pub score_threshold: f64,
    /// Quadratic penalty for candidate pairs sharing a satellite
    pub overlap_weight: f64,
    /// Strength of the exactly-T cardinality constraint
    pub cardinality_strength: f64,
    /// Refuse assembly when C(n, k) exceeds this
    pub max_candidates: u64,
}

impl BuildConfig {
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            overlap_weight: DEFAULT_OVERLAP_WEIGHT,
            cardinality_strength: DEFAULT_CARDINALITY_STRENGTH,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// A quadratic binary optimization model over interned candidates.
///
/// Variables live in an arena (`Vec<Candidate>`); linear biases are
/// indexed by arena position and quadratic weights are keyed by ordered
/// index pairs `(i, j)` with `i < j`, one entry per unordered pair and no
/// self-pairs. `offset` carries the constant part of the objective so
/// [`QuadraticBinaryModel::energy`] is exact.
#[derive(Debug, Clone, Default)]
pub struct QuadraticBinaryModel {
    variables: Vec<Candidate>,
    index: HashMap<Candidate, usize>,
    linear: Vec<f64>,
    quadratic: HashMap<(usize, usize), f64>,
    offset: f64,
}

impl QuadraticBinaryModel {
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// A model with no variables is valid but degenerate: nothing met
    /// the score threshold. Callers must surface this as an explicit
    /// "no feasible candidates" condition instead of sampling it.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variables(&self) -> &[Candidate] {
        &self.variables
    }

    pub fn candidate(&self, index: usize) -> Candidate {
        self.variables[index]
    }

    pub fn linear(&self) -> &[f64] {
        &self.linear
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Quadratic terms as `((i, j), weight)` with `i < j`
    pub fn quadratic_terms(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.quadratic.iter().map(|(&k, &w)| (k, w))
    }

    /// Weight of the unordered pair, if present
    pub fn quadratic_weight(&self, a: Candidate, b: Candidate) -> Option<f64> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        let key = if i < j { (i, j) } else { (j, i) };
        self.quadratic.get(&key).copied()
    }

    /// Intern a candidate, adding `bias` to its linear term. Re-adding an
    /// existing candidate accumulates instead of duplicating.
    fn add_variable(&mut self, candidate: Candidate, bias: f64) -> usize {
        match self.index.get(&candidate) {
            Some(&i) => {
                self.linear[i] += bias;
                i
            }
            None => {
                let i = self.variables.len();
                self.variables.push(candidate);
                self.linear.push(bias);
                self.index.insert(candidate, i);
                i
            }
        }
    }

    /// Accumulate a quadratic interaction between two distinct interned
    /// variables.
    fn add_interaction(&mut self, i: usize, j: usize, weight: f64) {
        debug_assert!(i != j, "self-interactions are not representable");
        let key = if i < j { (i, j) } else { (j, i) };
        *self.quadratic.entry(key).or_insert(0.0) += weight;
    }

    /// Objective value of a full assignment, offset included.
    pub fn energy(&self, assignment: &[bool]) -> Result<f64> {
        if assignment.len() != self.variables.len() {
            return Err(ModelError::AssignmentMismatch(
                assignment.len(),
                self.variables.len(),
            ));
        }
        let mut e = self.offset;
        for (i, &on) in assignment.iter().enumerate() {
            if on {
                e += self.linear[i];
            }
        }
        for (&(i, j), &w) in &self.quadratic {
            if assignment[i] && assignment[j] {
                e += w;
            }
        }
        Ok(e)
    }
}

/// Assembles a [`QuadraticBinaryModel`] from a coverage map.
pub struct ModelBuilder<'a> {
    coverage: &'a CoverageMap,
    strategy: ScoreStrategy,
    config: BuildConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(coverage: &'a CoverageMap, strategy: ScoreStrategy, config: BuildConfig) -> Self {
        Self {
            coverage,
            strategy,
            config,
        }
    }

    /// Constellation size implied by the universe and target count.
    /// Remainder satellites are a validation error, never silently
    /// dropped.
    fn constellation_size(&self) -> Result<usize> {
        let n = self.coverage.num_satellites();
        let t = self.config.target_count;
        if t == 0 || n == 0 {
            return Err(ModelError::EmptyConstellation);
        }
        if n % t != 0 {
            return Err(ModelError::IndivisibleUniverse(n, t));
        }
        Ok(n / t)
    }

    /// Run the full assembly: enumerate, score, filter, penalize overlap,
    /// impose cardinality.
    pub fn build(&self) -> Result<QuadraticBinaryModel> {
        let n = self.coverage.num_satellites();
        let k = self.constellation_size()?;
        let mut model = QuadraticBinaryModel::default();

        // Favor high-scoring candidates: each retained subset becomes a
        // variable biased by minus its score (samplers minimize energy).
        let mut enumerated = 0u64;
        for candidate in Combinations::bounded(n, k, self.config.max_candidates)? {
            enumerated += 1;
            let score = self.strategy.score(candidate, self.coverage);
            if score < self.config.score_threshold {
                continue;
            }
            model.add_variable(candidate, -score);
        }
        info!(
            enumerated,
            retained = model.num_variables(),
            threshold = self.config.score_threshold,
            "enumerated candidates"
        );

        // Penalize pairs that share a satellite. The weight exceeds the
        // best combined linear benefit of any two candidates (each score
        // is at most 1), so true minima never co-select an overlapping
        // pair.
        let mut overlap_pairs = 0usize;
        for i in 0..model.num_variables() {
            for j in i + 1..model.num_variables() {
                if model.variables[i].overlaps(model.variables[j]) {
                    model.add_interaction(i, j, self.config.overlap_weight);
                    overlap_pairs += 1;
                }
            }
        }
        debug!(overlap_pairs, "added disjointness penalties");

        self.apply_cardinality(&mut model);

        Ok(model)
    }

    /// Quadratic expansion of `strength * (sum(x) - T)^2`, merged
    /// additively: `strength * (1 - 2T)` on every linear term,
    /// `2 * strength` on every pair, `strength * T^2` on the offset.
    /// Zero exactly when T variables are on, strictly positive otherwise.
    fn apply_cardinality(&self, model: &mut QuadraticBinaryModel) {
        let strength = self.config.cardinality_strength;
        if strength == 0.0 {
            // Disabled constraint contributes nothing; in particular no
            // zero-weight quadratic entries on disjoint pairs.
            return;
        }
        let t = self.config.target_count as f64;

        let linear_adjust = strength * (1.0 - 2.0 * t);
        for bias in model.linear.iter_mut() {
            *bias += linear_adjust;
        }
        for i in 0..model.num_variables() {
            for j in i + 1..model.num_variables() {
                model.add_interaction(i, j, 2.0 * strength);
            }
        }
        model.offset += strength * t * t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoverageMap;

    fn coverage(probs: &[f64]) -> CoverageMap {
        CoverageMap::new(probs.to_vec()).unwrap()
    }

    fn config(target: usize, threshold: f64, strength: f64) -> BuildConfig {
        BuildConfig {
            score_threshold: threshold,
            cardinality_strength: strength,
            ..BuildConfig::new(target)
        }
    }

    /// All 2^n assignments of a small model
    fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
        (0u32..1 << n).map(move |bits| (0..n).map(|i| bits & (1 << i) != 0).collect())
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Average of [0.4, 0.4] is exactly the default threshold
        let cov = coverage(&[0.4, 0.4, 0.1, 0.1]);
        let cfg = config(2, 0.4, 1.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();
        assert!(model
            .variables()
            .contains(&Candidate::from_members(&[0, 1])));

        // One candidate just below the bound is excluded
        let cov = coverage(&[0.4, 0.39, 0.1, 0.1]);
        let cfg = config(2, 0.4, 1.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();
        assert!(!model
            .variables()
            .contains(&Candidate::from_members(&[0, 1])));
    }

    #[test]
    fn test_linear_bias_is_negated_score() {
        let cov = coverage(&[0.9, 0.7]);
        let cfg = config(1, 0.0, 0.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();
        assert_eq!(model.num_variables(), 1);
        assert!((model.linear()[0] - (-0.8)).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_penalty_exact_and_disjoint_free() {
        // strength 0 isolates the overlap contribution
        let cov = coverage(&[0.9, 0.9, 0.9, 0.9]);
        let cfg = config(2, 0.0, 0.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();

        let c01 = Candidate::from_members(&[0, 1]);
        let c12 = Candidate::from_members(&[1, 2]);
        let c23 = Candidate::from_members(&[2, 3]);

        assert_eq!(model.quadratic_weight(c01, c12), Some(2.0));
        assert_eq!(model.quadratic_weight(c01, c23), None);
    }

    #[test]
    fn test_disabled_cardinality_leaves_no_phantom_terms() {
        let cov = coverage(&[0.9, 0.9, 0.9, 0.9]);
        let cfg = config(2, 0.0, 0.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();

        // Only real overlap penalties remain: no zero-weight entries,
        // no offset, no linear adjustment beyond the negated scores
        assert_eq!(model.offset(), 0.0);
        for ((i, j), w) in model.quadratic_terms() {
            assert!(model.candidate(i).overlaps(model.candidate(j)));
            assert_eq!(w, 2.0);
        }
        for &bias in model.linear() {
            assert!((bias - (-0.9)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cardinality_merges_onto_every_pair() {
        let cov = coverage(&[0.9, 0.9, 0.9, 0.9]);
        let cfg = config(2, 0.0, 1.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();

        let c01 = Candidate::from_members(&[0, 1]);
        let c12 = Candidate::from_members(&[1, 2]);
        let c23 = Candidate::from_members(&[2, 3]);

        // overlapping: overlap weight + cardinality pair term
        assert_eq!(model.quadratic_weight(c01, c12), Some(4.0));
        // disjoint: cardinality pair term only
        assert_eq!(model.quadratic_weight(c01, c23), Some(2.0));
    }

    #[test]
    fn test_cardinality_energy_zero_iff_target_met() {
        // Neutralize scores and overlap so only the cardinality term
        // remains, then sweep every assignment.
        let cov = coverage(&[0.0, 0.0, 0.0, 0.0]);
        let mut cfg = config(2, 0.0, 1.0);
        cfg.overlap_weight = 0.0;
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();
        assert_eq!(model.num_variables(), 6);

        for assignment in assignments(model.num_variables()) {
            let count = assignment.iter().filter(|&&b| b).count();
            let e = model.energy(&assignment).unwrap();
            if count == 2 {
                assert!(e.abs() < 1e-9, "count {} energy {}", count, e);
            } else {
                assert!(e > 1e-9, "count {} energy {}", count, e);
            }
        }
    }

    #[test]
    fn test_exhaustive_small_instance() {
        // 4 satellites, groups of 2, choose 2, coverage heavily split.
        // Threshold 0 keeps all six candidates so the weak pair {2,3}
        // stays available for the perfect partition.
        let cov = coverage(&[0.9, 0.9, 0.1, 0.1]);
        let cfg = config(2, 0.0, 1.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();
        assert_eq!(model.num_variables(), 6);

        let mut best_energy = f64::INFINITY;
        let mut best: Vec<Vec<bool>> = Vec::new();
        for assignment in assignments(model.num_variables()) {
            let e = model.energy(&assignment).unwrap();
            if e < best_energy - 1e-9 {
                best_energy = e;
                best = vec![assignment];
            } else if (e - best_energy).abs() <= 1e-9 {
                best.push(assignment);
            }
        }

        // Every ground state is a perfect 2-partition with total score 1.0
        for assignment in &best {
            let chosen: Vec<Candidate> = assignment
                .iter()
                .enumerate()
                .filter(|(_, &on)| on)
                .map(|(i, _)| model.candidate(i))
                .collect();
            assert_eq!(chosen.len(), 2);
            assert!(!chosen[0].overlaps(chosen[1]));
            let total: f64 = chosen
                .iter()
                .map(|&c| ScoreStrategy::Average.score(c, &cov))
                .sum();
            assert!((total - 1.0).abs() < 1e-9);
            assert!((total / 2.0 - 0.5).abs() < 1e-9);
        }

        // The {0,1} / {2,3} partition attains the minimum
        let target: Vec<bool> = model
            .variables()
            .iter()
            .map(|&c| {
                c == Candidate::from_members(&[0, 1]) || c == Candidate::from_members(&[2, 3])
            })
            .collect();
        let e = model.energy(&target).unwrap();
        assert!((e - best_energy).abs() < 1e-9);
    }

    #[test]
    fn test_empty_model_is_degenerate_not_a_crash() {
        // Nothing clears a threshold of 0.99
        let cov = coverage(&[0.5, 0.5, 0.5, 0.5]);
        let cfg = config(2, 0.99, 1.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap();
        assert!(model.is_empty());
        assert_eq!(model.num_variables(), 0);
        // Offset still reflects the cardinality constant
        assert!((model.offset() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_indivisible_universe_rejected() {
        let cov = coverage(&[0.5, 0.5, 0.5, 0.5, 0.5]);
        let cfg = config(2, 0.0, 1.0);
        let err = ModelBuilder::new(&cov, ScoreStrategy::Average, cfg)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::IndivisibleUniverse(5, 2)));
    }

    #[test]
    fn test_quadratic_keys_are_ordered_and_distinct() {
        let cov = coverage(&[0.9, 0.9, 0.9, 0.9, 0.9, 0.9]);
        let cfg = config(3, 0.0, 1.0);
        let model = ModelBuilder::new(&cov, ScoreStrategy::Union, cfg)
            .build()
            .unwrap();
        for ((i, j), _) in model.quadratic_terms() {
            assert!(i < j);
            assert!(j < model.num_variables());
        }
        assert_eq!(model.linear().len(), model.num_variables());
    }

    #[test]
    fn test_budget_propagates() {
        let cov = CoverageMap::new(vec![0.5; 40]).unwrap();
        let mut cfg = config(2, 0.0, 1.0);
        cfg.max_candidates = 100;
        let err = ModelBuilder::new(&cov, ScoreStrategy::Union, cfg)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::CandidateBudget { .. }));
    }
}
