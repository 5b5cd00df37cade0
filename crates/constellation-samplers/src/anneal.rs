//! Local simulated-annealing sampler
//!
//! Single-flip Metropolis annealer with a geometric inverse-temperature
//! schedule and independent restarts. Good enough for instances up to a
//! few thousand variables; larger models belong on the hybrid service.

use constellation_qubo::QuadraticBinaryModel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{Result, SampleRecord, SampleSet, Sampler, SamplerError};

/// Default number of independent annealing reads
pub const DEFAULT_NUM_READS: u32 = 100;

/// Default sweeps (full variable passes) per read
pub const DEFAULT_SWEEPS: u32 = 1000;

/// Default inverse-temperature range for the geometric schedule
pub const DEFAULT_BETA_RANGE: (f64, f64) = (0.1, 10.0);

#[derive(Debug, Clone)]
pub struct SimulatedAnnealer {
    /// Independent restarts; each contributes one sample record
    pub num_reads: u32,
    /// Full passes over all variables per read
    pub sweeps: u32,
    /// Inverse temperature swept geometrically from `.0` to `.1`
    pub beta_range: (f64, f64),
    /// Fixed seed for reproducible runs; entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for SimulatedAnnealer {
    fn default() -> Self {
        Self {
            num_reads: DEFAULT_NUM_READS,
            sweeps: DEFAULT_SWEEPS,
            beta_range: DEFAULT_BETA_RANGE,
            seed: None,
        }
    }
}

impl SimulatedAnnealer {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Energy change of flipping variable `i` in `state`.
    ///
    /// E = sum(l_i x_i) + sum(w_ij x_i x_j) + offset, so the delta is
    /// `s * (l_i + sum over neighbors j of w_ij x_j)` with s = +1 for a
    /// 0 -> 1 flip and -1 otherwise.
    fn flip_delta(
        linear: &[f64],
        neighbors: &[Vec<(usize, f64)>],
        state: &[bool],
        i: usize,
    ) -> f64 {
        let mut field = linear[i];
        for &(j, w) in &neighbors[i] {
            if state[j] {
                field += w;
            }
        }
        if state[i] {
            -field
        } else {
            field
        }
    }
}

impl Sampler for SimulatedAnnealer {
    fn name(&self) -> &str {
        "anneal"
    }

    fn sample(&self, model: &QuadraticBinaryModel) -> Result<SampleSet> {
        if model.is_empty() {
            return Err(SamplerError::EmptyModel);
        }

        let num_vars = model.num_variables();
        let linear = model.linear();

        // Adjacency list so each flip delta touches only real couplings
        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_vars];
        for ((i, j), w) in model.quadratic_terms() {
            neighbors[i].push((j, w));
            neighbors[j].push((i, w));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (beta_min, beta_max) = self.beta_range;
        let sweeps = self.sweeps.max(1);
        let beta_step = (beta_max / beta_min).powf(1.0 / (sweeps.saturating_sub(1).max(1)) as f64);

        let mut records = Vec::with_capacity(self.num_reads as usize);
        for read in 0..self.num_reads.max(1) {
            let mut state: Vec<bool> = (0..num_vars).map(|_| rng.gen()).collect();
            let mut energy = model
                .energy(&state)
                .map_err(|_| SamplerError::AssignmentMismatch(state.len(), num_vars))?;

            let mut beta = beta_min;
            for _ in 0..sweeps {
                for i in 0..num_vars {
                    let delta = Self::flip_delta(linear, &neighbors, &state, i);
                    if delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp() {
                        state[i] = !state[i];
                        energy += delta;
                    }
                }
                beta *= beta_step;
            }

            debug!(read, energy, "annealing read finished");
            records.push(SampleRecord {
                assignment: state,
                energy,
                occurrences: 1,
            });
        }

        Ok(SampleSet::new(records).aggregate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellation_qubo::{BuildConfig, CoverageMap, ModelBuilder, ScoreStrategy};

    fn split_instance() -> QuadraticBinaryModel {
        let coverage = CoverageMap::new(vec![0.9, 0.9, 0.1, 0.1]).unwrap();
        let config = BuildConfig {
            score_threshold: 0.0,
            ..BuildConfig::new(2)
        };
        ModelBuilder::new(&coverage, ScoreStrategy::Average, config)
            .build()
            .unwrap()
    }

    fn brute_force_minimum(model: &QuadraticBinaryModel) -> f64 {
        let n = model.num_variables();
        (0u32..1 << n)
            .map(|bits| {
                let assignment: Vec<bool> = (0..n).map(|i| bits & (1 << i) != 0).collect();
                model.energy(&assignment).unwrap()
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_annealer_finds_ground_state_of_small_instance() {
        let model = split_instance();
        let expected = brute_force_minimum(&model);

        let annealer = SimulatedAnnealer {
            num_reads: 50,
            sweeps: 300,
            ..SimulatedAnnealer::with_seed(7)
        };
        let set = annealer.sample(&model).unwrap();
        let best = set.best().unwrap();

        assert!(
            (best.energy - expected).abs() < 1e-9,
            "best {} expected {}",
            best.energy,
            expected
        );
        // Ground state here is a clean 2-partition
        let count = best.assignment.iter().filter(|&&b| b).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_annealer_is_deterministic_under_seed() {
        let model = split_instance();
        let annealer = SimulatedAnnealer {
            num_reads: 10,
            sweeps: 100,
            ..SimulatedAnnealer::with_seed(42)
        };
        let a = annealer.sample(&model).unwrap();
        let b = annealer.sample(&model).unwrap();
        assert_eq!(a.best().unwrap().energy, b.best().unwrap().energy);
        assert_eq!(a.best().unwrap().assignment, b.best().unwrap().assignment);
    }

    #[test]
    fn test_annealer_rejects_empty_model() {
        let coverage = CoverageMap::new(vec![0.1, 0.1]).unwrap();
        let config = BuildConfig::new(1); // default threshold 0.4 filters everything
        let model = ModelBuilder::new(&coverage, ScoreStrategy::Average, config)
            .build()
            .unwrap();
        assert!(model.is_empty());

        let annealer = SimulatedAnnealer::with_seed(1);
        assert!(matches!(
            annealer.sample(&model),
            Err(SamplerError::EmptyModel)
        ));
    }

    #[test]
    fn test_flip_delta_matches_full_energy() {
        let model = split_instance();
        let n = model.num_variables();
        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for ((i, j), w) in model.quadratic_terms() {
            neighbors[i].push((j, w));
            neighbors[j].push((i, w));
        }

        let state: Vec<bool> = vec![true, false, true, false, true, false];
        let base = model.energy(&state).unwrap();
        for i in 0..n {
            let mut flipped = state.clone();
            flipped[i] = !flipped[i];
            let expected = model.energy(&flipped).unwrap() - base;
            let delta = SimulatedAnnealer::flip_delta(model.linear(), &neighbors, &state, i);
            assert!(
                (delta - expected).abs() < 1e-9,
                "var {}: {} vs {}",
                i,
                delta,
                expected
            );
        }
    }
}
