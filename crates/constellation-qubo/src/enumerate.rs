//! Lazy enumeration of candidate constellations
//!
//! Yields every size-k subset of the satellite universe in lexicographic
//! order. Counts grow as C(n, k), into the tens of thousands for n in the
//! tens, so candidates are streamed rather than materialized and the total
//! is checked against a budget before any enumeration starts.

use crate::{Candidate, ModelError, Result};

/// Binomial coefficient C(n, k), saturating at `u64::MAX` on overflow.
///
/// Saturation is fine for budget checks: anything that saturates is far
/// beyond any budget we would accept.
pub fn combination_count(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut count: u64 = 1;
    for i in 0..k {
        // count * (n - i) / (i + 1), kept exact at every step
        let numer = (n - i) as u64;
        let denom = (i + 1) as u64;
        count = match count.checked_mul(numer) {
            Some(v) => v / denom,
            None => return u64::MAX,
        };
    }
    count
}

/// Lexicographic iterator over all size-k subsets of `0..n`.
///
/// Deterministic and side-effect free; state is the current index vector
/// only.
#[derive(Debug)]
pub struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    /// Iterate all size-k subsets of `0..n`. `k = 0` yields nothing,
    /// matching the "a constellation has at least one satellite" rule
    /// enforced upstream.
    pub fn new(n: usize, k: usize) -> Self {
        let done = k == 0 || k > n;
        Self {
            n,
            k,
            indices: (0..k).collect(),
            done,
        }
    }

    /// Budget-checked constructor: refuses enumerations whose total
    /// candidate count exceeds `max_candidates`.
    pub fn bounded(n: usize, k: usize, max_candidates: u64) -> Result<Self> {
        if k == 0 {
            return Err(ModelError::EmptyConstellation);
        }
        let count = combination_count(n, k);
        if count > max_candidates {
            return Err(ModelError::CandidateBudget {
                n,
                k,
                count,
                budget: max_candidates,
            });
        }
        Ok(Self::new(n, k))
    }
}

impl Iterator for Combinations {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.done {
            return None;
        }
        let candidate = Candidate::from_members(&self.indices);

        // Advance to the next lexicographic combination: bump the
        // rightmost index that still has room, reset everything after it.
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - self.k + i {
                self.indices[i] += 1;
                for j in i + 1..self.k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            let total = combination_count(self.n, self.k);
            let hint = usize::try_from(total).ok();
            (0, hint)
        }
    }
}
