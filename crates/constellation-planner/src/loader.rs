//! Problem data loading from JSON files
//!
//! Schema: `{ "num_satellites": n, "num_constellations": t,
//! "coverage": { "0": p0, ..., "n-1": p } }`. Everything is validated at
//! this boundary before any model is built: indices must cover exactly
//! `0..n-1`, probabilities must stay in [0, 1], and `n` must divide
//! evenly into `t` constellations. The original tooling silently dropped
//! remainder satellites; here that is a hard error.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use constellation_qubo::{CoverageMap, ModelError};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("num_satellites must be at least 1")]
    EmptyUniverse,
    #[error("num_constellations must be at least 1")]
    ZeroConstellations,
    #[error("coverage entry missing for satellite {0}")]
    MissingCoverage(usize),
    #[error("coverage key '{0}' is not a satellite index in 0..{1}")]
    UnexpectedIndex(String, usize),
    #[error("{0} satellites cannot be split evenly into {1} constellations")]
    Indivisible(usize, usize),
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// A validated planning problem
#[derive(Debug, Clone)]
pub struct Problem {
    pub coverage: CoverageMap,
    /// Target number of constellations (T)
    pub num_constellations: usize,
    /// Satellites per constellation
    pub constellation_size: usize,
}

#[derive(Debug, Deserialize)]
struct RawProblem {
    num_satellites: Option<usize>,
    num_constellations: Option<usize>,
    coverage: Option<HashMap<String, f64>>,
}

/// Load and validate a problem file
pub fn load_problem(path: impl AsRef<Path>) -> Result<Problem> {
    let path = path.as_ref();
    info!("Loading problem data from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: RawProblem = serde_json::from_reader(reader)?;

    let num_satellites = raw
        .num_satellites
        .ok_or(DataError::MissingField("num_satellites"))?;
    let num_constellations = raw
        .num_constellations
        .ok_or(DataError::MissingField("num_constellations"))?;
    let coverage = raw.coverage.ok_or(DataError::MissingField("coverage"))?;

    if num_satellites == 0 {
        return Err(DataError::EmptyUniverse);
    }
    if num_constellations == 0 {
        return Err(DataError::ZeroConstellations);
    }
    if num_satellites % num_constellations != 0 {
        return Err(DataError::Indivisible(num_satellites, num_constellations));
    }

    // Keys must be exactly the string-encoded indices 0..n-1
    for key in coverage.keys() {
        match key.parse::<usize>() {
            Ok(i) if i < num_satellites => {}
            _ => return Err(DataError::UnexpectedIndex(key.clone(), num_satellites)),
        }
    }
    let mut probabilities = Vec::with_capacity(num_satellites);
    for i in 0..num_satellites {
        let p = coverage
            .get(&i.to_string())
            .copied()
            .ok_or(DataError::MissingCoverage(i))?;
        probabilities.push(p);
    }

    // Range and universe-size checks live with the coverage type
    let coverage = CoverageMap::new(probabilities)?;

    let problem = Problem {
        constellation_size: num_satellites / num_constellations,
        coverage,
        num_constellations,
    };
    info!(
        satellites = num_satellites,
        constellations = problem.num_constellations,
        size = problem.constellation_size,
        "problem loaded"
    );
    Ok(problem)
}
