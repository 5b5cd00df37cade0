//! Constellation Planner
//!
//! Wires the pipeline together: validated problem data goes through the
//! QUBO builder, the assembled model goes to whichever sampler the user
//! picked, and the winning assignment comes back as a printable
//! selection report. The samplers never see unvalidated input and the
//! report never assumes the sampler behaved.

use constellation_qubo::{
    BuildConfig, ModelBuilder, ModelError, ScoreStrategy, SelectionReport,
    DEFAULT_MAX_CANDIDATES, DEFAULT_SCORE_THRESHOLD,
};
use constellation_samplers::{Sampler, SamplerError};
use thiserror::Error;
use tracing::info;

pub mod loader;

pub use loader::{load_problem, DataError, Problem};

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("Unrecognized solver '{0}' (expected 'anneal' or 'hybrid')")]
    UnknownSolver(String),
    #[error("no candidate constellation met the score threshold of {0}")]
    EmptyModel(f64),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error("sampler returned no assignments")]
    NoSamples,
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Which sampler backend to dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// Local simulated annealing, for small instances
    Anneal,
    /// Remote hybrid sampling service, for large instances
    Hybrid,
}

impl std::str::FromStr for SolverKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "anneal" => Ok(SolverKind::Anneal),
            "hybrid" => Ok(SolverKind::Hybrid),
            other => Err(PlannerError::UnknownSolver(other.to_string())),
        }
    }
}

/// Knobs for model assembly
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub strategy: ScoreStrategy,
    pub score_threshold: f64,
    pub max_candidates: u64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            strategy: ScoreStrategy::default(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// Full pipeline: assemble the model, sample it, extract the report.
///
/// An empty model (nothing cleared the threshold) is reported as
/// [`PlannerError::EmptyModel`] before the sampler is ever invoked.
pub fn plan(
    problem: &Problem,
    options: &PlanOptions,
    sampler: &dyn Sampler,
) -> Result<SelectionReport> {
    let config = BuildConfig {
        score_threshold: options.score_threshold,
        max_candidates: options.max_candidates,
        ..BuildConfig::new(problem.num_constellations)
    };
    let model = ModelBuilder::new(&problem.coverage, options.strategy, config).build()?;

    if model.is_empty() {
        return Err(PlannerError::EmptyModel(options.score_threshold));
    }
    info!(
        variables = model.num_variables(),
        sampler = sampler.name(),
        "sampling assembled model"
    );

    let samples = sampler.sample(&model)?;
    let best = samples.best().ok_or(PlannerError::NoSamples)?;

    let report = SelectionReport::extract(
        &model,
        &best.assignment,
        &problem.coverage,
        options.strategy,
        problem.num_constellations,
    )?;
    Ok(report)
}

/// Render the stdout report: one line per selected constellation, then
/// the totals. This format is a contract; diagnostics go to stderr via
/// tracing instead.
pub fn render_report(report: &SelectionReport) -> String {
    let mut out = String::new();
    for selected in &report.selected {
        let members: Vec<String> = selected.members.iter().map(|m| m.to_string()).collect();
        out.push_str(&format!(
            "Constellation: [{}], Score: {}\n",
            members.join(", "),
            selected.score
        ));
    }
    out.push_str(&format!("Total Score: {}\n", report.total_score));
    out.push_str(&format!(
        "Normalized Score (tot / # constellations): {}\n",
        report.normalized_score
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellation_qubo::CoverageMap;
    use constellation_samplers::{SampleSet, SimulatedAnnealer};

    fn problem(probs: &[f64], t: usize) -> Problem {
        Problem {
            coverage: CoverageMap::new(probs.to_vec()).unwrap(),
            num_constellations: t,
            constellation_size: probs.len() / t,
        }
    }

    /// Sampler that must never be reached
    struct UnreachableSampler;

    impl Sampler for UnreachableSampler {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn sample(
            &self,
            _model: &constellation_qubo::QuadraticBinaryModel,
        ) -> constellation_samplers::Result<SampleSet> {
            panic!("sampler must not be invoked");
        }
    }

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!("anneal".parse::<SolverKind>().unwrap(), SolverKind::Anneal);
        assert_eq!("hybrid".parse::<SolverKind>().unwrap(), SolverKind::Hybrid);
        let err = "neal".parse::<SolverKind>().unwrap_err();
        assert!(err.to_string().contains("Unrecognized solver"));
    }

    #[test]
    fn test_empty_model_reported_before_sampling() {
        let problem = problem(&[0.1, 0.1, 0.1, 0.1], 2);
        let options = PlanOptions::default(); // threshold 0.4 filters all
        let err = plan(&problem, &options, &UnreachableSampler).unwrap_err();
        assert!(matches!(err, PlannerError::EmptyModel(_)));
    }

    #[test]
    fn test_plan_end_to_end_with_annealer() {
        let problem = problem(&[0.9, 0.9, 0.1, 0.1], 2);
        let options = PlanOptions {
            strategy: ScoreStrategy::Average,
            score_threshold: 0.0,
            ..PlanOptions::default()
        };
        let annealer = SimulatedAnnealer {
            num_reads: 50,
            sweeps: 300,
            ..SimulatedAnnealer::with_seed(11)
        };

        let report = plan(&problem, &options, &annealer).unwrap();
        assert!(report.meets_target);
        assert_eq!(report.overlapping_pairs, 0);
        assert!((report.total_score - 1.0).abs() < 1e-9);
        assert!((report.normalized_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_report_format() {
        let problem = problem(&[0.9, 0.9, 0.1, 0.1], 2);
        let options = PlanOptions {
            strategy: ScoreStrategy::Average,
            score_threshold: 0.0,
            ..PlanOptions::default()
        };
        let annealer = SimulatedAnnealer {
            num_reads: 50,
            sweeps: 300,
            ..SimulatedAnnealer::with_seed(3)
        };
        let report = plan(&problem, &options, &annealer).unwrap();

        let rendered = render_report(&report);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Constellation: ["));
        assert!(lines[0].contains("], Score: "));
        assert_eq!(lines[2], "Total Score: 1");
        assert_eq!(lines[3], "Normalized Score (tot / # constellations): 0.5");
    }
}
