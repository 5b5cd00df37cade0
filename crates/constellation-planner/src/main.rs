//! Constellation Planning CLI
//!
//! Usage:
//!   plan-constellations data/small.json anneal
//!   plan-constellations data/large.json hybrid --endpoint https://solver.example.com/v1/sample
//!
//! Prints one line per selected constellation plus total and normalized
//! scores on stdout; all diagnostics go to stderr.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use constellation_planner::{load_problem, render_report, plan, PlanOptions, SolverKind};
use constellation_qubo::{ScoreStrategy, DEFAULT_MAX_CANDIDATES, DEFAULT_SCORE_THRESHOLD};
use constellation_samplers::{
    anneal::{DEFAULT_NUM_READS, DEFAULT_SWEEPS},
    HybridClient, HybridConfig, Sampler, SimulatedAnnealer,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "plan-constellations",
    about = "Partition satellites into constellations via QUBO sampling"
)]
struct Args {
    /// Input problem file (JSON)
    file: PathBuf,

    /// Solver backend: 'anneal' (local) or 'hybrid' (remote service)
    solver: String,

    /// Coverage scoring strategy: 'union' or 'average'
    #[arg(long, default_value = "union")]
    score_strategy: ScoreStrategy,

    /// Discard candidates scoring below this (inclusive keep)
    #[arg(long, default_value_t = DEFAULT_SCORE_THRESHOLD)]
    score_threshold: f64,

    /// Refuse instances with more enumerated candidates than this
    #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
    max_candidates: u64,

    /// Annealing reads (local solver)
    #[arg(long, default_value_t = DEFAULT_NUM_READS)]
    num_reads: u32,

    /// Annealing sweeps per read (local solver)
    #[arg(long, default_value_t = DEFAULT_SWEEPS)]
    sweeps: u32,

    /// RNG seed for reproducible annealing runs
    #[arg(long)]
    seed: Option<u64>,

    /// Hybrid sampling service endpoint
    #[arg(long, default_value = "http://localhost:8400/v1/sample")]
    endpoint: String,

    /// Hybrid request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Also write the full selection report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout is reserved for the report lines
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Resolve the solver token before touching anything else: an
    // unrecognized solver must fail without any file or network work.
    let kind: SolverKind = args.solver.parse()?;

    let problem = load_problem(&args.file)?;

    let sampler: Box<dyn Sampler> = match kind {
        SolverKind::Anneal => Box::new(SimulatedAnnealer {
            num_reads: args.num_reads,
            sweeps: args.sweeps,
            seed: args.seed,
            ..SimulatedAnnealer::default()
        }),
        SolverKind::Hybrid => {
            let mut config = HybridConfig::new(args.endpoint.clone());
            config.timeout = Duration::from_secs(args.timeout_secs);
            config.auth_token = std::env::var("HYBRID_SAMPLER_TOKEN").ok();
            Box::new(HybridClient::new(config))
        }
    };

    let options = PlanOptions {
        strategy: args.score_strategy,
        score_threshold: args.score_threshold,
        max_candidates: args.max_candidates,
    };

    let report = plan(&problem, &options, sampler.as_ref())?;

    print!("{}", render_report(&report));

    if let Some(path) = &args.output {
        info!("Writing selection report to {:?}", path);
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &report)?;
    }

    Ok(())
}
