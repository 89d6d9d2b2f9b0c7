use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use ziround_core::check::{count_unrounded, total_fractionality, violations};
use ziround_core::{Problem, Rounder, RoundingConfig, RoundingOutcome, Termination};
use ziround_lp::{Relaxation, RelaxationStatus, SimplexSolver};
use ziround_model::{Model, PointFile};

#[derive(Parser)]
#[command(name = "ziround")]
#[command(about = "ZI-Round rounding heuristic for mixed-integer programs", long_about = None)]
struct Cli {
    /// Log verbosity on stderr; RUST_LOG overrides
    #[arg(short, long, value_enum, default_value = "normal", global = true)]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

/// Verbosity level
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings and errors
    Normal,
    /// Progress messages
    Verbose,
    /// One line per rounding pass
    Debug,
    /// One line per shifted or skipped variable
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Round a fractional point of a model toward integrality
    Round {
        /// Model file (.mps or .json)
        model: PathBuf,
        /// Start point as JSON `{"values": {name: value}}`; the LP relaxation is used when omitted
        #[arg(short, long)]
        start: Option<PathBuf>,
        /// Let continuous singleton columns absorb slack
        #[arg(long)]
        singletons: bool,
        /// Also move integral variables when that improves the objective
        #[arg(long)]
        shift_integral: bool,
        /// Hold integral moves until every variable is rounded
        #[arg(long)]
        wait_zero: bool,
        /// Break fractional ties toward the worse objective
        #[arg(long)]
        worst: bool,
        /// Maximum number of passes (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_rounds: usize,
        /// Wall-clock limit in seconds, checked between passes
        #[arg(long)]
        time_limit: Option<f64>,
        /// Recompute all invariants after every pass
        #[arg(long)]
        audit: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
        /// Write the rounded point to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Solve the LP relaxation of a model
    Relax {
        /// Model file (.mps or .json)
        model: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Check a model, and optionally the feasibility of a point
    Check {
        /// Model file (.mps or .json)
        model: PathBuf,
        /// Point to check as JSON `{"values": {name: value}}`
        #[arg(short, long)]
        solution: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct RoundReport<'a> {
    model: &'a str,
    start: &'static str,
    objective_value: f64,
    fractionality: f64,
    num_unrounded: usize,
    rounds: usize,
    shifts: usize,
    termination: Termination,
    values: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct RelaxReport<'a> {
    model: &'a str,
    #[serde(flatten)]
    relaxation: &'a Relaxation,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Round {
            model,
            start,
            singletons,
            shift_integral,
            wait_zero,
            worst,
            max_rounds,
            time_limit,
            audit,
            format,
            output,
        } => {
            let model = load_model(&model);
            let problem = &model.problem;

            let mut config = RoundingConfig::default()
                .with_singletons(singletons)
                .with_shift_non_fractional(shift_integral)
                .with_wait_until_zero_fractionality(wait_zero)
                .with_worst_objective_tie_break(worst)
                .with_max_rounds(max_rounds)
                .with_audit(audit);
            if let Some(secs) = time_limit {
                match Duration::try_from_secs_f64(secs) {
                    Ok(limit) => config = config.with_time_limit(limit),
                    Err(e) => fail("Invalid time limit", e),
                }
            }

            let (origin, values) = match start {
                Some(path) => match ziround_model::read_point(&path, problem) {
                    Ok(values) => ("file", values),
                    Err(e) => fail("Error reading start point", e),
                },
                None => {
                    let relaxation = SimplexSolver::new().solve(problem);
                    if !relaxation.is_optimal() {
                        fail("Cannot round", status_label(relaxation.status));
                    }
                    ("relaxation", relaxation.values)
                }
            };

            let rounder = match Rounder::new(problem, config) {
                Ok(r) => r,
                Err(e) => fail("Configuration error", e),
            };
            let outcome = match rounder.run(&values) {
                Ok(o) => o,
                Err(e) => fail("Rounding failed", e),
            };

            if let Some(path) = output {
                write_point(&path, problem, &outcome.values);
            }

            match format {
                Format::Json => {
                    let report = RoundReport {
                        model: &model.name,
                        start: origin,
                        objective_value: outcome.objective_value,
                        fractionality: outcome.fractionality,
                        num_unrounded: outcome.num_unrounded,
                        rounds: outcome.rounds,
                        shifts: outcome.shifts,
                        termination: outcome.termination,
                        values: PointFile::from_values(problem, &outcome.values).values,
                    };
                    print_json(&report);
                }
                Format::Pretty => print_outcome(&model, origin, &outcome),
            }
        }
        Commands::Relax { model, format } => {
            let model = load_model(&model);
            let relaxation = SimplexSolver::new().solve(&model.problem);

            match format {
                Format::Json => print_json(&RelaxReport {
                    model: &model.name,
                    relaxation: &relaxation,
                }),
                Format::Pretty => {
                    println!("Model: {}", model.name);
                    println!("Status: {}", status_label(relaxation.status));
                    if relaxation.is_optimal() || relaxation.status == RelaxationStatus::IterationLimit {
                        println!("Objective: {:.6}", relaxation.objective_value);
                        println!();
                        print_values(&model.problem, &relaxation.values);
                    }
                }
            }

            match relaxation.status {
                RelaxationStatus::Optimal => {}
                _ => std::process::exit(1),
            }
        }
        Commands::Check { model: path, solution } => {
            let model = match ziround_model::load(&path) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("✗ {} has errors:", path.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };
            let problem = &model.problem;

            println!("✓ {} is valid", path.display());
            println!("  {} variables ({} integral)", problem.ncols(), problem.num_integral());
            println!("  {} constraints", problem.nrows());
            println!("  {} nonzeros", problem.matrix().nnz());

            if let Some(solution) = solution {
                let values = match ziround_model::read_point(&solution, problem) {
                    Ok(v) => v,
                    Err(e) => fail("Error reading solution", e),
                };
                let tol = ziround_core::DEFAULT_TOLERANCE;
                let found = violations(problem, &values, tol);

                println!();
                println!("Solution: {}", solution.display());
                println!("  objective {:.6}", problem.objective_value(&values));
                println!(
                    "  fractionality {:.6} ({} unrounded)",
                    total_fractionality(problem, &values),
                    count_unrounded(problem, &values, tol)
                );
                if found.is_empty() {
                    println!("  ✓ feasible");
                } else {
                    println!("  ✗ {} violations:", found.len());
                    for v in &found {
                        println!("    - {}", v.description);
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::Debug => "debug",
        Verbosity::Trace => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

fn load_model(path: &Path) -> Model {
    match ziround_model::load(path) {
        Ok(m) => m,
        Err(e) => fail("Error loading model", e),
    }
}

fn write_point(path: &Path, problem: &Problem, values: &[f64]) {
    let point = PointFile::from_values(problem, values);
    let json = match serde_json::to_string_pretty(&point) {
        Ok(s) => s,
        Err(e) => fail("Error encoding solution", e),
    };
    if let Err(e) = std::fs::write(path, json) {
        fail("Error writing solution", e);
    }
    tracing::info!(path = %path.display(), "wrote rounded point");
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => fail("Error encoding output", e),
    }
}

fn status_label(status: RelaxationStatus) -> &'static str {
    match status {
        RelaxationStatus::Optimal => "OPTIMAL",
        RelaxationStatus::Infeasible => "INFEASIBLE",
        RelaxationStatus::Unbounded => "UNBOUNDED",
        RelaxationStatus::IterationLimit => "ITERATION LIMIT",
    }
}

fn print_outcome(model: &Model, origin: &str, outcome: &RoundingOutcome) {
    println!("Model: {}", model.name);
    println!("Start: {}", origin);
    println!();

    if outcome.is_integral() {
        println!("Status: ROUNDED");
    } else {
        println!("Status: PARTIAL ({} variables still fractional)", outcome.num_unrounded);
    }
    println!("Objective: {:.6}", outcome.objective_value);
    println!("Fractionality: {:.6}", outcome.fractionality);
    let stop = match outcome.termination {
        Termination::Fixpoint => "fixpoint",
        Termination::RoundLimit => "round limit",
        Termination::TimeLimit => "time limit",
    };
    println!("Rounds: {} ({} shifts, stopped at {})", outcome.rounds, outcome.shifts, stop);
    println!();
    print_values(&model.problem, &outcome.values);
}

fn print_values(problem: &Problem, values: &[f64]) {
    println!("Values:");
    for (j, &v) in values.iter().enumerate() {
        if v.abs() > 1e-9 {
            let marker = if problem.is_integral(j) { "i" } else { " " };
            println!("  {:20} {} {:14.6}", problem.var_name(j), marker, v);
        }
    }
}
