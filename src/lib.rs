//! Diet planning with linear programming
//!
//! This library builds and solves the classic fast-food diet problem: buy servings
//! of foods at minimum cost while the total of every nutrient stays within its daily
//! range. After the first solve, a limit on the combined servings of dairy foods is
//! appended and the refined model is solved again on the same session.
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use dietlp::data::ProblemData;
//! use dietlp::diet::SolveOrchestrator;
//! use dietlp::lp_solver::SolverBackend;
//! use dietlp::report::WriteSink;
//!
//! let session = SolverBackend::from_env_or_default()?.open()?;
//! let mut sink = WriteSink::new(std::io::stdout());
//!
//! let summary = SolveOrchestrator::new(session, ProblemData::standard()).run(&mut sink)?;
//! assert_eq!(summary.outcomes.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **[`data`]**: Nutrition categories, foods and the standard dataset
//! - **[`diet`]**: Variables, model construction and the two-solve run
//! - **[`lp_solver`]**: Linear programming solver abstraction layer
//! - **[`report`]**: Line sinks and table rendering
//! - **[`error`]**: Error types and their numeric codes

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod data;
pub mod diet;
pub mod error;
pub mod lp_solver;
pub mod report;

pub use data::{FoodType, NutritionCategory, ProblemData};
pub use diet::{FoodLimit, RunSummary, SolveOrchestrator};
pub use error::{DietError, ModelError};
pub use lp_solver::{SolverBackend, SolverError};

/// How the report is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// One line per value, in solve order
    #[default]
    Plain,
    /// One table per solve
    Table,
}

/// Command-line arguments of the diet solver.
#[derive(Debug, Parser)]
#[clap(
    name = "dietlp",
    about = "Solve the fast-food diet problem, then solve it again with a dairy limit"
)]
pub struct CLIArguments {
    /// LP solver backend (microlp, coin_cbc); defaults to DIETLP_SOLVER, then the first one built in
    #[clap(long)]
    pub solver: Option<String>,

    /// Most servings of milk and ice cream together in the refined model
    #[clap(long, default_value_t = 6.0)]
    pub dairy_limit: f64,

    /// Report format
    #[clap(long, value_enum, default_value_t = ReportFormat::Plain)]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Log more; repeat for more detail
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dietlp={level}")));

    // Only the first call installs; later calls log through the existing subscriber
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
    {
        tracing::debug!("keeping the installed log subscriber: {err}");
    }
}

fn open_output(output: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => {
            let file = fs::File::create(path)
                .map_err(DietError::from)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    })
}

/// Run both solves and write the report.
pub fn diet_main(args: CLIArguments) -> Result<()> {
    let CLIArguments {
        solver,
        dairy_limit,
        format,
        ref output,
        ..
    } = args;
    ensure!(
        dairy_limit.is_finite() && dairy_limit >= 0.0,
        "dairy limit must be a non-negative number of servings, got {dairy_limit}"
    );

    let backend = match solver {
        Some(name) => SolverBackend::from_name(&name),
        None => SolverBackend::from_env_or_default(),
    }
    .map_err(DietError::from)?;
    let session = backend.open().map_err(DietError::from)?;
    info!(?backend, ?format, "starting diet run");

    let orchestrator = SolveOrchestrator::new(session, ProblemData::standard())
        .with_limit(FoodLimit::dairy().with_max(dairy_limit));
    let mut out = open_output(output.as_ref())?;

    match format {
        ReportFormat::Plain => {
            let mut sink = report::WriteSink::new(&mut out);
            orchestrator.run(&mut sink)?;
            sink.flush().map_err(DietError::from)?;
        }
        ReportFormat::Table => {
            let mut lines: Vec<String> = Vec::new();
            let summary = orchestrator.run(&mut lines)?;
            report::render_table(&summary, &mut out).map_err(DietError::from)?;
            out.flush().map_err(DietError::from)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arguments() {
        let args = CLIArguments::parse_from(["dietlp"]);
        assert_eq!(args.solver, None);
        assert_eq!(args.dairy_limit, 6.0);
        assert_eq!(args.format, ReportFormat::Plain);
        assert_eq!(args.output, None);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_all_arguments() {
        let args = CLIArguments::parse_from([
            "dietlp",
            "--solver",
            "cbc",
            "--dairy-limit",
            "8.5",
            "--format",
            "table",
            "-o",
            "report.txt",
            "-vv",
        ]);
        assert_eq!(args.solver.as_deref(), Some("cbc"));
        assert_eq!(args.dairy_limit, 8.5);
        assert_eq!(args.format, ReportFormat::Table);
        assert_eq!(args.output, Some(PathBuf::from("report.txt")));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_repeated_init_tracing_is_harmless() {
        init_tracing(0);
        // The second install fails and must only be logged
        init_tracing(3);
        tracing::warn!("logging still works after a repeated init");
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let args = CLIArguments::parse_from(["dietlp", "--dairy-limit=-1"]);
        let err = diet_main(args).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_unknown_solver_has_code() {
        let args = CLIArguments::parse_from(["dietlp", "--solver", "simplex9000"]);
        let err = diet_main(args).unwrap_err();
        let diet_err = err.downcast_ref::<DietError>().unwrap();
        assert_eq!(diet_err.code(), SolverError::UNAVAILABLE);
    }
}
