mod cmd;
mod input;
mod output;
mod simulate;

use clap::{Args, Parser, Subcommand};
use sprintcast_core::VelocityAnalysisConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sprintcast",
    about = "Monte Carlo completion forecasts from historical sprint velocity",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Analyzer tuning flags, shared by every subcommand.
#[derive(Args)]
struct AnalysisFlags {
    /// Keep only the most recent N sprints (0 = no limit)
    #[arg(long, default_value_t = 0)]
    lookback: usize,

    /// Z-score threshold for outlier removal
    #[arg(long, default_value_t = 3.0)]
    outlier_std_devs: f64,

    /// Ignore sprints older than this many days
    #[arg(long, default_value_t = 365)]
    max_age_days: i64,

    /// Drop sprints below this velocity
    #[arg(long, default_value_t = 0.0)]
    min_velocity: f64,

    /// Drop sprints above this velocity
    #[arg(long, default_value_t = 1000.0)]
    max_velocity: f64,
}

impl AnalysisFlags {
    fn to_config(&self) -> VelocityAnalysisConfig {
        VelocityAnalysisConfig {
            lookback_sprints: self.lookback,
            outlier_std_devs: self.outlier_std_devs,
            max_age_days: self.max_age_days,
            min_velocity: self.min_velocity,
            max_velocity: self.max_velocity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze historical sprint velocity (filtering, outliers, trend, cadence)
    Analyze {
        /// YAML or JSON file with per-sprint velocity records
        history: PathBuf,

        #[command(flatten)]
        flags: AnalysisFlags,
    },

    /// Forecast when a backlog completes, at 50% and 85% confidence
    Forecast {
        history: PathBuf,

        /// Remaining backlog in story points
        #[arg(long)]
        backlog: f64,

        /// Number of simulation trials
        #[arg(long, default_value_t = 10_000)]
        trials: u32,

        /// RNG seed for reproducible forecasts
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        flags: AnalysisFlags,
    },

    /// Compare a capacity-change scenario against the baseline forecast
    Scenario {
        history: PathBuf,

        /// Remaining backlog in story points
        #[arg(long)]
        backlog: f64,

        /// Scenario name for the report
        #[arg(long, default_value = "scenario")]
        name: String,

        /// Capacity adjustment, e.g. sprint:3,factor:0.5,reason:vacation
        /// or sprint:5-7,factor:0.8 or sprint:4+,factor:1.1 (repeatable)
        #[arg(long = "adjust")]
        adjustments: Vec<String>,

        /// Team change, e.g. sprint:4,change:+1,ramp:4,curve:linear
        /// (repeatable)
        #[arg(long = "team-change")]
        team_changes: Vec<String>,

        /// Current team headcount (may be fractional)
        #[arg(long, default_value_t = 5.0)]
        team_size: f64,

        /// Number of simulation trials
        #[arg(long, default_value_t = 10_000)]
        trials: u32,

        /// RNG seed for reproducible forecasts
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        flags: AnalysisFlags,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Analyze { history, flags } => {
            cmd::analyze::run(&history, &flags.to_config(), cli.json)
        }
        Commands::Forecast {
            history,
            backlog,
            trials,
            seed,
            flags,
        } => cmd::forecast::run(&history, &flags.to_config(), backlog, trials, seed, cli.json),
        Commands::Scenario {
            history,
            backlog,
            name,
            adjustments,
            team_changes,
            team_size,
            trials,
            seed,
            flags,
        } => cmd::scenario::run(cmd::scenario::ScenarioRun {
            history: &history,
            config: &flags.to_config(),
            backlog,
            name: &name,
            adjustments: &adjustments,
            team_changes: &team_changes,
            team_size,
            trials,
            seed,
            json: cli.json,
        }),
    };

    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
