use crate::input::load_history;
use crate::output::{print_json, print_kv};
use crate::simulate::Simulator;
use sprintcast_core::{
    ScenarioComparison, TeamChange, VelocityAdjustment, VelocityAnalysisConfig, VelocityAnalyzer,
    VelocityScenario,
};
use std::path::Path;

pub struct ScenarioRun<'a> {
    pub history: &'a Path,
    pub config: &'a VelocityAnalysisConfig,
    pub backlog: f64,
    pub name: &'a str,
    pub adjustments: &'a [String],
    pub team_changes: &'a [String],
    pub team_size: f64,
    pub trials: u32,
    pub seed: Option<u64>,
    pub json: bool,
}

pub fn run(args: ScenarioRun<'_>) -> anyhow::Result<()> {
    args.config.validate()?;
    if args.backlog <= 0.0 {
        anyhow::bail!("backlog must be positive, got {}", args.backlog);
    }

    // A malformed spec is rejected here, before anything enters the
    // scenario.
    let adjustments: Vec<VelocityAdjustment> = args
        .adjustments
        .iter()
        .map(|spec| spec.parse())
        .collect::<Result<_, _>>()?;
    let team_changes: Vec<TeamChange> = args
        .team_changes
        .iter()
        .map(|spec| spec.parse())
        .collect::<Result<_, _>>()?;
    let scenario = VelocityScenario::new(args.name, adjustments, team_changes);
    if scenario.is_empty() {
        tracing::warn!("scenario has no adjustments or team changes");
    }

    let data = load_history(args.history)?;
    let analysis = VelocityAnalyzer::new(args.config.clone()).analyze(&data);
    if analysis.average_velocity <= 0.0 {
        anyhow::bail!(
            "no usable velocity history in {}: average velocity is {}",
            args.history.display(),
            analysis.average_velocity
        );
    }

    // Same seed for both runs so the comparison sees identical draws.
    let baseline = Simulator::new(args.seed).forecast(&analysis, args.backlog, args.trials);
    let adjusted = Simulator::new(args.seed).forecast_scenario(
        &analysis,
        &scenario,
        args.team_size,
        args.backlog,
        args.trials,
    );

    let comparison = ScenarioComparison {
        baseline_p50_sprints: baseline.p50_sprints,
        baseline_p85_sprints: baseline.p85_sprints,
        adjusted_p50_sprints: adjusted.p50_sprints,
        adjusted_p85_sprints: adjusted.p85_sprints,
        velocity_impact_percentage: velocity_impact(
            &scenario,
            analysis.average_velocity,
            args.team_size,
            baseline.p85_sprints,
        ),
        scenario_description: scenario.summary(args.team_size),
    };

    if args.json {
        return print_json(&comparison);
    }

    print_kv(&[
        ("Scenario", args.name.to_string()),
        ("Changes", comparison.scenario_description.clone()),
        (
            "Baseline",
            format!(
                "p50 {} sprints (by {}), p85 {} sprints (by {})",
                baseline.p50_sprints, baseline.p50_date, baseline.p85_sprints, baseline.p85_date
            ),
        ),
        (
            "Adjusted",
            format!(
                "p50 {} sprints (by {}), p85 {} sprints (by {})",
                adjusted.p50_sprints, adjusted.p50_date, adjusted.p85_sprints, adjusted.p85_date
            ),
        ),
        (
            "Velocity impact",
            format!("{:+.1}%", comparison.velocity_impact_percentage),
        ),
        ("Impact", comparison.get_impact_summary()),
    ]);
    Ok(())
}

/// Percentage change of the mean adjusted velocity over the baseline-p85
/// horizon relative to the baseline average.
fn velocity_impact(
    scenario: &VelocityScenario,
    average_velocity: f64,
    team_size: f64,
    horizon_sprints: u32,
) -> f64 {
    if average_velocity <= 0.0 {
        return 0.0;
    }
    let horizon = horizon_sprints.max(1);
    let total: f64 = (1..=horizon)
        .map(|sprint| {
            scenario
                .adjusted_velocity(sprint, average_velocity, team_size)
                .0
        })
        .sum();
    (total / horizon as f64 / average_velocity - 1.0) * 100.0
}
