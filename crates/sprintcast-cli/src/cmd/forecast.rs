use crate::input::load_history;
use crate::output::{print_json, print_kv};
use crate::simulate::Simulator;
use sprintcast_core::{VelocityAnalysisConfig, VelocityAnalyzer};
use std::path::Path;

pub fn run(
    history: &Path,
    config: &VelocityAnalysisConfig,
    backlog: f64,
    trials: u32,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    config.validate()?;
    if backlog <= 0.0 {
        anyhow::bail!("backlog must be positive, got {}", backlog);
    }

    let data = load_history(history)?;
    let analysis = VelocityAnalyzer::new(config.clone()).analyze(&data);
    if analysis.average_velocity <= 0.0 {
        anyhow::bail!(
            "no usable velocity history in {}: average velocity is {}",
            history.display(),
            analysis.average_velocity
        );
    }

    let report = Simulator::new(seed).forecast(&analysis, backlog, trials);

    if json {
        return print_json(&report);
    }

    print_kv(&[
        ("Backlog", format!("{:.0} points", backlog)),
        (
            "Average velocity",
            format!(
                "{:.1} (confidence {:.0}%)",
                analysis.average_velocity,
                analysis.confidence_level * 100.0
            ),
        ),
        (
            "50% confidence",
            format!("{} sprints, by {}", report.p50_sprints, report.p50_date),
        ),
        (
            "85% confidence",
            format!("{} sprints, by {}", report.p85_sprints, report.p85_date),
        ),
    ]);
    Ok(())
}
