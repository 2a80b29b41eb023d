use crate::input::load_history;
use crate::output::{print_json, print_kv, print_table};
use sprintcast_core::{VelocityAnalysisConfig, VelocityAnalyzer};
use std::path::Path;

pub fn run(history: &Path, config: &VelocityAnalysisConfig, json: bool) -> anyhow::Result<()> {
    config.validate()?;
    let data = load_history(history)?;
    tracing::debug!(sprints = data.len(), "loaded velocity history");

    let result = VelocityAnalyzer::new(config.clone()).analyze(&data);

    if json {
        return print_json(&result);
    }

    print_kv(&[
        (
            "Sprints",
            format!(
                "{} total, {} used, {} outliers removed",
                result.all_velocities.len(),
                result.filtered_velocities.len(),
                result.outliers_removed.len()
            ),
        ),
        ("Average velocity", format!("{:.1}", result.average_velocity)),
        ("Median velocity", format!("{:.1}", result.median_velocity)),
        ("Std dev", format!("{:.1}", result.std_dev)),
        ("Trend", format!("{:+.2} points/sprint", result.trend)),
        (
            "Confidence",
            format!("{:.0}%", result.confidence_level * 100.0),
        ),
        (
            "Sprint cadence",
            format!("{} days", result.sprint_duration_days),
        ),
    ]);

    if !result.filtered_velocities.is_empty() {
        println!();
        let rows = result
            .filtered_velocities
            .iter()
            .map(|p| {
                vec![
                    p.sprint_name.clone(),
                    p.sprint_date.format("%Y-%m-%d").to_string(),
                    format!("{:.1}", p.completed_points),
                    p.issue_count.to_string(),
                ]
            })
            .collect();
        print_table(&["Sprint", "Date", "Points", "Issues"], rows);
    }

    for outlier in &result.outliers_removed {
        println!(
            "outlier removed: {} ({:.1} points)",
            outlier.sprint_name, outlier.completed_points
        );
    }

    Ok(())
}
