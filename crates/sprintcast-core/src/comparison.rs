use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ScenarioComparison
// ---------------------------------------------------------------------------

/// Delta between a baseline and an adjusted scenario's forecast outcomes.
/// Pure value object, computed once after both forecasts exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub baseline_p50_sprints: u32,
    pub baseline_p85_sprints: u32,
    pub adjusted_p50_sprints: u32,
    pub adjusted_p85_sprints: u32,
    pub velocity_impact_percentage: f64,
    pub scenario_description: String,
}

impl ScenarioComparison {
    /// Signed p50/p85 deltas formatted for display. Zero deltas are
    /// dropped; if both are zero the timeline is unaffected.
    pub fn get_impact_summary(&self) -> String {
        let parts: Vec<String> = [
            (self.baseline_p50_sprints, self.adjusted_p50_sprints, 50),
            (self.baseline_p85_sprints, self.adjusted_p85_sprints, 85),
        ]
        .iter()
        .filter_map(|&(baseline, adjusted, level)| {
            impact_phrase(adjusted as i64 - baseline as i64, level)
        })
        .collect();

        if parts.is_empty() {
            "No significant impact on timeline".to_string()
        } else {
            parts.join(" and ")
        }
    }
}

fn impact_phrase(delta: i64, level: u32) -> Option<String> {
    if delta == 0 {
        return None;
    }
    let count = delta.abs();
    let noun = if count == 1 { "sprint" } else { "sprints" };
    let direction = if delta > 0 { "delay" } else { "earlier" };
    Some(format!(
        "{} {} {} at {}% confidence",
        count, noun, direction, level
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
