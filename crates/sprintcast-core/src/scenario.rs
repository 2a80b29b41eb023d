use crate::adjustment::VelocityAdjustment;
use crate::team::TeamChange;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VelocityScenario
// ---------------------------------------------------------------------------

/// A named bundle of velocity adjustments and team changes applied against a
/// baseline forecast. Adjustments and team changes are independent,
/// order-irrelevant collections; both layers compound multiplicatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityScenario {
    pub name: String,
    pub adjustments: Vec<VelocityAdjustment>,
    pub team_changes: Vec<TeamChange>,
}

impl VelocityScenario {
    pub fn new(
        name: impl Into<String>,
        adjustments: Vec<VelocityAdjustment>,
        team_changes: Vec<TeamChange>,
    ) -> Self {
        Self {
            name: name.into(),
            adjustments,
            team_changes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty() && self.team_changes.is_empty()
    }

    /// Project the velocity for one future sprint, returning the adjusted
    /// value and a display string explaining every applied effect.
    ///
    /// Overlapping adjustments stack multiplicatively in stored list order;
    /// there is no precedence or deduplication rule. Team changes are folded
    /// in stored order carrying the running team size, so a later change's
    /// percentage impact is relative to the headcount after earlier changes.
    pub fn adjusted_velocity(
        &self,
        sprint_number: u32,
        base_velocity: f64,
        team_size: f64,
    ) -> (f64, String) {
        let mut velocity = base_velocity;
        let mut reasons: Vec<String> = vec![];

        for adjustment in &self.adjustments {
            if adjustment.applies_to_sprint(sprint_number) {
                velocity *= adjustment.factor;
                reasons.push(adjustment.describe());
            }
        }

        let (velocity, reasons, _) = self.team_changes.iter().fold(
            (velocity, reasons, team_size),
            |(mut velocity, mut reasons, mut current_team_size), change| {
                if sprint_number >= change.sprint {
                    // A non-positive running team size makes the ratio
                    // undefined; skip the velocity effect but still track
                    // the headcount.
                    if current_team_size > 0.0 {
                        let sprints_since = sprint_number - change.sprint;
                        if change.change > 0.0 {
                            let productivity = change.productivity_factor(sprints_since);
                            let team_factor = (current_team_size + change.change * productivity)
                                / current_team_size;
                            velocity *= team_factor;
                            reasons.push(format!(
                                "+{} team capacity ({}% productive)",
                                format_signed(change.change),
                                (productivity * 100.0).round() as i64
                            ));
                        } else {
                            let team_factor =
                                (current_team_size + change.change) / current_team_size;
                            velocity *= team_factor;
                            reasons.push(format!(
                                "{} team capacity",
                                format_signed(change.change)
                            ));
                        }
                    }
                    current_team_size += change.change;
                }
                (velocity, reasons, current_team_size)
            },
        );

        let description = if reasons.is_empty() {
            "No adjustments".to_string()
        } else {
            reasons.join("; ")
        };
        (velocity, description)
    }

    /// One-line description of every configured effect, for report headers.
    pub fn summary(&self, team_size: f64) -> String {
        let mut parts: Vec<String> = self.adjustments.iter().map(|a| a.describe()).collect();
        parts.extend(self.team_changes.iter().map(|c| c.describe()));
        if parts.is_empty() {
            return "No adjustments applied".to_string();
        }
        if !self.team_changes.is_empty() {
            let final_size: f64 =
                team_size + self.team_changes.iter().map(|c| c.change).sum::<f64>();
            parts.push(format!(
                "team size {} to {}",
                format_size(team_size),
                format_size(final_size)
            ));
        }
        parts.join(" \u{2022} ")
    }
}

fn format_signed(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn format_size(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
