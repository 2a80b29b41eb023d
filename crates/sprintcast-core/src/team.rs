use crate::adjustment::sprint_phrase;
use crate::error::{Result, VelocityError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// RampUpCurve
// ---------------------------------------------------------------------------

/// Productivity trajectory of a newly added team member. Closed variant set;
/// curve names are mapped here at the parse boundary and internal logic
/// never branches on raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampUpCurve {
    Linear,
    Exponential,
    Step,
}

impl RampUpCurve {
    pub fn as_str(self) -> &'static str {
        match self {
            RampUpCurve::Linear => "linear",
            RampUpCurve::Exponential => "exponential",
            RampUpCurve::Step => "step",
        }
    }
}

impl fmt::Display for RampUpCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RampUpCurve {
    type Err = VelocityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(RampUpCurve::Linear),
            "exponential" => Ok(RampUpCurve::Exponential),
            "step" => Ok(RampUpCurve::Step),
            other => Err(VelocityError::UnknownCurve(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TeamChange
// ---------------------------------------------------------------------------

/// A step change in team headcount with a productivity ramp-up curve.
/// Departures take full effect immediately: `ramp_up_sprints` is forced to 0
/// when `change` is negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamChange {
    pub sprint: u32,
    /// Signed headcount delta; fractional values model part-time members.
    pub change: f64,
    pub ramp_up_sprints: u32,
    pub curve: RampUpCurve,
}

impl TeamChange {
    pub fn new(sprint: u32, change: f64, ramp_up_sprints: u32, curve: RampUpCurve) -> Result<Self> {
        if sprint < 1 {
            return Err(VelocityError::SprintBeforeNext(sprint));
        }
        if change == 0.0 {
            return Err(VelocityError::ZeroChange);
        }
        let ramp_up_sprints = if change < 0.0 { 0 } else { ramp_up_sprints };
        Ok(Self {
            sprint,
            change,
            ramp_up_sprints,
            curve,
        })
    }

    /// Fraction of full productivity the new member contributes
    /// `sprints_since_change` sprints after joining. Always 1.0 for
    /// departures.
    pub fn productivity_factor(&self, sprints_since_change: u32) -> f64 {
        if self.change < 0.0 {
            return 1.0;
        }
        if sprints_since_change >= self.ramp_up_sprints {
            return 1.0;
        }
        let progress = sprints_since_change as f64 / self.ramp_up_sprints as f64;
        match self.curve {
            RampUpCurve::Linear => 0.25 + 0.75 * progress,
            RampUpCurve::Exponential => 0.25 + 0.75 * progress * progress,
            RampUpCurve::Step => {
                let rung = (sprints_since_change * 4 / self.ramp_up_sprints).min(3);
                0.25 * (rung + 1) as f64
            }
        }
    }

    pub fn describe(&self) -> String {
        let headcount = format_headcount(self.change.abs());
        let noun = if self.change.abs() == 1.0 {
            "developer"
        } else {
            "developers"
        };
        if self.change > 0.0 {
            let mut s = format!(
                "Adding {} {} at {}",
                headcount,
                noun,
                sprint_phrase(self.sprint)
            );
            if self.ramp_up_sprints > 0 {
                s.push_str(&format!(
                    " (ramp-up: {} sprints, {} curve)",
                    self.ramp_up_sprints, self.curve
                ));
            }
            s
        } else {
            format!(
                "Removing {} {} after {}",
                headcount,
                noun,
                sprint_phrase(self.sprint)
            )
        }
    }
}

fn format_headcount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ---------------------------------------------------------------------------
// Spec-string parsing: sprint:N,change:C[,ramp:R][,curve:TYPE]
// ---------------------------------------------------------------------------

fn change_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap())
}

impl FromStr for TeamChange {
    type Err = VelocityError;

    fn from_str(spec: &str) -> Result<Self> {
        let mut sprint = None;
        let mut change = None;
        let mut ramp = 0u32;
        let mut curve = RampUpCurve::Linear;

        for part in spec.split(',') {
            let (key, value) = part
                .split_once(':')
                .ok_or_else(|| VelocityError::InvalidTeamChangeSpec(spec.to_string()))?;
            let value = value.trim();
            match key.trim() {
                "sprint" => {
                    sprint = Some(value.parse::<u32>().map_err(|_| {
                        VelocityError::InvalidField {
                            field: "sprint".to_string(),
                            value: value.to_string(),
                        }
                    })?);
                }
                "change" => {
                    if !change_re().is_match(value) {
                        return Err(VelocityError::InvalidField {
                            field: "change".to_string(),
                            value: value.to_string(),
                        });
                    }
                    change = Some(value.parse::<f64>().map_err(|_| {
                        VelocityError::InvalidField {
                            field: "change".to_string(),
                            value: value.to_string(),
                        }
                    })?);
                }
                "ramp" => {
                    ramp = value.parse().map_err(|_| VelocityError::InvalidField {
                        field: "ramp".to_string(),
                        value: value.to_string(),
                    })?;
                }
                "curve" => curve = value.parse()?,
                other => {
                    return Err(VelocityError::InvalidField {
                        field: other.to_string(),
                        value: value.to_string(),
                    })
                }
            }
        }

        let sprint = sprint.ok_or_else(|| VelocityError::MissingField {
            field: "sprint".to_string(),
            spec: spec.to_string(),
        })?;
        let change = change.ok_or_else(|| VelocityError::MissingField {
            field: "change".to_string(),
            spec: spec.to_string(),
        })?;
        Self::new(sprint, change, ramp, curve)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
