use crate::error::{Result, VelocityError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Sprint phrasing
// ---------------------------------------------------------------------------

/// Human phrase for a 1-indexed future sprint number. Sprint 1 is the next
/// sprint from now.
pub(crate) fn sprint_phrase(n: u32) -> String {
    match n {
        1 => "next sprint".to_string(),
        2 => "sprint after next".to_string(),
        k => format!("sprint +{}", k - 1),
    }
}

// ---------------------------------------------------------------------------
// VelocityAdjustment
// ---------------------------------------------------------------------------

/// A time-boxed multiplicative capacity modifier, e.g. "50% capacity for
/// sprints 5-7". Sprint numbers are 1-indexed relative to the next sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityAdjustment {
    pub sprint_start: u32,
    /// None means the adjustment applies forever.
    pub sprint_end: Option<u32>,
    pub factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VelocityAdjustment {
    pub fn new(
        sprint_start: u32,
        sprint_end: Option<u32>,
        factor: f64,
        reason: Option<String>,
    ) -> Result<Self> {
        if sprint_start < 1 {
            return Err(VelocityError::SprintBeforeNext(sprint_start));
        }
        if let Some(end) = sprint_end {
            if end < sprint_start {
                return Err(VelocityError::InvertedSprintRange {
                    start: sprint_start,
                    end,
                });
            }
        }
        if factor <= 0.0 {
            return Err(VelocityError::NonPositiveFactor(factor));
        }
        Ok(Self {
            sprint_start,
            sprint_end,
            factor,
            reason,
        })
    }

    pub fn applies_to_sprint(&self, sprint_number: u32) -> bool {
        sprint_number >= self.sprint_start
            && self.sprint_end.map_or(true, |end| sprint_number <= end)
    }

    /// Fixed-vocabulary display string, e.g.
    /// `50% capacity for sprint +2 (vacation)`.
    pub fn describe(&self) -> String {
        let pct = (self.factor * 100.0).round() as i64;
        let window = match self.sprint_end {
            None => format!("from {} onwards", sprint_phrase(self.sprint_start)),
            Some(end) if end == self.sprint_start => {
                format!("for {}", sprint_phrase(self.sprint_start))
            }
            Some(end) if self.sprint_start == 1 => format!("for next {} sprints", end),
            Some(end) => format!(
                "for {} through {}",
                sprint_phrase(self.sprint_start),
                sprint_phrase(end)
            ),
        };
        match &self.reason {
            Some(reason) => format!("{}% capacity {} ({})", pct, window, reason),
            None => format!("{}% capacity {}", pct, window),
        }
    }
}

// ---------------------------------------------------------------------------
// Spec-string parsing: sprint:N[-M|+],factor:F[,reason:R]
// ---------------------------------------------------------------------------

fn sprint_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:-(\d+)|(\+))?$").unwrap())
}

impl FromStr for VelocityAdjustment {
    type Err = VelocityError;

    fn from_str(spec: &str) -> Result<Self> {
        let mut sprint_start = None;
        let mut sprint_end = None;
        let mut open_ended = false;
        let mut factor = None;
        let mut reason = None;

        for part in spec.split(',') {
            let (key, value) = part
                .split_once(':')
                .ok_or_else(|| VelocityError::InvalidAdjustmentSpec(spec.to_string()))?;
            match key.trim() {
                "sprint" => {
                    let caps = sprint_range_re().captures(value.trim()).ok_or_else(|| {
                        VelocityError::InvalidField {
                            field: "sprint".to_string(),
                            value: value.trim().to_string(),
                        }
                    })?;
                    let start: u32 =
                        caps[1].parse().map_err(|_| VelocityError::InvalidField {
                            field: "sprint".to_string(),
                            value: value.trim().to_string(),
                        })?;
                    sprint_start = Some(start);
                    if let Some(end) = caps.get(2) {
                        sprint_end =
                            Some(end.as_str().parse().map_err(|_| {
                                VelocityError::InvalidField {
                                    field: "sprint".to_string(),
                                    value: value.trim().to_string(),
                                }
                            })?);
                    } else if caps.get(3).is_some() {
                        open_ended = true;
                    }
                }
                "factor" => {
                    factor = Some(value.trim().parse::<f64>().map_err(|_| {
                        VelocityError::InvalidField {
                            field: "factor".to_string(),
                            value: value.trim().to_string(),
                        }
                    })?);
                }
                "reason" => reason = Some(value.trim().to_string()),
                other => {
                    return Err(VelocityError::InvalidField {
                        field: other.to_string(),
                        value: value.to_string(),
                    })
                }
            }
        }

        let start = sprint_start.ok_or_else(|| VelocityError::MissingField {
            field: "sprint".to_string(),
            spec: spec.to_string(),
        })?;
        let factor = factor.ok_or_else(|| VelocityError::MissingField {
            field: "factor".to_string(),
            spec: spec.to_string(),
        })?;
        // A bare sprint:N means a single-sprint window; N+ means open-ended.
        let end = if open_ended { None } else { Some(sprint_end.unwrap_or(start)) };
        Self::new(start, end, factor, reason)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_within_closed_window() {
        let adj = VelocityAdjustment::new(3, Some(5), 0.8, None).unwrap();
        assert!(!adj.applies_to_sprint(2));
        assert!(adj.applies_to_sprint(3));
        assert!(adj.applies_to_sprint(5));
        assert!(!adj.applies_to_sprint(6));
    }

    #[test]
    fn applies_forever_with_open_end() {
        let adj = VelocityAdjustment::new(4, None, 1.2, None).unwrap();
        assert!(!adj.applies_to_sprint(3));
        assert!(adj.applies_to_sprint(4));
        assert!(adj.applies_to_sprint(400));
    }

    #[test]
    fn describe_single_sprint_with_reason() {
        let adj =
            VelocityAdjustment::new(3, Some(3), 0.5, Some("vacation".to_string())).unwrap();
        assert_eq!(adj.describe(), "50% capacity for sprint +2 (vacation)");
    }

    #[test]
    fn describe_next_sprint_and_sprint_after_next() {
        let adj = VelocityAdjustment::new(1, Some(1), 0.75, None).unwrap();
        assert_eq!(adj.describe(), "75% capacity for next sprint");

        let adj = VelocityAdjustment::new(2, Some(2), 1.25, None).unwrap();
        assert_eq!(adj.describe(), "125% capacity for sprint after next");
    }

    #[test]
    fn describe_open_ended() {
        let adj = VelocityAdjustment::new(2, None, 0.9, None).unwrap();
        assert_eq!(adj.describe(), "90% capacity from sprint after next onwards");
    }

    #[test]
    fn describe_window_from_next_sprint_collapses() {
        let adj = VelocityAdjustment::new(1, Some(3), 0.6, None).unwrap();
        assert_eq!(adj.describe(), "60% capacity for next 3 sprints");
    }

    #[test]
    fn describe_range() {
        let adj = VelocityAdjustment::new(3, Some(5), 0.5, None).unwrap();
        assert_eq!(adj.describe(), "50% capacity for sprint +2 through sprint +4");
    }

    #[test]
    fn parse_single_sprint() {
        let adj: VelocityAdjustment = "sprint:3,factor:0.5,reason:vacation".parse().unwrap();
        assert_eq!(adj.sprint_start, 3);
        assert_eq!(adj.sprint_end, Some(3));
        assert_eq!(adj.factor, 0.5);
        assert_eq!(adj.reason.as_deref(), Some("vacation"));
    }

    #[test]
    fn parse_range_and_open_end() {
        let adj: VelocityAdjustment = "sprint:5-7,factor:0.5".parse().unwrap();
        assert_eq!(adj.sprint_start, 5);
        assert_eq!(adj.sprint_end, Some(7));

        let adj: VelocityAdjustment = "sprint:4+,factor:1.1".parse().unwrap();
        assert_eq!(adj.sprint_start, 4);
        assert_eq!(adj.sprint_end, None);
    }

    #[test]
    fn parse_rejects_missing_factor() {
        let err = "sprint:3".parse::<VelocityAdjustment>().unwrap_err();
        assert!(err.to_string().contains("factor"));
    }

    #[test]
    fn parse_rejects_non_positive_factor() {
        let err = "sprint:3,factor:0".parse::<VelocityAdjustment>().unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn parse_rejects_inverted_range() {
        let err = "sprint:7-5,factor:0.5".parse::<VelocityAdjustment>().unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn parse_rejects_sprint_zero() {
        let err = "sprint:0,factor:0.5".parse::<VelocityAdjustment>().unwrap_err();
        assert!(err.to_string().contains("1-indexed"));
    }

    #[test]
    fn parse_rejects_unknown_field() {
        let err = "sprint:3,factor:0.5,speed:9".parse::<VelocityAdjustment>().unwrap_err();
        assert!(err.to_string().contains("speed"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not a spec".parse::<VelocityAdjustment>().is_err());
        assert!("sprint:abc,factor:0.5".parse::<VelocityAdjustment>().is_err());
    }
}
