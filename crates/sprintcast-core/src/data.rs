use crate::error::{Result, VelocityError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VelocityDataPoint
// ---------------------------------------------------------------------------

/// One sprint's observed throughput. Produced by a sprint-extraction
/// collaborator, consumed read-only by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityDataPoint {
    pub sprint_name: String,
    pub sprint_date: DateTime<Utc>,
    pub completed_points: f64,
    pub issue_count: u32,
}

impl VelocityDataPoint {
    pub fn new(
        sprint_name: impl Into<String>,
        sprint_date: DateTime<Utc>,
        completed_points: f64,
        issue_count: u32,
    ) -> Self {
        Self {
            sprint_name: sprint_name.into(),
            sprint_date,
            completed_points,
            issue_count,
        }
    }

    /// Whole days between `now` and the sprint date. Negative for
    /// future-dated sprints; filters must tolerate that.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.sprint_date).num_days()
    }
}

// ---------------------------------------------------------------------------
// VelocityAnalysisConfig
// ---------------------------------------------------------------------------

/// Tunable filtering parameters for the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityAnalysisConfig {
    /// Keep only the most recent N sprints after filtering. 0 = no limit.
    pub lookback_sprints: usize,
    /// Z-score threshold beyond which a point is treated as an outlier.
    pub outlier_std_devs: f64,
    /// Sprints older than this many days are dropped before analysis.
    pub max_age_days: i64,
    pub min_velocity: f64,
    pub max_velocity: f64,
}

impl Default for VelocityAnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_sprints: 0,
            outlier_std_devs: 3.0,
            max_age_days: 365,
            min_velocity: 0.0,
            max_velocity: 1000.0,
        }
    }
}

impl VelocityAnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.outlier_std_devs <= 0.0 {
            return Err(VelocityError::InvalidConfig(format!(
                "outlier_std_devs must be positive, got {}",
                self.outlier_std_devs
            )));
        }
        if self.max_age_days < 0 {
            return Err(VelocityError::InvalidConfig(format!(
                "max_age_days must be non-negative, got {}",
                self.max_age_days
            )));
        }
        if self.min_velocity > self.max_velocity {
            return Err(VelocityError::InvalidConfig(format!(
                "min_velocity {} exceeds max_velocity {}",
                self.min_velocity, self.max_velocity
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// VelocityAnalysisResult
// ---------------------------------------------------------------------------

/// Output of one analyzer run. `filtered_velocities` and `outliers_removed`
/// are disjoint subsets of the age/bound-filtered input; bound-rejected
/// points are dropped entirely and appear only in `all_velocities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityAnalysisResult {
    pub all_velocities: Vec<VelocityDataPoint>,
    pub filtered_velocities: Vec<VelocityDataPoint>,
    pub outliers_removed: Vec<VelocityDataPoint>,
    pub average_velocity: f64,
    pub std_dev: f64,
    pub median_velocity: f64,
    /// OLS slope of completed points against sprint index.
    pub trend: f64,
    /// 0.0..=1.0, penalized for sparse data, outliers, and high variance.
    pub confidence_level: f64,
    /// Detected cadence in days, always a multiple of 7 in 7..=28.
    pub sprint_duration_days: i64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(name: &str, date: &str, points: f64) -> VelocityDataPoint {
        VelocityDataPoint::new(
            name,
            date.parse::<DateTime<Utc>>().unwrap(),
            points,
            (points / 2.0) as u32,
        )
    }

    #[test]
    fn age_days_for_past_and_future_dates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let past = point("S1", "2026-02-15T00:00:00Z", 20.0);
        let future = point("S2", "2026-03-15T00:00:00Z", 20.0);
        assert_eq!(past.age_days(now), 14);
        assert_eq!(future.age_days(now), -14);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(VelocityAnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_inverted_bounds() {
        let config = VelocityAnalysisConfig {
            min_velocity: 50.0,
            max_velocity: 10.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_velocity"));
    }

    #[test]
    fn config_rejects_non_positive_outlier_threshold() {
        let config = VelocityAnalysisConfig {
            outlier_std_devs: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn data_point_yaml_roundtrip() {
        let p = point("Sprint 42", "2026-01-05T00:00:00Z", 34.5);
        let yaml = serde_yaml::to_string(&p).unwrap();
        assert!(yaml.contains("Sprint 42"));
        let parsed: VelocityDataPoint = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn data_point_json_roundtrip() {
        let p = point("Sprint 7", "2025-11-17T00:00:00Z", 21.0);
        let json = serde_json::to_string(&p).unwrap();
        let parsed: VelocityDataPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, p);
    }
}
