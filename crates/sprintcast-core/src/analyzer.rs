use crate::data::{VelocityAnalysisConfig, VelocityAnalysisResult, VelocityDataPoint};
use crate::stats;
use chrono::{DateTime, Utc};

const DEFAULT_SPRINT_DURATION_DAYS: i64 = 14;

// ---------------------------------------------------------------------------
// VelocityAnalyzer
// ---------------------------------------------------------------------------

/// Filters raw velocity observations, removes statistical outliers, computes
/// trend and confidence, and detects sprint cadence.
///
/// The pipeline never errors on degenerate input: an empty series yields a
/// zeroed result, and each filter stage that would empty the working set
/// falls back to the previous stage's output instead.
pub struct VelocityAnalyzer {
    config: VelocityAnalysisConfig,
}

impl VelocityAnalyzer {
    pub fn new(config: VelocityAnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze against the current wall clock.
    pub fn analyze(&self, data: &[VelocityDataPoint]) -> VelocityAnalysisResult {
        self.analyze_at(data, Utc::now())
    }

    /// Analyze with an explicit clock. Pure: identical inputs yield
    /// identical results.
    pub fn analyze_at(
        &self,
        data: &[VelocityDataPoint],
        now: DateTime<Utc>,
    ) -> VelocityAnalysisResult {
        if data.is_empty() {
            return Self::empty_result();
        }

        // Age filter, falling back to the unfiltered set if nothing is
        // recent enough.
        let age_filtered: Vec<VelocityDataPoint> = data
            .iter()
            .filter(|p| p.age_days(now) <= self.config.max_age_days)
            .cloned()
            .collect();
        let age_filtered = if age_filtered.is_empty() {
            data.to_vec()
        } else {
            age_filtered
        };

        // Bound filter, falling back to the age-filtered set. Points
        // rejected here are dropped entirely, not counted as outliers.
        let bounded: Vec<VelocityDataPoint> = age_filtered
            .iter()
            .filter(|p| {
                p.completed_points >= self.config.min_velocity
                    && p.completed_points <= self.config.max_velocity
            })
            .cloned()
            .collect();
        let bounded = if bounded.is_empty() { age_filtered } else { bounded };

        let (mut filtered, outliers) = self.split_outliers(bounded);

        // Lookback: keep only the most recent N sprints.
        if self.config.lookback_sprints > 0 && filtered.len() > self.config.lookback_sprints {
            filtered.sort_by(|a, b| b.sprint_date.cmp(&a.sprint_date));
            filtered.truncate(self.config.lookback_sprints);
        }

        let points: Vec<f64> = filtered.iter().map(|p| p.completed_points).collect();
        let average_velocity = stats::mean(&points);
        let std_dev = stats::sample_std_dev(&points);
        let median_velocity = stats::median(&points);
        let trend = stats::ols_slope(&points);
        let confidence_level =
            Self::confidence(filtered.len(), outliers.len(), average_velocity, std_dev);
        let sprint_duration_days = Self::detect_sprint_duration(&filtered);

        VelocityAnalysisResult {
            all_velocities: data.to_vec(),
            filtered_velocities: filtered,
            outliers_removed: outliers,
            average_velocity,
            std_dev,
            median_velocity,
            trend,
            confidence_level,
            sprint_duration_days,
        }
    }

    fn empty_result() -> VelocityAnalysisResult {
        VelocityAnalysisResult {
            all_velocities: vec![],
            filtered_velocities: vec![],
            outliers_removed: vec![],
            average_velocity: 0.0,
            std_dev: 0.0,
            median_velocity: 0.0,
            trend: 0.0,
            confidence_level: 0.0,
            sprint_duration_days: DEFAULT_SPRINT_DURATION_DAYS,
        }
    }

    /// Split a set into (kept, outliers) by z-score against the set's own
    /// sample statistics. Zero variance keeps every point.
    fn split_outliers(
        &self,
        points: Vec<VelocityDataPoint>,
    ) -> (Vec<VelocityDataPoint>, Vec<VelocityDataPoint>) {
        let values: Vec<f64> = points.iter().map(|p| p.completed_points).collect();
        let mean = stats::mean(&values);
        let std_dev = stats::sample_std_dev(&values);
        if std_dev == 0.0 {
            return (points, vec![]);
        }

        let mut kept = Vec::with_capacity(points.len());
        let mut outliers = vec![];
        for p in points {
            let z = (p.completed_points - mean).abs() / std_dev;
            if z > self.config.outlier_std_devs {
                outliers.push(p);
            } else {
                kept.push(p);
            }
        }
        (kept, outliers)
    }

    /// Confidence starts at 1.0 and takes multiplicative penalties for
    /// sparse data, a high outlier ratio, and high variance.
    fn confidence(kept: usize, removed: usize, mean: f64, std_dev: f64) -> f64 {
        let mut confidence: f64 = 1.0;

        confidence *= match kept {
            0..=2 => 0.5,
            3..=5 => 0.8,
            _ => 1.0,
        };

        let total = kept + removed;
        if total > 0 {
            let outlier_ratio = removed as f64 / total as f64;
            if outlier_ratio > 0.3 {
                confidence *= 0.7;
            } else if outlier_ratio >= 0.2 {
                confidence *= 0.85;
            }
        }

        let cv = if mean > 0.0 { std_dev / mean } else { 1.0 };
        if cv > 0.5 {
            confidence *= 0.8;
        }

        confidence.clamp(0.0, 1.0)
    }

    /// Detect cadence as the mode of consecutive positive day-gaps, rounded
    /// to the nearest week. Anything outside one to four weeks falls back
    /// to the 14-day default.
    fn detect_sprint_duration(points: &[VelocityDataPoint]) -> i64 {
        if points.len() < 2 {
            return DEFAULT_SPRINT_DURATION_DAYS;
        }
        let mut sorted: Vec<&VelocityDataPoint> = points.iter().collect();
        sorted.sort_by(|a, b| a.sprint_date.cmp(&b.sprint_date));

        let gaps: Vec<i64> = sorted
            .windows(2)
            .map(|w| (w[1].sprint_date - w[0].sprint_date).num_days())
            .filter(|gap| *gap > 0)
            .collect();

        let Some(typical) = stats::mode(&gaps) else {
            return DEFAULT_SPRINT_DURATION_DAYS;
        };
        let weeks = (typical as f64 / 7.0).round() as i64;
        let days = weeks * 7;
        if (7..=28).contains(&days) {
            days
        } else {
            DEFAULT_SPRINT_DURATION_DAYS
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    /// Sprints every `cadence` days, most recent one `cadence` days ago.
    fn series(points: &[f64], cadence: i64) -> Vec<VelocityDataPoint> {
        let n = points.len() as i64;
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                VelocityDataPoint::new(
                    format!("Sprint {}", i + 1),
                    now() - Duration::days(cadence * (n - i as i64)),
                    *p,
                    (*p / 2.0) as u32,
                )
            })
            .collect()
    }

    fn analyzer() -> VelocityAnalyzer {
        VelocityAnalyzer::new(VelocityAnalysisConfig::default())
    }

    #[test]
    fn empty_input_yields_zeroed_defaults() {
        let result = analyzer().analyze_at(&[], now());
        assert_eq!(result.average_velocity, 0.0);
        assert_eq!(result.std_dev, 0.0);
        assert_eq!(result.trend, 0.0);
        assert_eq!(result.confidence_level, 0.0);
        assert_eq!(result.sprint_duration_days, 14);
        assert!(result.filtered_velocities.is_empty());
    }

    #[test]
    fn spike_is_removed_as_outlier() {
        let data = series(&[10.0, 12.0, 11.0, 13.0, 50.0, 12.0], 14);
        let config = VelocityAnalysisConfig {
            outlier_std_devs: 2.0,
            ..Default::default()
        };
        let result = VelocityAnalyzer::new(config).analyze_at(&data, now());

        assert_eq!(result.outliers_removed.len(), 1);
        assert_eq!(result.outliers_removed[0].completed_points, 50.0);
        assert_eq!(result.filtered_velocities.len(), 5);
        let expected = (10.0 + 12.0 + 11.0 + 13.0 + 12.0) / 5.0;
        assert!((result.average_velocity - expected).abs() < 1e-12);
    }

    #[test]
    fn analyze_is_idempotent() {
        let data = series(&[10.0, 12.0, 11.0, 13.0, 50.0, 12.0], 14);
        let a = analyzer().analyze_at(&data, now());
        let b = analyzer().analyze_at(&data, now());
        assert_eq!(a, b);
    }

    #[test]
    fn filtered_and_outliers_are_disjoint_subsets() {
        let data = series(&[5.0, 8.0, 30.0, 9.0, 7.0, 6.0, 45.0, 8.0], 14);
        let config = VelocityAnalysisConfig {
            outlier_std_devs: 1.5,
            ..Default::default()
        };
        let result = VelocityAnalyzer::new(config).analyze_at(&data, now());

        for p in &result.filtered_velocities {
            assert!(!result.outliers_removed.contains(p));
            assert!(result.all_velocities.contains(p));
        }
        for p in &result.outliers_removed {
            assert!(result.all_velocities.contains(p));
        }
        assert!(
            result.filtered_velocities.len() + result.outliers_removed.len()
                <= result.all_velocities.len()
        );
    }

    #[test]
    fn age_filter_falls_back_when_everything_is_stale() {
        let mut data = series(&[10.0, 11.0, 12.0], 14);
        for p in &mut data {
            p.sprint_date = now() - Duration::days(1000);
        }
        let result = analyzer().analyze_at(&data, now());
        // All three points are older than max_age_days; the filter falls
        // back to the full set instead of erroring.
        assert_eq!(result.filtered_velocities.len(), 3);
    }

    #[test]
    fn bound_filter_falls_back_when_everything_is_rejected() {
        let data = series(&[10.0, 11.0, 12.0], 14);
        let config = VelocityAnalysisConfig {
            min_velocity: 100.0,
            max_velocity: 200.0,
            ..Default::default()
        };
        let result = VelocityAnalyzer::new(config).analyze_at(&data, now());
        assert_eq!(result.filtered_velocities.len(), 3);
    }

    #[test]
    fn bound_rejected_points_are_not_outliers() {
        let data = series(&[10.0, 11.0, 12.0, 13.0, 900.0], 14);
        let config = VelocityAnalysisConfig {
            max_velocity: 100.0,
            ..Default::default()
        };
        let result = VelocityAnalyzer::new(config).analyze_at(&data, now());
        assert_eq!(result.filtered_velocities.len(), 4);
        assert!(result.outliers_removed.is_empty());
        assert_eq!(result.all_velocities.len(), 5);
    }

    #[test]
    fn lookback_keeps_most_recent_sprints() {
        let data = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 14);
        let config = VelocityAnalysisConfig {
            lookback_sprints: 3,
            ..Default::default()
        };
        let result = VelocityAnalyzer::new(config).analyze_at(&data, now());
        assert_eq!(result.filtered_velocities.len(), 3);
        let mut kept: Vec<f64> = result
            .filtered_velocities
            .iter()
            .map(|p| p.completed_points)
            .collect();
        kept.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(kept, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn identical_values_skip_outlier_test() {
        let data = series(&[12.0, 12.0, 12.0, 12.0], 14);
        let result = analyzer().analyze_at(&data, now());
        assert!(result.outliers_removed.is_empty());
        assert_eq!(result.average_velocity, 12.0);
        assert_eq!(result.std_dev, 0.0);
        assert_eq!(result.trend, 0.0);
    }

    #[test]
    fn trend_reflects_rising_velocity() {
        let data = series(&[10.0, 12.0, 14.0, 16.0], 14);
        let result = analyzer().analyze_at(&data, now());
        assert!((result.trend - 2.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_bounded_and_penalized() {
        let sparse = analyzer().analyze_at(&series(&[10.0, 12.0], 14), now());
        assert!((sparse.confidence_level - 0.5).abs() < 1e-12 || sparse.confidence_level < 0.5);

        let solid = analyzer().analyze_at(&series(&[10.0, 11.0, 12.0, 11.0, 10.0, 12.0], 14), now());
        assert_eq!(solid.confidence_level, 1.0);

        for result in [&sparse, &solid] {
            assert!(result.confidence_level >= 0.0);
            assert!(result.confidence_level <= 1.0);
        }
    }

    #[test]
    fn confidence_penalizes_high_variance() {
        let data = series(&[2.0, 30.0, 3.0, 28.0, 4.0, 31.0], 14);
        let result = analyzer().analyze_at(&data, now());
        assert!(result.confidence_level <= 0.8);
    }

    #[test]
    fn detects_weekly_and_triweekly_cadence() {
        let weekly = analyzer().analyze_at(&series(&[10.0, 11.0, 12.0, 13.0], 7), now());
        assert_eq!(weekly.sprint_duration_days, 7);

        let triweekly = analyzer().analyze_at(&series(&[10.0, 11.0, 12.0, 13.0], 21), now());
        assert_eq!(triweekly.sprint_duration_days, 21);
    }

    #[test]
    fn irregular_cadence_rounds_to_nearest_week() {
        let data = series(&[10.0, 11.0, 12.0, 13.0, 14.0], 13);
        let result = analyzer().analyze_at(&data, now());
        assert_eq!(result.sprint_duration_days, 14);
    }

    #[test]
    fn absurd_cadence_falls_back_to_default() {
        let data = series(&[10.0, 11.0, 12.0], 60);
        let config = VelocityAnalysisConfig {
            max_age_days: 400,
            ..Default::default()
        };
        let result = VelocityAnalyzer::new(config).analyze_at(&data, now());
        assert_eq!(result.sprint_duration_days, 14);
    }

    #[test]
    fn sprint_duration_is_always_a_week_multiple_in_range() {
        for cadence in [1, 5, 10, 14, 17, 25, 90] {
            let result = analyzer().analyze_at(&series(&[10.0, 11.0, 12.0], cadence), now());
            assert!(result.sprint_duration_days % 7 == 0);
            assert!((7..=28).contains(&result.sprint_duration_days));
        }
    }

    #[test]
    fn future_dated_sprints_do_not_panic() {
        let mut data = series(&[10.0, 11.0, 12.0], 14);
        data.push(VelocityDataPoint::new(
            "Planned",
            now() + Duration::days(30),
            13.0,
            6,
        ));
        let result = analyzer().analyze_at(&data, now());
        assert_eq!(result.filtered_velocities.len(), 4);
    }
}
