use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sprintcast_core::{VelocityAnalysisResult, VelocityScenario};

/// Trials that never consume the backlog stop here.
const MAX_SPRINTS_PER_TRIAL: u32 = 500;

// ---------------------------------------------------------------------------
// ForecastReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub backlog_points: f64,
    pub trials: u32,
    pub p50_sprints: u32,
    pub p85_sprints: u32,
    pub p50_date: String,
    pub p85_date: String,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Resampling Monte Carlo sampler: each trial draws sprint velocities
/// uniformly with replacement from the filtered history until the backlog
/// is consumed. The analysis core only supplies inputs; all randomness
/// lives here.
pub struct Simulator {
    rng: StdRng,
    start: DateTime<Utc>,
}

impl Simulator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            start: Utc::now(),
        }
    }

    /// Baseline forecast from the filtered history.
    pub fn forecast(
        &mut self,
        analysis: &VelocityAnalysisResult,
        backlog_points: f64,
        trials: u32,
    ) -> ForecastReport {
        let empty = VelocityScenario::new("baseline", vec![], vec![]);
        self.forecast_scenario(analysis, &empty, 0.0, backlog_points, trials)
    }

    /// Scenario forecast: every drawn velocity is routed through
    /// `adjusted_velocity` for its sprint index.
    pub fn forecast_scenario(
        &mut self,
        analysis: &VelocityAnalysisResult,
        scenario: &VelocityScenario,
        team_size: f64,
        backlog_points: f64,
        trials: u32,
    ) -> ForecastReport {
        let samples: Vec<f64> = analysis
            .filtered_velocities
            .iter()
            .map(|p| p.completed_points)
            .collect();

        let mut outcomes: Vec<u32> = (0..trials)
            .map(|_| self.run_trial(&samples, scenario, team_size, backlog_points))
            .collect();
        outcomes.sort_unstable();

        let p50_sprints = percentile(&outcomes, 0.50);
        let p85_sprints = percentile(&outcomes, 0.85);
        let duration = analysis.sprint_duration_days;

        ForecastReport {
            backlog_points,
            trials,
            p50_sprints,
            p85_sprints,
            p50_date: self.sprint_end_date(p50_sprints, duration),
            p85_date: self.sprint_end_date(p85_sprints, duration),
        }
    }

    fn run_trial(
        &mut self,
        samples: &[f64],
        scenario: &VelocityScenario,
        team_size: f64,
        backlog_points: f64,
    ) -> u32 {
        if samples.is_empty() {
            return MAX_SPRINTS_PER_TRIAL;
        }
        let mut remaining = backlog_points;
        let mut sprint = 0u32;
        while remaining > 0.0 && sprint < MAX_SPRINTS_PER_TRIAL {
            sprint += 1;
            let draw = samples[self.rng.gen_range(0..samples.len())];
            let (velocity, _) = scenario.adjusted_velocity(sprint, draw, team_size);
            if velocity <= 0.0 {
                continue;
            }
            remaining -= velocity;
        }
        sprint
    }

    fn sprint_end_date(&self, sprints: u32, duration_days: i64) -> String {
        (self.start + Duration::days(sprints as i64 * duration_days))
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(sorted: &[u32], q: f64) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
