use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sprintcast_core::VelocityDataPoint;
use std::path::Path;

/// One record of the velocity history file. `date` accepts either a full
/// RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
#[derive(Debug, Deserialize)]
struct SprintRecord {
    name: String,
    date: String,
    completed_points: f64,
    #[serde(default)]
    issue_count: u32,
}

fn parse_date(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Ok(ts);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid sprint date '{}'", raw))?;
    Ok(date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc())
}

/// Load a velocity history from a YAML or JSON file, dispatched on the file
/// extension (anything that is not `.json` is treated as YAML).
pub fn load_history(path: &Path) -> anyhow::Result<Vec<VelocityDataPoint>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history file {}", path.display()))?;

    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    let records: Vec<SprintRecord> = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON history in {}", path.display()))?
    } else {
        serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid YAML history in {}", path.display()))?
    };

    records
        .into_iter()
        .map(|r| {
            let date = parse_date(&r.date)
                .with_context(|| format!("sprint '{}' has an invalid date", r.name))?;
            Ok(VelocityDataPoint::new(
                r.name,
                date,
                r.completed_points,
                r.issue_count,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_dates_and_timestamps() {
        let midnight = parse_date("2026-01-05").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2026-01-05T00:00:00+00:00");

        let full = parse_date("2026-01-05T12:30:00Z").unwrap();
        assert_eq!(full.to_rfc3339(), "2026-01-05T12:30:00+00:00");

        assert!(parse_date("last tuesday").is_err());
    }
}
