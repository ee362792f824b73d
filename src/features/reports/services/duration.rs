use chrono::{DateTime, Utc};

use crate::features::reports::dtos::DurationDto;

/// Calendar-approximate month length in days.
const DAYS_PER_MONTH: f64 = 30.4375;
/// Calendar-approximate year length in days.
const DAYS_PER_YEAR: f64 = 365.25;

const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Elapsed time between creation and resolution in several units. A
/// resolution instant earlier than creation clamps to zero elapsed time.
pub fn elapsed_between(created: DateTime<Utc>, resolved: DateTime<Utc>) -> DurationDto {
    let millis = (resolved - created).num_milliseconds().max(0);
    let days = millis as f64 / MILLIS_PER_DAY;

    DurationDto {
        millis,
        minutes: round2(millis as f64 / MILLIS_PER_MINUTE),
        hours: round2(millis as f64 / MILLIS_PER_HOUR),
        days: round2(days),
        weeks: round2(days / 7.0),
        months: round2(days / DAYS_PER_MONTH),
        years: round2(days / DAYS_PER_YEAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_ninety_minutes() {
        let d = elapsed_between(t0(), t0() + Duration::minutes(90));
        assert_eq!(d.millis, 5_400_000);
        assert_eq!(d.minutes, 90.0);
        assert_eq!(d.hours, 1.5);
        assert_eq!(d.days, 0.06);
        assert_eq!(d.weeks, 0.01);
        assert_eq!(d.months, 0.0);
        assert_eq!(d.years, 0.0);
    }

    #[test]
    fn test_negative_elapsed_clamps_to_zero() {
        let d = elapsed_between(t0(), t0() - Duration::hours(5));
        assert_eq!(d.millis, 0);
        assert_eq!(d.minutes, 0.0);
        assert_eq!(d.hours, 0.0);
        assert_eq!(d.days, 0.0);
    }

    #[test]
    fn test_calendar_approximate_units() {
        let d = elapsed_between(t0(), t0() + Duration::days(365));
        assert_eq!(d.days, 365.0);
        assert_eq!(d.weeks, 52.14);
        assert_eq!(d.months, 11.99);
        assert_eq!(d.years, 1.0);
    }

    #[test]
    fn test_zero_elapsed() {
        let d = elapsed_between(t0(), t0());
        assert_eq!(d.millis, 0);
        assert_eq!(d.years, 0.0);
    }
}
