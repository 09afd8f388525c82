use chrono::{DateTime, Utc};

/// Seconds left before the budget runs out, derived from the wall clock.
///
/// `max(0, floor((started_at + budget - now) / 1s))`. Never decremented from a previous
/// value, so missed or late ticks can't skew it.
pub fn remaining_secs(started_at: DateTime<Utc>, budget_minutes: u32, now: DateTime<Utc>) -> u64 {
    let deadline_ms = started_at.timestamp_millis() + budget_minutes as i64 * 60 * 1000;
    let left_ms = deadline_ms - now.timestamp_millis();
    if left_ms <= 0 {
        0
    } else {
        (left_ms / 1000) as u64
    }
}

/// Seconds since the session started, for the stopwatch next to the countdown
pub fn elapsed_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - started_at).num_seconds().max(0) as u64
}

/// `mm:ss`, or `h:mm:ss` once an hour is reached
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyBand {
    Neutral,
    Warning,
    Critical,
}

impl UrgencyBand {
    /// Below 10% of the budget is critical, 10–25% is a warning, anything above is neutral.
    pub fn classify(remaining_secs: u64, total_secs: u64) -> UrgencyBand {
        if total_secs == 0 {
            return UrgencyBand::Critical;
        }
        // compare remaining/total against 1/10 and 1/4 without floats
        let scaled = remaining_secs as u128 * 100;
        let total = total_secs as u128;
        if scaled < total * 10 {
            UrgencyBand::Critical
        } else if scaled <= total * 25 {
            UrgencyBand::Warning
        } else {
            UrgencyBand::Neutral
        }
    }
}

/// Source of "now"; swapped for a fixed clock in tests
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_remaining_at_start_is_full_budget() {
        assert_eq!(remaining_secs(t0(), 60, t0()), 3600);
    }

    #[test]
    fn test_remaining_floors_partial_seconds() {
        let now = t0() + Duration::milliseconds(1500);
        assert_eq!(remaining_secs(t0(), 1, now), 58);
    }

    #[test]
    fn test_remaining_is_monotonic_and_never_negative() {
        let mut previous = u64::MAX;
        for step in 0..200 {
            let now = t0() + Duration::milliseconds(step * 733);
            let left = remaining_secs(t0(), 2, now);
            assert!(left <= previous, "countdown went up at step {step}");
            previous = left;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_remaining_is_zero_at_and_after_deadline() {
        let deadline = t0() + Duration::minutes(30);
        assert_eq!(remaining_secs(t0(), 30, deadline), 0);
        assert_eq!(remaining_secs(t0(), 30, deadline + Duration::hours(5)), 0);
        assert_eq!(remaining_secs(t0(), 30, deadline - Duration::seconds(1)), 1);
    }

    #[test]
    fn test_elapsed_never_negative() {
        assert_eq!(elapsed_secs(t0(), t0() - Duration::seconds(5)), 0);
        assert_eq!(elapsed_secs(t0(), t0() + Duration::seconds(75)), 75);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(3725), "1:02:05");
    }

    #[test]
    fn test_urgency_bands() {
        assert_eq!(UrgencyBand::classify(3600, 3600), UrgencyBand::Neutral);
        assert_eq!(UrgencyBand::classify(901, 3600), UrgencyBand::Neutral);
        assert_eq!(UrgencyBand::classify(900, 3600), UrgencyBand::Warning);
        assert_eq!(UrgencyBand::classify(360, 3600), UrgencyBand::Warning);
        assert_eq!(UrgencyBand::classify(359, 3600), UrgencyBand::Critical);
        assert_eq!(UrgencyBand::classify(0, 3600), UrgencyBand::Critical);
        assert_eq!(UrgencyBand::classify(0, 0), UrgencyBand::Critical);
    }
}
