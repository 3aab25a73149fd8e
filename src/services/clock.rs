use std::sync::Mutex;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

/// Indian Standard Time, the payroll calendar's reference zone. IST has no
/// daylight saving transitions, so a fixed offset is exact year round.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is in range")
}

/// The calendar day an instant falls on in IST. All day-granularity
/// comparisons (hike eligibility, period boundaries) go through here so two
/// instants on the same IST day always compare equal.
pub fn ist_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&ist()).date_naive()
}

/// Payroll period (month name, year) an instant belongs to, in IST.
pub fn period_for(instant: DateTime<Utc>) -> (String, i32) {
    let day = ist_day(instant);
    (day.format("%B").to_string(), day.year())
}

/// Source of "now" for anything with time-dependent behavior. Production
/// wiring uses [`SystemClock`]; tests inject a [`FixedClock`] to pin the
/// current day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant, advanceable by tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn late_utc_evening_rolls_into_the_next_ist_day() {
        // 19:00 UTC + 5:30 = 00:30 the next day in IST.
        let instant = Utc.with_ymd_and_hms(2024, 1, 31, 19, 0, 0).unwrap();
        assert_eq!(
            ist_day(instant),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );

        let just_before = Utc.with_ymd_and_hms(2024, 1, 31, 18, 29, 59).unwrap();
        assert_eq!(
            ist_day(just_before),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[test]
    fn same_ist_day_compares_equal_regardless_of_time_of_day() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 14, 1, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 14, 18, 0, 0).unwrap();
        assert_eq!(ist_day(morning), ist_day(night));
    }

    #[test]
    fn period_uses_the_ist_calendar() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 31, 19, 0, 0).unwrap();
        assert_eq!(period_for(instant), ("February".to_string(), 2024));

        let new_years_eve = Utc.with_ymd_and_hms(2023, 12, 31, 19, 0, 0).unwrap();
        assert_eq!(period_for(new_years_eve), ("January".to_string(), 2024));
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 15, 6, 0, 0).unwrap());
        clock.advance(chrono::Duration::days(1));
        assert_eq!(
            clock.now(),
            Utc.with_ymd_and_hms(2024, 2, 16, 6, 0, 0).unwrap()
        );
    }
}
