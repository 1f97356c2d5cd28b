//! Clock abstraction
//!
//! The ledger, governor and retry loop never read the system time directly.
//! They go through a [`Clock`] so tests can drive windows, spacing and
//! backoff with a [`ManualClock`] instead of real sleeps.

use chrono::{Days, Local, NaiveDate};
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const SECS_PER_DAY: u64 = 86_400;

/// Source of monotonic time, calendar date and sleeps
#[async_trait::async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Current local calendar day
    fn today(&self) -> NaiveDate;

    /// Time left until the next local day boundary
    fn until_next_day(&self) -> Duration;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers and the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn until_next_day(&self) -> Duration {
        let now = Local::now();
        now.date_naive()
            .checked_add_days(Days::new(1))
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
            .and_then(|midnight| (midnight - now).to_std().ok())
            .unwrap_or(Duration::from_secs(SECS_PER_DAY))
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock for tests.
///
/// Time only moves through [`ManualClock::advance`] or [`Clock::sleep`];
/// every sleep is recorded and returns immediately after advancing.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    base_date: NaiveDate,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a clock at midnight of 2024-01-01
    #[must_use]
    pub fn new() -> Self {
        Self::starting_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN))
    }

    /// Create a clock at midnight of `date`
    #[must_use]
    pub fn starting_on(date: NaiveDate) -> Self {
        Self {
            base: Instant::now(),
            base_date: date,
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    /// Virtual time elapsed since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every duration passed to [`Clock::sleep`], in order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sum of all recorded sleeps
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn today(&self) -> NaiveDate {
        let days = self.elapsed().as_secs() / SECS_PER_DAY;
        self.base_date
            .checked_add_days(Days::new(days))
            .unwrap_or(self.base_date)
    }

    fn until_next_day(&self) -> Duration {
        let day = Duration::from_secs(SECS_PER_DAY);
        let into_day = self.elapsed().as_nanos() % day.as_nanos();
        day - Duration::from_nanos(into_day as u64)
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_sleep_advances_and_records() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_millis(250)).await;
        clock.advance(Duration::from_secs(1));
        clock.sleep(Duration::from_millis(750)).await;

        assert_eq!(clock.now() - start, Duration::from_secs(2));
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(250), Duration::from_millis(750)]
        );
        assert_eq!(clock.total_slept(), Duration::from_secs(1));
    }

    #[test]
    fn test_manual_clock_day_boundary() {
        let clock = ManualClock::starting_on(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(clock.until_next_day(), Duration::from_secs(SECS_PER_DAY));

        clock.advance(Duration::from_secs(SECS_PER_DAY - 10));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(clock.until_next_day(), Duration::from_secs(10));

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_system_clock_next_day_within_a_day() {
        let remaining = SystemClock.until_next_day();
        assert!(remaining <= Duration::from_secs(SECS_PER_DAY + 3600));
    }
}
