// src/rate_limit.rs
//! # Rate Limiter
//! One process-wide admission gate in front of the upstream trend provider.
//!
//! Politeness budget, not a hard SLA: state lives only in memory and a
//! restart resets it. The hourly budget is a fixed window anchored at the
//! first admitted call and reset once 3600s have elapsed, so the
//! `requests_this_hour` statistic and admission math always agree.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::error::DenyReason;

const HOUR: i64 = 3600;

/// Denied admission, with how long to wait before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDenied {
    pub reason: DenyReason,
    pub retry_after: Duration,
}

#[derive(Debug, Default)]
struct RateWindow {
    last_call_at: Option<DateTime<Utc>>,
    hour_start: Option<DateTime<Utc>>,
    count: u32,
}

/// Snapshot for diagnostics endpoints; reads the same state admission uses.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RateLimiterStats {
    pub requests_this_hour: u32,
    pub max_requests_per_hour: u32,
    pub min_request_interval_seconds: i64,
    pub last_request_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    max_per_hour: u32,
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, max_per_hour: u32) -> Self {
        Self {
            min_interval,
            max_per_hour,
            window: Mutex::new(RateWindow::default()),
        }
    }

    /// Evaluate admission at `now`. Admission and the state mutation happen
    /// under one lock so two concurrent callers can never both be admitted
    /// inside the same min-interval or over the hourly cap.
    pub fn try_admit(&self, now: DateTime<Utc>) -> Result<(), RateDenied> {
        let mut w = self.window.lock().expect("rate window mutex poisoned");

        // Roll the fixed hourly window.
        if let Some(start) = w.hour_start {
            if now - start >= Duration::seconds(HOUR) {
                w.count = 0;
                w.hour_start = Some(now);
            }
        }

        if let Some(last) = w.last_call_at {
            let elapsed = now - last;
            if elapsed < self.min_interval {
                return Err(RateDenied {
                    reason: DenyReason::TooSoon,
                    retry_after: self.min_interval - elapsed,
                });
            }
        }

        if w.count >= self.max_per_hour {
            let start = w.hour_start.unwrap_or(now);
            let until_reset = Duration::seconds(HOUR) - (now - start);
            return Err(RateDenied {
                reason: DenyReason::HourlyCap,
                retry_after: until_reset.max(Duration::zero()),
            });
        }

        w.last_call_at = Some(now);
        if w.hour_start.is_none() {
            w.hour_start = Some(now);
        }
        w.count += 1;
        Ok(())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> RateLimiterStats {
        let w = self.window.lock().expect("rate window mutex poisoned");
        let in_window = match w.hour_start {
            Some(start) if now - start < Duration::seconds(HOUR) => w.count,
            _ => 0,
        };
        RateLimiterStats {
            requests_this_hour: in_window,
            max_requests_per_hour: self.max_per_hour,
            min_request_interval_seconds: self.min_interval.num_seconds(),
            last_request_time: w.last_call_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 27, 12, 0, 0).unwrap()
    }

    #[test]
    fn second_call_within_min_interval_is_denied_with_remainder() {
        let rl = RateLimiter::new(Duration::seconds(10), 100);
        assert!(rl.try_admit(t0()).is_ok());

        let denied = rl.try_admit(t0() + Duration::seconds(5)).unwrap_err();
        assert_eq!(denied.reason, DenyReason::TooSoon);
        assert_eq!(denied.retry_after, Duration::seconds(5));
    }

    #[test]
    fn call_after_min_interval_is_admitted() {
        let rl = RateLimiter::new(Duration::seconds(10), 100);
        assert!(rl.try_admit(t0()).is_ok());
        assert!(rl.try_admit(t0() + Duration::seconds(10)).is_ok());
    }

    #[test]
    fn hourly_cap_denies_with_time_until_reset() {
        let rl = RateLimiter::new(Duration::seconds(10), 3);
        let mut now = t0();
        for _ in 0..3 {
            assert!(rl.try_admit(now).is_ok());
            now += Duration::seconds(10);
        }
        let denied = rl.try_admit(now).unwrap_err();
        assert_eq!(denied.reason, DenyReason::HourlyCap);
        // Window opened at t0; 30s have passed.
        assert_eq!(denied.retry_after, Duration::seconds(3600 - 30));
    }

    #[test]
    fn hourly_window_resets_after_an_hour() {
        let rl = RateLimiter::new(Duration::seconds(10), 2);
        assert!(rl.try_admit(t0()).is_ok());
        assert!(rl.try_admit(t0() + Duration::seconds(20)).is_ok());
        assert!(rl.try_admit(t0() + Duration::seconds(40)).is_err());

        let later = t0() + Duration::seconds(3601);
        assert!(rl.try_admit(later).is_ok());
        assert_eq!(rl.stats(later).requests_this_hour, 1);
    }

    #[test]
    fn stats_reflect_admissions() {
        let rl = RateLimiter::new(Duration::seconds(1), 100);
        assert_eq!(rl.stats(t0()).requests_this_hour, 0);
        assert!(rl.try_admit(t0()).is_ok());
        let s = rl.stats(t0());
        assert_eq!(s.requests_this_hour, 1);
        assert_eq!(s.last_request_time, Some(t0()));
    }
}
