use std::cell::Cell;

use time::{Duration, OffsetDateTime};

/// 現在時刻の供給元
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// 実時間の時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now(&self) -> OffsetDateTime {
        let millis = js_sys::Date::now() as i128;
        OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// テスト用の固定時計
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: OffsetDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::new(datetime!(2024-01-01 0:00 UTC));
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), datetime!(2024-01-01 0:01:30 UTC));

        clock.set(datetime!(2025-06-01 12:00 UTC));
        assert_eq!(clock.now(), datetime!(2025-06-01 12:00 UTC));
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        assert!(SystemClock.now() > OffsetDateTime::UNIX_EPOCH);
    }
}
