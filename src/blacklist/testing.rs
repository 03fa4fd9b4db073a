use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use mockall::mock;

use super::clock::Clock;

mock! {
    pub WallClock {}

    impl Clock for WallClock {
        fn now(&self) -> i64;
    }
}

/// Shared, manually driven unix time for mocked clocks.
#[derive(Debug, Clone)]
pub struct Time(Arc<AtomicI64>);

impl Time {
    pub fn new(start: i64) -> Self {
        Self(Arc::new(AtomicI64::new(start)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

pub fn clock_at(time: &Time) -> MockWallClock {
    let time = time.0.clone();
    let mut clock = MockWallClock::new();
    clock
        .expect_now()
        .returning(move || time.load(Ordering::SeqCst));
    clock
}
