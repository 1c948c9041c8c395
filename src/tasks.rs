//! Periodic jobs for the main loop, timed off the scaled clock
use crate::timing::{Clock, Instant, ScaledClock};

/// Fires once every `period_ms` of real time. Missed periods are caught up
/// one per poll so counts built on it don't drift.
pub struct Periodic {
    period_ms: u32,
    last: Instant,
}

impl Periodic {
    pub fn new<C: Clock>(clock: &ScaledClock<C>, period_ms: u32) -> Self {
        Self { period_ms, last: clock.now() }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn poll<C: Clock>(&mut self, clock: &ScaledClock<C>) -> bool {
        if clock.elapsed_ms(self.last) < self.period_ms {
            return false;
        }
        let raw_period = self.period_ms.wrapping_mul(clock.scale().factor() as u32);
        self.last = Instant::from_raw(self.last.raw().wrapping_add(raw_period));
        true
    }

    /// Start the period over from now
    pub fn restart<C: Clock>(&mut self, clock: &ScaledClock<C>) {
        self.last = clock.now();
    }
}

/// Time of day kept by counting seconds from a configured start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    start_minute: u16,
    seconds: u32,
}

const MINUTES_PER_DAY: u32 = 24 * 60;
const SECONDS_PER_DAY: u32 = MINUTES_PER_DAY * 60;

impl WallClock {
    pub const fn new(start_minute: u16) -> Self {
        Self { start_minute, seconds: 0 }
    }

    /// Advance by one second
    pub fn tick(&mut self) {
        self.seconds += 1;
        if self.seconds >= SECONDS_PER_DAY {
            self.seconds -= SECONDS_PER_DAY;
        }
    }

    /// Seconds into the current day of running
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn minute_of_day(&self) -> u16 {
        ((self.start_minute as u32 + self.seconds / 60) % MINUTES_PER_DAY) as u16
    }

    pub fn hours_minutes(&self) -> (u8, u8) {
        let m = self.minute_of_day();
        ((m / 60) as u8, (m % 60) as u8)
    }
}
