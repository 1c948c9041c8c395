//! Power-on self test, reported over the console

use crate::board::PinMap;
use crate::glyphs::GlyphSet;
use crate::timing::{Clock, Prescaler, TimeScale, DEFAULT_PRESCALER};
use ufmt::{uWrite, uwrite};

pub trait TestCase {
    fn run(&self) -> TestResult;
    fn name(&self) -> &'static str;
}

#[derive(Debug, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail(TestError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum TestError {
    AssertionFailed(&'static str),
    Timeout,
}

impl TestError {
    fn describe(&self) -> &'static str {
        match self {
            TestError::AssertionFailed(what) => what,
            TestError::Timeout => "timeout",
        }
    }
}

macro_rules! check {
    ($cond:expr) => {
        if !$cond {
            return TestResult::Fail(TestError::AssertionFailed(stringify!($cond)));
        }
    };
}

pub struct TestRunner<'w, W: uWrite> {
    out: &'w mut W,
    total: u16,
    passed: u16,
}

impl<'w, W: uWrite> TestRunner<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        Self { out, total: 0, passed: 0 }
    }

    /// Run every case and print one line each. Returns true if all passed.
    pub fn run_suite(&mut self, name: &'static str, tests: &[&dyn TestCase]) -> bool {
        uwrite!(self.out, "=== {} ===\n", name).ok();
        let failed_before = self.total - self.passed;

        for test in tests {
            self.total += 1;
            uwrite!(self.out, "{}: ", test.name()).ok();
            match test.run() {
                TestResult::Pass => {
                    self.passed += 1;
                    uwrite!(self.out, "PASS\n").ok();
                }
                TestResult::Fail(err) => {
                    uwrite!(self.out, "FAIL {}\n", err.describe()).ok();
                }
            }
        }

        uwrite!(self.out, "passed {}/{}\n", self.passed, self.total).ok();
        self.total - self.passed == failed_before
    }

    pub fn passed(&self) -> u16 {
        self.passed
    }

    pub fn total(&self) -> u16 {
        self.total
    }
}

pub struct PinMapTest(pub &'static PinMap);

impl TestCase for PinMapTest {
    fn name(&self) -> &'static str {
        "pin map"
    }

    fn run(&self) -> TestResult {
        check!(self.0.validate().is_ok());
        TestResult::Pass
    }
}

pub struct GlyphTest(pub &'static GlyphSet);

impl TestCase for GlyphTest {
    fn name(&self) -> &'static str {
        "glyphs"
    }

    fn run(&self) -> TestResult {
        check!(self.0.validate().is_ok());
        TestResult::Pass
    }
}

pub struct TimeScaleTest {
    pub prescaler: Prescaler,
    pub scale: TimeScale,
}

impl TestCase for TimeScaleTest {
    fn name(&self) -> &'static str {
        "time scale"
    }

    fn run(&self) -> TestResult {
        check!(self.scale.factor() as u16 * self.prescaler.divisor() == DEFAULT_PRESCALER);
        TestResult::Pass
    }
}

/// Checks the wiring clock is ticking at all
pub struct ClockTest<'a, C> {
    pub clock: &'a C,
    pub max_polls: u32,
}

impl<C: Clock> TestCase for ClockTest<'_, C> {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn run(&self) -> TestResult {
        let start = self.clock.raw_micros();
        for _ in 0..self.max_polls {
            if self.clock.raw_micros() != start {
                return TestResult::Pass;
            }
            core::hint::spin_loop();
        }
        TestResult::Fail(TestError::Timeout)
    }
}
