//! Fakes shared by the unit tests
use crate::drivers::onewire::SlotDelay;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::PwmPin;
use embedded_hal_mock::delay::MockNoop;
use std::vec::Vec;

/// Records every raw delay request
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub ms: Vec<u32>,
    pub us: Vec<u32>,
    /// Microsecond waits issued with interrupts masked, one entry per section
    pub masked: Vec<Vec<u32>>,
    in_section: bool,
}

impl DelayMs<u32> for RecordingDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

impl DelayUs<u32> for RecordingDelay {
    fn delay_us(&mut self, us: u32) {
        self.us.push(us);
        if self.in_section {
            if let Some(section) = self.masked.last_mut() {
                section.push(us);
            }
        }
    }
}

impl SlotDelay for RecordingDelay {
    fn atomic<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        assert!(!self.in_section, "nested atomic section");
        self.in_section = true;
        self.masked.push(Vec::new());
        let result = f(self);
        self.in_section = false;
        result
    }
}

impl SlotDelay for MockNoop {}

#[derive(Debug, Default)]
pub struct FakePwm {
    pub enabled: bool,
    pub duty: u8,
    pub writes: usize,
}

impl PwmPin for FakePwm {
    type Duty = u8;

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn get_duty(&self) -> u8 {
        self.duty
    }

    fn get_max_duty(&self) -> u8 {
        u8::MAX
    }

    fn set_duty(&mut self, duty: u8) {
        self.duty = duty;
        self.writes += 1;
    }
}
