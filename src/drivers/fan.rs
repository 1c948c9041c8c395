//! Cooling fan on a PWM pin
use crate::glyphs::{fan_level_glyph, GlyphId};
use embedded_hal::PwmPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum FanLevel {
    Off = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl FanLevel {
    pub const fn duty(self) -> u8 {
        match self {
            FanLevel::Off => 0,
            FanLevel::Low => 96,
            FanLevel::Medium => 160,
            FanLevel::High => 255,
        }
    }

    /// Speed bar shown next to the fan glyph
    pub const fn glyph(self) -> Option<GlyphId> {
        fan_level_glyph(self as u8)
    }

    pub const fn from_u8(level: u8) -> FanLevel {
        match level {
            0 => FanLevel::Off,
            1 => FanLevel::Low,
            2 => FanLevel::Medium,
            _ => FanLevel::High,
        }
    }
}

pub struct Fan<P> {
    pin: P,
    level: FanLevel,
}

impl<P: PwmPin<Duty = u8>> Fan<P> {
    pub fn new(mut pin: P) -> Self {
        pin.set_duty(0);
        pin.enable();
        Self { pin, level: FanLevel::Off }
    }

    pub fn level(&self) -> FanLevel {
        self.level
    }

    pub fn set_level(&mut self, level: FanLevel) {
        if level != self.level {
            self.level = level;
            self.pin.set_duty(level.duty());
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakePwm;

    #[test]
    fn level_sets_duty() {
        let mut fan = Fan::new(FakePwm::default());
        assert_eq!(fan.level(), FanLevel::Off);
        fan.set_level(FanLevel::Medium);
        fan.set_level(FanLevel::Medium);
        let pin = fan.release();
        assert!(pin.enabled);
        assert_eq!(pin.duty, 160);
        // initial zero plus one change
        assert_eq!(pin.writes, 2);
    }

    #[test]
    fn level_glyphs() {
        assert_eq!(FanLevel::Off.glyph(), None);
        assert_eq!(FanLevel::Low.glyph(), Some(GlyphId::Fan1));
        assert_eq!(FanLevel::High.glyph(), Some(GlyphId::Fan3));
        assert_eq!(FanLevel::from_u8(7), FanLevel::High);
    }
}
