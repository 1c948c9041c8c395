//! Speaker driven without a hardware timer.
//!
//! All three hardware timers are busy with PWM, so tones are bit-banged on
//! the speaker pin. The half-period waits must come from a time-scale
//! corrected delay or every note plays `scale` times too high.
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

pub const BEEP_HZ: u16 = 2000;
pub const BEEP_MS: u16 = 60;

/// A note: frequency in Hz (0 is a rest) and length in ms
pub type Note = (u16, u16);

/// Three short beeps
pub const ALARM: [Note; 5] = [(BEEP_HZ, 120), (0, 80), (BEEP_HZ, 120), (0, 80), (BEEP_HZ, 120)];

/// Rising pair played when the user changes mode
pub const CHIRP: [Note; 2] = [(1760, 40), (2640, 40)];

pub struct Speaker<P> {
    pin: P,
}

impl<P: OutputPin> Speaker<P> {
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self { pin })
    }

    /// Square wave at `freq_hz` for `duration_ms`. A frequency of 0 keeps
    /// the pin low for the duration.
    pub fn tone<D: DelayUs<u32>>(
        &mut self,
        delay: &mut D,
        freq_hz: u16,
        duration_ms: u16,
    ) -> Result<(), P::Error> {
        let duration_us = duration_ms as u32 * 1000;
        if freq_hz == 0 {
            self.pin.set_low()?;
            delay.delay_us(duration_us);
            return Ok(());
        }

        let period_us = 1_000_000 / freq_hz as u32;
        let high_us = period_us / 2;
        let low_us = period_us - high_us;
        let cycles = duration_us / period_us;

        for _ in 0..cycles {
            self.pin.set_high()?;
            delay.delay_us(high_us);
            self.pin.set_low()?;
            delay.delay_us(low_us);
        }
        Ok(())
    }

    pub fn play<D: DelayUs<u32>>(&mut self, delay: &mut D, notes: &[Note]) -> Result<(), P::Error> {
        for &(freq, ms) in notes {
            self.tone(delay, freq, ms)?;
        }
        Ok(())
    }

    pub fn beep<D: DelayUs<u32>>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.tone(delay, BEEP_HZ, BEEP_MS)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingDelay;
    use crate::timing::{ScaledDelay, TimeScale};
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};

    #[test]
    fn square_wave_cycles() {
        let pin = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let mut speaker = Speaker::new(pin).unwrap();
        let mut delay = RecordingDelay::default();

        // 1 kHz for 2 ms is two full periods
        speaker.tone(&mut delay, 1000, 2).unwrap();
        assert_eq!(delay.us, [500, 500, 500, 500]);
        speaker.release().done();
    }

    #[test]
    fn odd_period_puts_remainder_low() {
        let pin = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let mut speaker = Speaker::new(pin).unwrap();
        let mut delay = RecordingDelay::default();

        // 1300 Hz: 769 us period, one cycle fits in 1 ms
        speaker.tone(&mut delay, 1300, 0).unwrap();
        assert!(delay.us.is_empty());
        speaker.tone(&mut delay, 1300, 1).unwrap();
        assert_eq!(delay.us, [384, 385]);
        speaker.release().done();
    }

    #[test]
    fn rest_waits_silently() {
        let pin = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::Low)]);
        let mut speaker = Speaker::new(pin).unwrap();
        let mut delay = RecordingDelay::default();
        speaker.tone(&mut delay, 0, 25).unwrap();
        assert_eq!(delay.us, [25_000]);
        speaker.release().done();
    }

    #[test]
    fn scaled_delay_keeps_pitch() {
        let pin = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let mut speaker = Speaker::new(pin).unwrap();
        let mut delay = ScaledDelay::new(RecordingDelay::default(), TimeScale::new(64).unwrap());
        speaker.tone(&mut delay, 1000, 1).unwrap();
        assert_eq!(delay.release().us, [500 * 64, 500 * 64]);
        speaker.release().done();
    }
}
