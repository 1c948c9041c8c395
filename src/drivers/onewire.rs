//! Bit-banged 1-Wire bus master.
//!
//! The bus pin is driven open drain: `set_low` pulls the line down and
//! `set_high` releases it to the external pull-up. Slot timings follow the
//! standard-speed values. The parts of a slot a device samples or answers
//! in run inside [`SlotDelay::atomic`]; the recovery tail after each slot
//! may stretch and runs with interrupts on.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

pub const CMD_SKIP_ROM: u8 = 0xCC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireError<E> {
    Pin(E),
    /// Nobody answered the reset pulse
    NoPresence,
    /// The line read low for a whole transfer
    BusShorted,
    CrcMismatch { expected: u8, actual: u8 },
}

impl<E> From<E> for OneWireError<E> {
    fn from(e: E) -> Self {
        OneWireError::Pin(e)
    }
}

pub type Result<T, E> = core::result::Result<T, OneWireError<E>>;

/// Microsecond delay accurate enough for 1-Wire slots.
///
/// `atomic` runs `f` with nothing able to stretch its waits. The default
/// just calls `f`, for delays that are never interrupted.
pub trait SlotDelay: DelayUs<u32> {
    fn atomic<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        f(self)
    }
}

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, LSB first)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

pub fn check_crc<E>(data: &[u8], expected: u8) -> Result<(), E> {
    let actual = crc8(data);
    if actual == expected {
        Ok(())
    } else {
        Err(OneWireError::CrcMismatch { expected, actual })
    }
}

pub struct OneWire<P> {
    pin: P,
}

impl<P, E> OneWire<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    pub fn new(mut pin: P) -> core::result::Result<Self, E> {
        pin.set_high()?;
        Ok(Self { pin })
    }

    /// Reset pulse. Errors with `NoPresence` if no device pulled the line
    /// low in the presence window.
    pub fn reset<D: SlotDelay>(&mut self, delay: &mut D) -> Result<(), E> {
        // a longer reset pulse is harmless
        self.pin.set_low()?;
        delay.delay_us(480);
        let pin = &mut self.pin;
        let present = delay.atomic(|d| -> core::result::Result<bool, E> {
            pin.set_high()?;
            d.delay_us(70);
            pin.is_low()
        })?;
        delay.delay_us(410);
        if present {
            Ok(())
        } else {
            Err(OneWireError::NoPresence)
        }
    }

    pub fn write_bit<D: SlotDelay>(&mut self, delay: &mut D, bit: bool) -> Result<(), E> {
        let (low_us, release_us) = if bit { (6, 64) } else { (60, 10) };
        let pin = &mut self.pin;
        delay.atomic(|d| -> core::result::Result<(), E> {
            pin.set_low()?;
            d.delay_us(low_us);
            pin.set_high()
        })?;
        delay.delay_us(release_us);
        Ok(())
    }

    pub fn read_bit<D: SlotDelay>(&mut self, delay: &mut D) -> Result<bool, E> {
        let pin = &mut self.pin;
        let bit = delay.atomic(|d| -> core::result::Result<bool, E> {
            pin.set_low()?;
            d.delay_us(6);
            pin.set_high()?;
            d.delay_us(9);
            pin.is_high()
        })?;
        delay.delay_us(55);
        Ok(bit)
    }

    /// LSB first
    pub fn write_byte<D: SlotDelay>(&mut self, delay: &mut D, byte: u8) -> Result<(), E> {
        for i in 0..8 {
            self.write_bit(delay, byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    pub fn read_byte<D: SlotDelay>(&mut self, delay: &mut D) -> Result<u8, E> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit(delay)? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    pub fn write_bytes<D: SlotDelay>(&mut self, delay: &mut D, bytes: &[u8]) -> Result<(), E> {
        for &b in bytes {
            self.write_byte(delay, b)?;
        }
        Ok(())
    }

    pub fn read_bytes<D: SlotDelay>(&mut self, delay: &mut D, buf: &mut [u8]) -> Result<(), E> {
        for b in buf.iter_mut() {
            *b = self.read_byte(delay)?;
        }
        Ok(())
    }

    /// Reset and address every device on the bus
    pub fn skip_rom<D: SlotDelay>(&mut self, delay: &mut D) -> Result<(), E> {
        self.reset(delay)?;
        self.write_byte(delay, CMD_SKIP_ROM)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingDelay;
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};
    use std::vec;
    use std::vec::Vec;

    // every write slot is a low pulse then release, only the timing differs
    fn write_slots() -> Vec<Transaction> {
        (0..8)
            .flat_map(|_| [Transaction::set(State::Low), Transaction::set(State::High)])
            .collect()
    }

    fn read_slots(byte: u8) -> Vec<Transaction> {
        let mut t = Vec::new();
        for i in 0..8 {
            let level = if byte & (1 << i) != 0 { State::High } else { State::Low };
            t.push(Transaction::set(State::Low));
            t.push(Transaction::set(State::High));
            t.push(Transaction::get(level));
        }
        t
    }

    fn bus(mut expected: Vec<Transaction>) -> OneWire<PinMock> {
        expected.insert(0, Transaction::set(State::High));
        OneWire::new(PinMock::new(&expected)).unwrap()
    }

    #[test]
    fn crc_check_value() {
        assert_eq!(crc8(b"123456789"), 0xA1);
        assert_eq!(crc8(&[]), 0);
        assert_eq!(check_crc::<()>(b"123456789", 0xA1), Ok(()));
        assert_eq!(
            check_crc::<()>(b"123456789", 0x00),
            Err(OneWireError::CrcMismatch { expected: 0x00, actual: 0xA1 })
        );
    }

    #[test]
    fn reset_sees_presence() {
        let mut ow = bus(vec![
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(State::Low),
        ]);
        let mut delay = RecordingDelay::default();
        ow.reset(&mut delay).unwrap();
        assert_eq!(delay.us, [480, 70, 410]);
        ow.release().done();
    }

    #[test]
    fn reset_without_device() {
        let mut ow = bus(vec![
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(State::High),
        ]);
        assert_eq!(ow.reset(&mut MockNoop::new()), Err(OneWireError::NoPresence));
        ow.release().done();
    }

    #[test]
    fn write_slot_timing() {
        let mut ow = bus(write_slots());
        let mut delay = RecordingDelay::default();
        ow.write_byte(&mut delay, 0xCC).unwrap();

        // 0xCC LSB first: 0 0 1 1 0 0 1 1
        let zero = [60, 10];
        let one = [6, 64];
        let expected: Vec<u32> = [zero, zero, one, one, zero, zero, one, one].concat();
        assert_eq!(delay.us, expected);
        ow.release().done();
    }

    #[test]
    fn slot_phases_run_masked() {
        let mut expected = vec![Transaction::set(State::Low), Transaction::set(State::High), Transaction::get(State::Low)];
        expected.extend([Transaction::set(State::Low), Transaction::set(State::High)]);
        expected.extend([Transaction::set(State::Low), Transaction::set(State::High)]);
        expected.extend([Transaction::set(State::Low), Transaction::set(State::High), Transaction::get(State::High)]);
        let mut ow = bus(expected);
        let mut delay = RecordingDelay::default();

        ow.reset(&mut delay).unwrap();
        ow.write_bit(&mut delay, true).unwrap();
        ow.write_bit(&mut delay, false).unwrap();
        assert_eq!(ow.read_bit(&mut delay), Ok(true));

        // one section per slot; the reset pulse and the recovery tails stay outside
        assert_eq!(delay.masked, [vec![70], vec![6], vec![60], vec![6, 9]]);
        assert_eq!(delay.us, [480, 70, 410, 6, 64, 60, 10, 6, 9, 55]);
        ow.release().done();
    }

    #[test]
    fn every_bit_of_a_byte_gets_its_own_section() {
        let mut ow = bus(read_slots(0x00));
        let mut delay = RecordingDelay::default();
        assert_eq!(ow.read_byte(&mut delay), Ok(0x00));
        assert_eq!(delay.masked.len(), 8);
        assert!(delay.masked.iter().all(|s| s == &[6, 9]));
        ow.release().done();
    }

    #[test]
    fn read_byte_lsb_first() {
        let mut ow = bus(read_slots(0xA5));
        assert_eq!(ow.read_byte(&mut MockNoop::new()), Ok(0xA5));
        ow.release().done();
    }
}
