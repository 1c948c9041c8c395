//! HD44780 1602 LCD behind a PCF8574 I2C backpack.
//!
//! Expander bits: P0 RS, P1 RW, P2 EN, P3 backlight, P4-P7 data D4-D7.
//! The controller runs in 4-bit mode; every byte goes out as two nibbles,
//! each latched by an EN high/low pair. At 100 kHz one expander write takes
//! longer than the controller's 37 us command time, so only clear and home
//! need explicit waits.

use crate::glyphs::{Glyph, GlyphId, GlyphSet};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::blocking::i2c::Write;

pub const COLUMNS: u8 = 16;
pub const ROWS: u8 = 2;

/// Number of CGRAM slots
pub const CGRAM_SLOTS: u8 = 8;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_HOME: u8 = 0x02;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_CGRAM: u8 = 0x40;
const CMD_SET_DDRAM: u8 = 0x80;

const ENTRY_LEFT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const TWO_LINES: u8 = 0x08;

const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdError<E> {
    Bus(E),
    InvalidSlot(u8),
    InvalidPosition { col: u8, row: u8 },
}

impl<E> From<E> for LcdError<E> {
    fn from(e: E) -> Self {
        LcdError::Bus(e)
    }
}

pub type Result<T, E> = core::result::Result<T, LcdError<E>>;

pub struct Lcd<I2C> {
    i2c: I2C,
    address: u8,
    backlight: u8,
}

impl<I2C, E> Lcd<I2C>
where
    I2C: Write<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address, backlight: BACKLIGHT }
    }

    /// Power-on initialisation into 4-bit, two line mode
    pub fn init<D: DelayMs<u16> + DelayUs<u16>>(&mut self, delay: &mut D) -> Result<(), E> {
        delay.delay_ms(50);
        self.expander_write(self.backlight)?;

        // Three times 8-bit function set, then switch to 4-bit
        self.write_nibble(0x30)?;
        delay.delay_us(4500);
        self.write_nibble(0x30)?;
        delay.delay_us(4500);
        self.write_nibble(0x30)?;
        delay.delay_us(150);
        self.write_nibble(0x20)?;

        self.command(CMD_FUNCTION_SET | TWO_LINES)?;
        self.command(CMD_DISPLAY_CONTROL | DISPLAY_ON)?;
        self.clear(delay)?;
        self.command(CMD_ENTRY_MODE | ENTRY_LEFT)?;
        Ok(())
    }

    pub fn clear<D: DelayUs<u16>>(&mut self, delay: &mut D) -> Result<(), E> {
        self.command(CMD_CLEAR)?;
        delay.delay_us(2000);
        Ok(())
    }

    pub fn home<D: DelayUs<u16>>(&mut self, delay: &mut D) -> Result<(), E> {
        self.command(CMD_HOME)?;
        delay.delay_us(2000);
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), E> {
        if col >= COLUMNS || row >= ROWS {
            return Err(LcdError::InvalidPosition { col, row });
        }
        self.command(CMD_SET_DDRAM | (col + ROW_OFFSETS[row as usize]))
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), E> {
        self.backlight = if on { BACKLIGHT } else { 0 };
        self.expander_write(0)
    }

    pub fn write_char_code(&mut self, code: u8) -> Result<(), E> {
        self.send(code, RS)
    }

    pub fn write_glyph(&mut self, glyph: GlyphId) -> Result<(), E> {
        self.write_char_code(glyph.char_code())
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), E> {
        for byte in s.bytes() {
            self.write_char_code(byte)?;
        }
        Ok(())
    }

    /// Program one CGRAM slot. Leaves the address counter in CGRAM, so set
    /// the cursor before printing again.
    pub fn create_char(&mut self, slot: u8, glyph: &Glyph) -> Result<(), E> {
        if slot >= CGRAM_SLOTS {
            return Err(LcdError::InvalidSlot(slot));
        }
        self.command(CMD_SET_CGRAM | (slot << 3))?;
        for &row in glyph.rows() {
            self.send(row, RS)?;
        }
        Ok(())
    }

    /// Load a whole glyph set into its slots and return the cursor home
    pub fn load_glyphs(&mut self, glyphs: &GlyphSet) -> Result<(), E> {
        for (id, glyph) in glyphs.iter() {
            self.create_char(id.slot(), glyph)?;
        }
        self.set_cursor(0, 0)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn command(&mut self, value: u8) -> Result<(), E> {
        self.send(value, 0)
    }

    fn send(&mut self, value: u8, mode: u8) -> Result<(), E> {
        self.write_nibble((value & 0xF0) | mode)?;
        self.write_nibble((value << 4) | mode)
    }

    fn write_nibble(&mut self, bits: u8) -> Result<(), E> {
        self.expander_write(bits | EN)?;
        self.expander_write(bits & !EN)
    }

    fn expander_write(&mut self, bits: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[bits | self.backlight])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::{AQUA328_GLYPHS, DEGREES_SMALL};
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction};
    use std::vec;
    use std::vec::Vec;

    const ADDR: u8 = 0x27;

    fn byte_writes(value: u8, rs: bool) -> Vec<Transaction> {
        let mode = (if rs { RS } else { 0 }) | BACKLIGHT;
        let hi = (value & 0xF0) | mode;
        let lo = (value << 4) | mode;
        vec![
            Transaction::write(ADDR, vec![hi | EN]),
            Transaction::write(ADDR, vec![hi]),
            Transaction::write(ADDR, vec![lo | EN]),
            Transaction::write(ADDR, vec![lo]),
        ]
    }

    #[test]
    fn cursor_on_second_row() {
        // DDRAM 0xC1: nibbles C and 1 with backlight and EN strobes
        let i2c = I2cMock::new(&[
            Transaction::write(ADDR, vec![0xCC]),
            Transaction::write(ADDR, vec![0xC8]),
            Transaction::write(ADDR, vec![0x1C]),
            Transaction::write(ADDR, vec![0x18]),
        ]);
        let mut lcd = Lcd::new(i2c, ADDR);
        lcd.set_cursor(1, 1).unwrap();
        lcd.release().done();
    }

    #[test]
    fn rejects_off_screen_cursor() {
        let mut lcd = Lcd::new(I2cMock::new(&[]), ADDR);
        assert_eq!(lcd.set_cursor(16, 0), Err(LcdError::InvalidPosition { col: 16, row: 0 }));
        assert_eq!(lcd.set_cursor(0, 2), Err(LcdError::InvalidPosition { col: 0, row: 2 }));
        lcd.release().done();
    }

    #[test]
    fn create_char_writes_cgram() {
        let mut expected = byte_writes(0x40 | (2 << 3), false);
        for &row in DEGREES_SMALL.rows() {
            expected.extend(byte_writes(row, true));
        }
        // CGRAM address for slot 2 is 0x50
        assert_eq!(expected.len(), 4 * 9);

        let mut lcd = Lcd::new(I2cMock::new(&expected), ADDR);
        lcd.create_char(2, &DEGREES_SMALL).unwrap();
        lcd.release().done();
    }

    #[test]
    fn create_char_rejects_slot_eight() {
        let mut lcd = Lcd::new(I2cMock::new(&[]), ADDR);
        assert_eq!(lcd.create_char(8, &DEGREES_SMALL), Err(LcdError::InvalidSlot(8)));
        lcd.release().done();
    }

    #[test]
    fn load_glyphs_fills_slots_in_order() {
        let mut expected = Vec::new();
        for (slot, glyph) in AQUA328_GLYPHS.iter() {
            expected.extend(byte_writes(0x40 | (slot.slot() << 3), false));
            for &row in glyph.rows() {
                expected.extend(byte_writes(row, true));
            }
        }
        expected.extend(byte_writes(0x80, false));

        let mut lcd = Lcd::new(I2cMock::new(&expected), ADDR);
        lcd.load_glyphs(&AQUA328_GLYPHS).unwrap();
        lcd.release().done();
    }

    #[test]
    fn text_and_glyphs_are_data_writes() {
        let mut expected = byte_writes(b'O', true);
        expected.extend(byte_writes(b'K', true));
        expected.extend(byte_writes(GlyphId::Fan.char_code(), true));

        let mut lcd = Lcd::new(I2cMock::new(&expected), ADDR);
        lcd.write_str("OK").unwrap();
        lcd.write_glyph(GlyphId::Fan).unwrap();
        lcd.release().done();
    }

    #[test]
    fn init_sequence() {
        let mut expected = vec![Transaction::write(ADDR, vec![BACKLIGHT])];
        for nibble in [0x30, 0x30, 0x30, 0x20] {
            expected.push(Transaction::write(ADDR, vec![nibble | BACKLIGHT | EN]));
            expected.push(Transaction::write(ADDR, vec![nibble | BACKLIGHT]));
        }
        for cmd in [0x28, 0x0C, 0x01, 0x06] {
            expected.extend(byte_writes(cmd, false));
        }

        let mut lcd = Lcd::new(I2cMock::new(&expected), ADDR);
        lcd.init(&mut MockNoop::new()).unwrap();
        lcd.release().done();
    }

    #[test]
    fn backlight_off_clears_bit() {
        let mut lcd = Lcd::new(I2cMock::new(&[Transaction::write(ADDR, vec![0x00])]), ADDR);
        lcd.set_backlight(false).unwrap();
        lcd.release().done();
    }
}
