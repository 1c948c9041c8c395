//! 16x2 status screen.
//!
//! ```text
//! 12:34 AUTO     *
//!  25.5°C  !    F#
//! ```
//!
//! `*` is the on/off glyph, `F#` the fan glyph and its speed bar. Frames
//! are composed in memory and only rows that changed are sent to the LCD.

use crate::application::{Controller, LightMode};
use crate::drivers::ds18b20::Temperature;
use crate::drivers::fan::FanLevel;
use crate::drivers::lcd::{self, Lcd, COLUMNS, ROWS};
use crate::glyphs::GlyphId;
use embedded_hal::blocking::i2c::Write;

pub type Row = [u8; COLUMNS as usize];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    rows: [Row; ROWS as usize],
}

/// Everything the screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub hours: u8,
    pub minutes: u8,
    pub mode: LightMode,
    pub lid_open: bool,
    pub lights_on: bool,
    pub temperature: Option<Temperature>,
    pub alarm: bool,
    /// `None` on boards without a fan
    pub fan: Option<FanLevel>,
}

impl Status {
    pub fn from_controller(
        controller: &Controller,
        (hours, minutes): (u8, u8),
        lights_on: bool,
        fan_fitted: bool,
    ) -> Self {
        Status {
            hours,
            minutes,
            mode: controller.mode(),
            lid_open: controller.lid_open(),
            lights_on,
            temperature: controller.temperature(),
            alarm: controller.alarm().is_some(),
            fan: if fan_fitted && !controller.lid_open() { Some(controller.fan()) } else { None },
        }
    }
}

impl Frame {
    pub const BLANK: Frame = Frame { rows: [[b' '; COLUMNS as usize]; ROWS as usize] };

    pub fn render(status: &Status) -> Frame {
        let mut frame = Frame::BLANK;

        let top = &mut frame.rows[0];
        put_two_digits(&mut top[0..2], status.hours);
        top[2] = b':';
        put_two_digits(&mut top[3..5], status.minutes);
        let label = if status.lid_open { "LID " } else { status.mode.label() };
        top[6..10].copy_from_slice(label.as_bytes());
        top[15] = if status.lights_on { GlyphId::On } else { GlyphId::Off }.char_code();

        let bottom = &mut frame.rows[1];
        match status.temperature {
            Some(t) => bottom[0..5].copy_from_slice(&format_tenths(t.tenths())),
            None => bottom[0..5].copy_from_slice(b" --.-"),
        }
        bottom[5] = GlyphId::Degrees.char_code();
        bottom[6] = b'C';
        if status.alarm {
            bottom[8] = b'!';
        }
        if let Some(level) = status.fan {
            bottom[14] = GlyphId::Fan.char_code();
            if let Some(bar) = level.glyph() {
                bottom[15] = bar.char_code();
            }
        }

        frame
    }

    pub fn row(&self, row: u8) -> &Row {
        &self.rows[row as usize]
    }

    /// Send the rows that differ from `previous`, or all of them
    pub fn draw<I2C, E>(&self, lcd: &mut Lcd<I2C>, previous: Option<&Frame>) -> lcd::Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        for (index, row) in self.rows.iter().enumerate() {
            if previous.map_or(false, |p| p.rows[index] == *row) {
                continue;
            }
            lcd.set_cursor(0, index as u8)?;
            for &code in row {
                lcd.write_char_code(code)?;
            }
        }
        Ok(())
    }
}

fn put_two_digits(out: &mut [u8], value: u8) {
    out[0] = b'0' + (value / 10) % 10;
    out[1] = b'0' + value % 10;
}

/// Right aligned, one decimal, for -99.9 to 999.9
fn format_tenths(tenths: i16) -> [u8; 5] {
    let mut out = [b' '; 5];
    let mut value = tenths.unsigned_abs();
    out[4] = b'0' + (value % 10) as u8;
    out[3] = b'.';
    value /= 10;

    let mut i = 2;
    loop {
        out[i] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 || i == 0 {
            break;
        }
        i -= 1;
    }
    if tenths < 0 && i > 0 {
        out[i - 1] = b'-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::drivers::switches::{Switch, SwitchEvent};
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction};
    use std::vec;
    use std::vec::Vec;

    fn status() -> Status {
        Status {
            hours: 9,
            minutes: 5,
            mode: LightMode::Auto,
            lid_open: false,
            lights_on: true,
            temperature: Some(Temperature::from_tenths(255)),
            alarm: false,
            fan: Some(FanLevel::Medium),
        }
    }

    #[test]
    fn temperature_formatting() {
        assert_eq!(&format_tenths(255), b" 25.5");
        assert_eq!(&format_tenths(1250), b"125.0");
        assert_eq!(&format_tenths(-50), b" -5.0");
        assert_eq!(&format_tenths(-101), b"-10.1");
        assert_eq!(&format_tenths(-5), b" -0.5");
        assert_eq!(&format_tenths(0), b"  0.0");
    }

    #[test]
    fn normal_screen() {
        let frame = Frame::render(&status());
        let d = GlyphId::Degrees.char_code();
        assert_eq!(frame.row(0)[..10], *b"09:05 AUTO");
        assert_eq!(frame.row(0)[15], GlyphId::On.char_code());
        assert_eq!(frame.row(1)[..7], [b' ', b'2', b'5', b'.', b'5', d, b'C']);
        assert_eq!(frame.row(1)[8], b' ');
        assert_eq!(frame.row(1)[14], GlyphId::Fan.char_code());
        assert_eq!(frame.row(1)[15], GlyphId::Fan2.char_code());
    }

    #[test]
    fn missing_probe_and_alarm() {
        let frame = Frame::render(&Status { temperature: None, alarm: true, ..status() });
        assert_eq!(frame.row(1)[..5], *b" --.-");
        assert_eq!(frame.row(1)[8], b'!');
    }

    #[test]
    fn lid_and_fan_states() {
        let frame = Frame::render(&Status {
            lid_open: true,
            lights_on: false,
            fan: Some(FanLevel::Off),
            ..status()
        });
        assert_eq!(frame.row(0)[6..10], *b"LID ");
        assert_eq!(frame.row(0)[15], GlyphId::Off.char_code());
        assert_eq!(frame.row(1)[14], GlyphId::Fan.char_code());
        assert_eq!(frame.row(1)[15], b' ');

        let frame = Frame::render(&Status { fan: None, ..status() });
        assert_eq!(frame.row(1)[14..], *b"  ");
    }

    #[test]
    fn status_from_controller() {
        let mut c = Controller::new(Settings::default());
        c.set_temperature(Some(Temperature::from_tenths(305)));
        let s = Status::from_controller(&c, (21, 0), true, true);
        assert!(s.alarm);
        assert_eq!(s.fan, Some(FanLevel::High));

        c.handle_switch(SwitchEvent::Pressed(Switch::Lid));
        let s = Status::from_controller(&c, (21, 0), true, true);
        assert!(s.lid_open);
        assert_eq!(s.fan, None);
    }

    fn data_writes(row: &Row) -> Vec<Transaction> {
        // backlight on, RS set, EN strobed per nibble
        let mut t = Vec::new();
        for &code in row {
            for nibble in [code & 0xF0, code << 4] {
                t.push(Transaction::write(0x27, vec![nibble | 0x0D]));
                t.push(Transaction::write(0x27, vec![nibble | 0x09]));
            }
        }
        t
    }

    #[test]
    fn draws_only_changed_rows() {
        let old = Frame::render(&status());
        let new = Frame::render(&Status { temperature: Some(Temperature::from_tenths(260)), ..status() });
        assert_eq!(old.row(0), new.row(0));

        // set DDRAM 0x40
        let mut expected = vec![
            Transaction::write(0x27, vec![0xCC]),
            Transaction::write(0x27, vec![0xC8]),
            Transaction::write(0x27, vec![0x0C]),
            Transaction::write(0x27, vec![0x08]),
        ];
        expected.extend(data_writes(new.row(1)));

        let mut lcd = Lcd::new(I2cMock::new(&expected), 0x27);
        new.draw(&mut lcd, Some(&old)).unwrap();
        new.draw(&mut lcd, Some(&new)).unwrap();
        lcd.release().done();
    }
}
