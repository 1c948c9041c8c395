//! Serial console used for log output
use embedded_hal::serial;
use ufmt::uWrite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    /// Most verbose level compiled into this build
    pub const fn max_compiled() -> Level {
        if cfg!(feature = "debug") {
            Level::Debug
        } else {
            Level::Info
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Level::Error => "[ERR] ",
            Level::Warn => "[WRN] ",
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
        }
    }
}

pub struct SerialConsole<W> {
    serial: W,
    level: Level,
}

impl<W: serial::Write<u8>> SerialConsole<W> {
    pub fn new(serial: W, level: Level) -> Self {
        let level = if level > Level::max_compiled() { Level::max_compiled() } else { level };
        Self { serial, level }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn write_byte(&mut self, byte: u8) {
        nb::block!(self.serial.write(byte)).ok();
    }

    pub fn write_line(&mut self, s: &str) {
        self.write_str(s).ok();
        self.write_str("\r\n").ok();
    }

    /// Write the level tag; returns false when the level is filtered out
    pub fn begin(&mut self, level: Level) -> bool {
        if !self.enabled(level) {
            return false;
        }
        self.write_str(level.tag()).ok();
        true
    }

    pub fn log(&mut self, level: Level, msg: &str) {
        if self.begin(level) {
            self.write_line(msg);
        }
    }

    pub fn error(&mut self, msg: &str) {
        self.log(Level::Error, msg);
    }

    pub fn warn(&mut self, msg: &str) {
        self.log(Level::Warn, msg);
    }

    pub fn info(&mut self, msg: &str) {
        self.log(Level::Info, msg);
    }

    pub fn debug(&mut self, msg: &str) {
        self.log(Level::Debug, msg);
    }

    // Debug helper - print hex value
    pub fn write_hex(&mut self, val: u8) {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        self.write_byte(HEX_CHARS[(val >> 4) as usize]);
        self.write_byte(HEX_CHARS[(val & 0xF) as usize]);
    }

    pub fn debug_hex(&mut self, msg: &str, val: u8) {
        if self.begin(Level::Debug) {
            self.write_str(msg).ok();
            self.write_str(": 0x").ok();
            self.write_hex(val);
            self.write_str("\r\n").ok();
        }
    }

    pub fn flush(&mut self) {
        nb::block!(self.serial.flush()).ok();
    }

    pub fn release(self) -> W {
        self.serial
    }
}

impl<W: serial::Write<u8> + serial::Read<u8>> SerialConsole<W> {
    pub fn read_byte(&mut self) -> Option<u8> {
        self.serial.read().ok()
    }
}

impl<W: serial::Write<u8>> uWrite for SerialConsole<W> {
    type Error = W::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for byte in s.bytes() {
            nb::block!(self.serial.write(byte))?;
        }
        Ok(())
    }
}

/// Log a formatted line: `log!(console, Level::Info, "temp {}", t)`
#[macro_export]
macro_rules! log {
    ($console:expr, $level:expr, $($arg:tt)+) => {{
        let console = &mut $console;
        if console.begin($level) {
            #[allow(unused_imports)]
            use $crate::ufmt;
            $crate::ufmt::uwrite!(console, $($arg)+).ok();
            $crate::ufmt::uWrite::write_str(console, "\r\n").ok();
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::serial::{Mock as SerialMock, Transaction};
    use std::vec::Vec;

    fn bytes(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn info_line_is_tagged() {
        let serial = SerialMock::new(&[Transaction::write_many(bytes("[INF] Ready\r\n"))]);
        let mut console = SerialConsole::new(serial, Level::Info);
        console.info("Ready");
        console.release().done();
    }

    #[test]
    fn filtered_levels_write_nothing() {
        let serial = SerialMock::new(&[Transaction::write_many(bytes("[WRN] hot\r\n"))]);
        let mut console = SerialConsole::new(serial, Level::Warn);
        console.info("skipped");
        console.debug_hex("skipped", 1);
        console.warn("hot");
        console.release().done();
    }

    #[test]
    fn formatted_log() {
        let serial = SerialMock::new(&[Transaction::write_many(bytes("[ERR] probe 2 missing\r\n"))]);
        let mut console = SerialConsole::new(serial, Level::Info);
        crate::log!(console, Level::Error, "probe {} missing", 2u8);
        console.release().done();
    }

    mod caller_without_ufmt {
        use crate::drivers::console::{Level, SerialConsole};
        use embedded_hal_mock::serial::{Mock as SerialMock, Transaction};

        // an unrelated `ufmt` at the call site must not capture the expansion
        #[allow(dead_code)]
        mod ufmt {}

        #[test]
        fn log_resolves_through_crate_path() {
            let serial = SerialMock::new(&[Transaction::write_many(b"[INF] fan 3\r\n".to_vec())]);
            let mut console = SerialConsole::new(serial, Level::Info);
            crate::log!(console, Level::Info, "fan {}", 3u8);
            console.release().done();
        }
    }

    #[test]
    fn debug_is_capped_by_build() {
        let serial = SerialMock::<u8>::new(&[]);
        let console = SerialConsole::new(serial, Level::Debug);
        assert_eq!(console.level(), Level::max_compiled());
        console.release().done();
    }

    #[cfg(feature = "debug")]
    #[test]
    fn hex_dump() {
        let serial = SerialMock::new(&[Transaction::write_many(bytes("[DBG] cfg: 0x3F\r\n"))]);
        let mut console = SerialConsole::new(serial, Level::Debug);
        console.debug_hex("cfg", 0x3F);
        console.release().done();
    }
}
