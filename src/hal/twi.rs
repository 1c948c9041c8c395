//! TWI (I2C) master, write-only
use crate::config::CPU_FREQ_HZ;
use avr_device::atmega328p::TWI;
use embedded_hal::blocking::i2c::Write;

/// Bus speed
#[derive(Clone, Copy)]
pub enum TwiSpeed {
    Standard100k,
    Fast400k,
}

impl TwiSpeed {
    const fn hz(self) -> u32 {
        match self {
            TwiSpeed::Standard100k => 100_000,
            TwiSpeed::Fast400k => 400_000,
        }
    }

    /// TWBR with the prescaler at 1
    const fn bit_rate(self) -> u8 {
        ((CPU_FREQ_HZ / self.hz() - 16) / 2) as u8
    }
}

#[derive(Clone, Copy, PartialEq)]
#[repr(u8)]
enum TwiStatus {
    StartTransmitted = 0x08,
    RepStartTransmitted = 0x10,
    AddrWriteAck = 0x18,
    DataWriteAck = 0x28,
}

const TWINT: u8 = 0x80;
const TWSTA: u8 = 0x20;
const TWSTO: u8 = 0x10;
const TWEN: u8 = 0x04;

/// Polls of TWINT before a transfer counts as hung
const SPIN_LIMIT: u16 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiError {
    /// Unexpected status after START
    Start(u8),
    AddressNack(u8),
    DataNack(u8),
    Timeout,
}

pub struct Twi {
    twi: TWI,
}

impl Twi {
    pub fn new(twi: TWI, speed: TwiSpeed) -> Self {
        unsafe {
            twi.twsr.write(|w| w.bits(0));
            twi.twbr.write(|w| w.bits(speed.bit_rate()));
            twi.twcr.write(|w| w.bits(TWEN));
        }
        Self { twi }
    }

    fn wait(&self) -> Result<u8, TwiError> {
        for _ in 0..SPIN_LIMIT {
            if self.twi.twcr.read().bits() & TWINT != 0 {
                return Ok(self.twi.twsr.read().bits() & 0xF8);
            }
        }
        Err(TwiError::Timeout)
    }

    fn start(&mut self) -> Result<(), TwiError> {
        unsafe { self.twi.twcr.write(|w| w.bits(TWINT | TWSTA | TWEN)) };
        let status = self.wait()?;
        if status == TwiStatus::StartTransmitted as u8 || status == TwiStatus::RepStartTransmitted as u8 {
            Ok(())
        } else {
            Err(TwiError::Start(status))
        }
    }

    fn stop(&mut self) {
        unsafe { self.twi.twcr.write(|w| w.bits(TWINT | TWSTO | TWEN)) };
        for _ in 0..SPIN_LIMIT {
            if self.twi.twcr.read().bits() & TWSTO == 0 {
                break;
            }
        }
    }

    fn transmit(&mut self, byte: u8, ack: TwiStatus) -> Result<(), u8> {
        unsafe {
            self.twi.twdr.write(|w| w.bits(byte));
            self.twi.twcr.write(|w| w.bits(TWINT | TWEN));
        }
        match self.wait() {
            Ok(status) if status == ack as u8 => Ok(()),
            Ok(status) => Err(status),
            Err(_) => Err(0),
        }
    }

    fn write_frame(&mut self, address: u8, bytes: &[u8]) -> Result<(), TwiError> {
        self.start()?;
        self.transmit(address << 1, TwiStatus::AddrWriteAck)
            .map_err(TwiError::AddressNack)?;
        for &byte in bytes {
            self.transmit(byte, TwiStatus::DataWriteAck).map_err(TwiError::DataNack)?;
        }
        Ok(())
    }
}

impl Write for Twi {
    type Error = TwiError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), TwiError> {
        let result = self.write_frame(address, bytes);
        self.stop();
        result
    }
}
