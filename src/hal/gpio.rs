//! Digital pins addressed by Arduino pin number
use crate::board::{port_bit, Port};
use avr_device::atmega328p::{PORTB, PORTC, PORTD};
use avr_device::interrupt;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::{InputPin, OutputPin};

pub struct Input;
pub struct Output;
/// Driven low or released to an external pull-up
pub struct OpenDrain;

pub struct Pin<MODE> {
    port: Port,
    mask: u8,
    _mode: PhantomData<MODE>,
}

impl<MODE> Pin<MODE> {
    fn take(pin: u8) -> Option<Self> {
        let (port, bit) = port_bit(pin)?;
        Some(Pin { port, mask: 1 << bit, _mode: PhantomData })
    }

    fn level(&self) -> bool {
        read_pin(self.port) & self.mask != 0
    }
}

impl Pin<Input> {
    /// Input with the internal pull-up on
    pub fn pull_up(pin: u8) -> Option<Self> {
        let p = Self::take(pin)?;
        modify_ddr(p.port, |r| r & !p.mask);
        modify_port(p.port, |r| r | p.mask);
        Some(p)
    }
}

impl Pin<Output> {
    /// Output, starting low
    pub fn output(pin: u8) -> Option<Self> {
        let p = Self::take(pin)?;
        modify_port(p.port, |r| r & !p.mask);
        modify_ddr(p.port, |r| r | p.mask);
        Some(p)
    }

    #[inline]
    pub fn drive(&mut self, high: bool) {
        let mask = self.mask;
        if high {
            modify_port(self.port, |r| r | mask);
        } else {
            modify_port(self.port, |r| r & !mask);
        }
    }
}

impl Pin<OpenDrain> {
    /// Released, with the internal pull-up off
    pub fn open_drain(pin: u8) -> Option<Self> {
        let p = Self::take(pin)?;
        modify_port(p.port, |r| r & !p.mask);
        modify_ddr(p.port, |r| r & !p.mask);
        Some(p)
    }
}

impl InputPin for Pin<Input> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

impl OutputPin for Pin<Output> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

impl InputPin for Pin<OpenDrain> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

impl OutputPin for Pin<OpenDrain> {
    type Error = Infallible;

    // PORT stays 0, so switching DDR alone pulls down or releases
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mask = self.mask;
        modify_ddr(self.port, |r| r | mask);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mask = self.mask;
        modify_ddr(self.port, |r| r & !mask);
        Ok(())
    }
}

fn read_pin(port: Port) -> u8 {
    unsafe {
        match port {
            Port::B => (*PORTB::ptr()).pinb.read().bits(),
            Port::C => (*PORTC::ptr()).pinc.read().bits(),
            Port::D => (*PORTD::ptr()).pind.read().bits(),
        }
    }
}

fn modify_ddr(port: Port, f: impl FnOnce(u8) -> u8) {
    interrupt::free(|_| unsafe {
        match port {
            Port::B => (*PORTB::ptr()).ddrb.modify(|r, w| w.bits(f(r.bits()))),
            Port::C => (*PORTC::ptr()).ddrc.modify(|r, w| w.bits(f(r.bits()))),
            Port::D => (*PORTD::ptr()).ddrd.modify(|r, w| w.bits(f(r.bits()))),
        }
    })
}

fn modify_port(port: Port, f: impl FnOnce(u8) -> u8) {
    interrupt::free(|_| unsafe {
        match port {
            Port::B => (*PORTB::ptr()).portb.modify(|r, w| w.bits(f(r.bits()))),
            Port::C => (*PORTC::ptr()).portc.modify(|r, w| w.bits(f(r.bits()))),
            Port::D => (*PORTD::ptr()).portd.modify(|r, w| w.bits(f(r.bits()))),
        }
    })
}
