//! Hardware PWM on the six output compare pins.
//!
//! All three timers run 8-bit fast PWM undivided, 62.5 kHz at 16 MHz. Timer0
//! is set up by the wiring clock; `init` configures Timer1 and Timer2.

use super::gpio::{Output, Pin};
use crate::board::{pwm_channel, PwmChannel};
use avr_device::atmega328p::{TC0, TC1, TC2};
use avr_device::interrupt;
use embedded_hal::PwmPin;

const WGM_FAST_PWM: u8 = 0x03;
// Timer1 8-bit fast PWM: WGM10 in TCCR1A, WGM12 in TCCR1B
const WGM10: u8 = 0x01;
const WGM12: u8 = 0x08;
const CLOCK_DIRECT: u8 = 0x01;

// Non-inverting compare output
const COM_A: u8 = 0x80;
const COM_B: u8 = 0x20;

pub fn init(tc1: &TC1, tc2: &TC2) {
    unsafe {
        tc1.tccr1a.write(|w| w.bits(WGM10));
        tc1.tccr1b.write(|w| w.bits(WGM12 | CLOCK_DIRECT));
        tc2.tccr2a.write(|w| w.bits(WGM_FAST_PWM));
        tc2.tccr2b.write(|w| w.bits(CLOCK_DIRECT));
    }
}

pub struct PwmOutput {
    channel: PwmChannel,
    pin: Pin<Output>,
    duty: u8,
    enabled: bool,
}

impl PwmOutput {
    /// `None` unless `pin` has an output compare unit
    pub fn new(pin: u8) -> Option<Self> {
        let channel = pwm_channel(pin)?;
        let pin = Pin::output(pin)?;
        Some(Self { channel, pin, duty: 0, enabled: false })
    }

    pub fn channel(&self) -> PwmChannel {
        self.channel
    }

    fn apply(&mut self) {
        // fast PWM still pulses once per period at 0, so drive the pin low
        let connected = self.enabled && self.duty > 0;
        write_compare(self.channel, self.duty);
        connect(self.channel, connected);
        if !connected {
            self.pin.drive(false);
        }
    }
}

impl PwmPin for PwmOutput {
    type Duty = u8;

    fn disable(&mut self) {
        self.enabled = false;
        self.apply();
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.apply();
    }

    fn get_duty(&self) -> u8 {
        self.duty
    }

    fn get_max_duty(&self) -> u8 {
        u8::MAX
    }

    fn set_duty(&mut self, duty: u8) {
        self.duty = duty;
        self.apply();
    }
}

fn write_compare(channel: PwmChannel, duty: u8) {
    unsafe {
        match channel {
            PwmChannel::Timer0A => (*TC0::ptr()).ocr0a.write(|w| w.bits(duty)),
            PwmChannel::Timer0B => (*TC0::ptr()).ocr0b.write(|w| w.bits(duty)),
            PwmChannel::Timer1A => (*TC1::ptr()).ocr1a.write(|w| w.bits(duty as u16)),
            PwmChannel::Timer1B => (*TC1::ptr()).ocr1b.write(|w| w.bits(duty as u16)),
            PwmChannel::Timer2A => (*TC2::ptr()).ocr2a.write(|w| w.bits(duty)),
            PwmChannel::Timer2B => (*TC2::ptr()).ocr2b.write(|w| w.bits(duty)),
        }
    }
}

fn connect(channel: PwmChannel, on: bool) {
    let bit = match channel {
        PwmChannel::Timer0A | PwmChannel::Timer1A | PwmChannel::Timer2A => COM_A,
        _ => COM_B,
    };
    let update = |r: u8| if on { r | bit } else { r & !bit };
    interrupt::free(|_| unsafe {
        match channel {
            PwmChannel::Timer0A | PwmChannel::Timer0B => {
                (*TC0::ptr()).tccr0a.modify(|r, w| w.bits(update(r.bits())))
            }
            PwmChannel::Timer1A | PwmChannel::Timer1B => {
                (*TC1::ptr()).tccr1a.modify(|r, w| w.bits(update(r.bits())))
            }
            PwmChannel::Timer2A | PwmChannel::Timer2B => {
                (*TC2::ptr()).tccr2a.modify(|r, w| w.bits(update(r.bits())))
            }
        }
    })
}
