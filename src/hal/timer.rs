//! Timer0 wiring clock.
//!
//! Timer0 runs in fast PWM mode for the D5/D6 light channels and its
//! overflow interrupt keeps the millisecond count. The count always assumes
//! the stock /64 prescaler, so with Timer0 running faster every reading and
//! every delay here runs fast by the time scale. Wrap them in `ScaledClock`
//! and `ScaledDelay`.
//!
//! `CycleDelay` counts CPU cycles instead and needs no correction.

use crate::config::CPU_FREQ_HZ;
use crate::drivers::onewire::SlotDelay;
use crate::timing::{Clock, Prescaler};
use avr_device::atmega328p::TC0;
use avr_device::interrupt::{self, Mutex};
use core::cell::Cell;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

// 256 ticks of 4 us per overflow at the assumed prescaler
const RAW_MICROS_PER_TICK: u32 = 4;
const MICROS_PER_OVERFLOW: u32 = RAW_MICROS_PER_TICK * 256;
const MILLIS_INC: u32 = MICROS_PER_OVERFLOW / 1000;
// Leftover microseconds, counted in 8 us units to fit a u8
const FRACT_INC: u8 = ((MICROS_PER_OVERFLOW % 1000) >> 3) as u8;
const FRACT_MAX: u8 = (1000 >> 3) as u8;

const WGM_FAST_PWM: u8 = 0x03;
const TOIE0: u8 = 0x01;
const TOV0: u8 = 0x01;

static MILLIS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static FRACT: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));
static OVERFLOWS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

#[avr_device::interrupt(atmega328p)]
fn TIMER0_OVF() {
    interrupt::free(|cs| {
        let millis = MILLIS.borrow(cs);
        let fract = FRACT.borrow(cs);
        let mut m = millis.get().wrapping_add(MILLIS_INC);
        let mut f = fract.get() + FRACT_INC;
        if f >= FRACT_MAX {
            f -= FRACT_MAX;
            m = m.wrapping_add(1);
        }
        millis.set(m);
        fract.set(f);

        let overflows = OVERFLOWS.borrow(cs);
        overflows.set(overflows.get().wrapping_add(1));
    });
}

/// Handle on the running Timer0 counters
#[derive(Clone, Copy)]
pub struct WiringClock {
    _private: (),
}

impl WiringClock {
    /// Start Timer0 at `prescaler` with the overflow interrupt on. Interrupts
    /// still have to be enabled globally.
    pub fn start(tc0: &TC0, prescaler: Prescaler) -> Self {
        unsafe {
            tc0.tccr0a.write(|w| w.bits(WGM_FAST_PWM));
            tc0.tccr0b.write(|w| w.bits(prescaler.clock_select()));
            tc0.timsk0.write(|w| w.bits(TOIE0));
        }
        WiringClock { _private: () }
    }
}

impl Clock for WiringClock {
    fn raw_millis(&self) -> u32 {
        interrupt::free(|cs| MILLIS.borrow(cs).get())
    }

    fn raw_micros(&self) -> u32 {
        interrupt::free(|cs| {
            let tc0 = unsafe { &*TC0::ptr() };
            let mut overflows = OVERFLOWS.borrow(cs).get();
            let ticks = tc0.tcnt0.read().bits();
            // overflow pending but not yet serviced
            if tc0.tifr0.read().bits() & TOV0 != 0 && ticks < 255 {
                overflows = overflows.wrapping_add(1);
            }
            ((overflows << 8) | ticks as u32).wrapping_mul(RAW_MICROS_PER_TICK)
        })
    }
}

/// Busy-wait delays counted on the wiring clock, in raw units
pub struct RawDelay {
    clock: WiringClock,
}

impl RawDelay {
    pub fn new(clock: WiringClock) -> Self {
        Self { clock }
    }
}

impl DelayUs<u32> for RawDelay {
    fn delay_us(&mut self, us: u32) {
        let start = self.clock.raw_micros();
        while self.clock.raw_micros().wrapping_sub(start) < us {}
    }
}

impl DelayMs<u32> for RawDelay {
    fn delay_ms(&mut self, ms: u32) {
        let mut remaining = ms;
        let mut start = self.clock.raw_micros();
        while remaining > 0 {
            while remaining > 0 && self.clock.raw_micros().wrapping_sub(start) >= 1000 {
                remaining -= 1;
                start = start.wrapping_add(1000);
            }
        }
    }
}

const CYCLES_PER_MICRO: u32 = CPU_FREQ_HZ / 1_000_000;

/// Busy-wait counted in CPU cycles, for waits too short for the wiring clock.
///
/// Its atomic sections mask interrupts, so every overflow beyond the first
/// one pending while masked is lost to the wiring clock.
pub struct CycleDelay;

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        avr_device::asm::delay_cycles(us.saturating_mul(CYCLES_PER_MICRO));
    }
}

impl SlotDelay for CycleDelay {
    fn atomic<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        interrupt::free(|_| f(self))
    }
}
