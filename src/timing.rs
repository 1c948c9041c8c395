//! Time-scale compensated delays and clock.
//!
//! Timer0 feeds the wiring clock (the millisecond counter and the busy-wait
//! delays) and also generates PWM on D5/D6. Running it faster than the
//! default /64 prescaler lifts that PWM out of the audible range but makes
//! every raw time reading run fast by the same ratio. [`TimeScale`] carries
//! that ratio so [`ScaledDelay`] and [`ScaledClock`] can hand out real time.

use core::num::NonZeroU8;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

pub type Result<T> = core::result::Result<T, TimingError>;

/// Prescaler the wiring clock arithmetic assumes
pub const DEFAULT_PRESCALER: u16 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    /// Factor of zero
    ZeroScale,
    /// Prescalers slower than the default can't be compensated with an
    /// integer factor
    UnsupportedPrescaler(Prescaler),
}

/// Timer0 clock select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Prescaler {
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

impl Prescaler {
    pub const fn divisor(self) -> u16 {
        match self {
            Prescaler::Direct => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// CS0[2:0] bits for TCCR0B
    #[inline]
    pub const fn clock_select(self) -> u8 {
        self as u8
    }
}

/// How many raw wiring-clock units pass per real unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScale(NonZeroU8);

impl TimeScale {
    /// Stock Timer0 setup, raw time is real time
    pub const UNITY: TimeScale = match NonZeroU8::new(1) {
        Some(n) => TimeScale(n),
        None => unreachable!(),
    };

    pub const fn new(factor: u8) -> Result<Self> {
        match NonZeroU8::new(factor) {
            Some(n) => Ok(TimeScale(n)),
            None => Err(TimingError::ZeroScale),
        }
    }

    /// Scale for Timer0 running at `prescaler` instead of /64
    pub const fn from_prescaler(prescaler: Prescaler) -> Result<Self> {
        let divisor = prescaler.divisor();
        if divisor > DEFAULT_PRESCALER {
            return Err(TimingError::UnsupportedPrescaler(prescaler));
        }
        Self::new((DEFAULT_PRESCALER / divisor) as u8)
    }

    #[inline]
    pub const fn factor(self) -> u8 {
        self.0.get()
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Raw, uncompensated wiring clock
pub trait Clock {
    /// Milliseconds as counted assuming the default prescaler. Wraps.
    fn raw_millis(&self) -> u32;
    /// Microseconds as counted assuming the default prescaler. Wraps.
    fn raw_micros(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn raw_millis(&self) -> u32 {
        (**self).raw_millis()
    }

    fn raw_micros(&self) -> u32 {
        (**self).raw_micros()
    }
}

/// A raw millisecond reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instant(u32);

impl Instant {
    pub const fn from_raw(raw_millis: u32) -> Self {
        Instant(raw_millis)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Wiring clock corrected for the time scale
pub struct ScaledClock<C> {
    clock: C,
    scale: TimeScale,
}

impl<C: Clock> ScaledClock<C> {
    pub fn new(clock: C, scale: TimeScale) -> Self {
        Self { clock, scale }
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Real milliseconds since start. Wraps after `u32::MAX / scale`.
    pub fn millis(&self) -> u32 {
        self.clock.raw_millis() / self.scale.factor() as u32
    }

    pub fn micros(&self) -> u32 {
        self.clock.raw_micros() / self.scale.factor() as u32
    }

    pub fn now(&self) -> Instant {
        Instant(self.clock.raw_millis())
    }

    /// Real milliseconds since `since`, correct across a raw counter wrap
    pub fn elapsed_ms(&self, since: Instant) -> u32 {
        self.clock.raw_millis().wrapping_sub(since.0) / self.scale.factor() as u32
    }

    pub fn inner(&self) -> &C {
        &self.clock
    }
}

/// Busy-wait delay corrected for the time scale.
///
/// A request whose scaled length doesn't fit in `u32` is issued as `scale`
/// back-to-back raw delays of the requested length instead.
pub struct ScaledDelay<D> {
    delay: D,
    scale: TimeScale,
}

impl<D> ScaledDelay<D>
where
    D: DelayMs<u32> + DelayUs<u32>,
{
    pub fn new(delay: D, scale: TimeScale) -> Self {
        Self { delay, scale }
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    pub fn release(self) -> D {
        self.delay
    }

    fn scaled(&mut self, amount: u32, raw: fn(&mut D, u32)) {
        let factor = self.scale.factor() as u32;
        match amount.checked_mul(factor) {
            Some(total) => raw(&mut self.delay, total),
            None => {
                for _ in 0..factor {
                    raw(&mut self.delay, amount);
                }
            }
        }
    }
}

impl<D> DelayMs<u32> for ScaledDelay<D>
where
    D: DelayMs<u32> + DelayUs<u32>,
{
    fn delay_ms(&mut self, ms: u32) {
        self.scaled(ms, |d, n| DelayMs::delay_ms(d, n));
    }
}

impl<D> DelayUs<u32> for ScaledDelay<D>
where
    D: DelayMs<u32> + DelayUs<u32>,
{
    fn delay_us(&mut self, us: u32) {
        self.scaled(us, |d, n| DelayUs::delay_us(d, n));
    }
}

macro_rules! forward_delay {
    ($($t:ty),*) => {
        $(
            impl<D> DelayMs<$t> for ScaledDelay<D>
            where
                D: DelayMs<u32> + DelayUs<u32>,
            {
                #[inline]
                fn delay_ms(&mut self, ms: $t) {
                    DelayMs::<u32>::delay_ms(self, ms as u32);
                }
            }

            impl<D> DelayUs<$t> for ScaledDelay<D>
            where
                D: DelayMs<u32> + DelayUs<u32>,
            {
                #[inline]
                fn delay_us(&mut self, us: $t) {
                    DelayUs::<u32>::delay_us(self, us as u32);
                }
            }
        )*
    };
}

forward_delay!(u8, u16);
