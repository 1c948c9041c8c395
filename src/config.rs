//! Configuration constants for the Aqua328 firmware
use crate::board::{HardwareRevision, PinMap};
use crate::drivers::console::Level;
use crate::drivers::lights::Colour;
use crate::timing::{Prescaler, TimeScale};

/// CPU frequency in Hz, exported by the build script
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

const fn parse_hz(text: &str) -> u32 {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        panic!("MCU_FREQ_HZ is empty");
    }
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        if !digit.is_ascii_digit() {
            panic!("MCU_FREQ_HZ must be decimal Hz");
        }
        value = value * 10 + (digit - b'0') as u32;
        i += 1;
    }
    value
}

/// UART baud rate
pub const UART_BAUD: u32 = 57_600;

/// Log level for the serial console
pub const LOG_LEVEL: Level = Level::Info;

/// Board revision this firmware is built for
pub const REVISION: HardwareRevision = HardwareRevision::selected();

pub const PINS: &PinMap = PinMap::selected();

/// Timer0 runs undivided so the D5/D6 light PWM sits at 62.5 kHz
pub const TIMER0_PRESCALER: Prescaler = Prescaler::Direct;

/// Correction applied to every wiring-clock reading and delay
pub const TIME_SCALE: TimeScale = match TimeScale::from_prescaler(TIMER0_PRESCALER) {
    Ok(scale) => scale,
    Err(_) => panic!("Timer0 prescaler can't be compensated"),
};

/// I2C address of the PCF8574 LCD backpack
pub const LCD_ADDRESS: u8 = 0x27;

/// Consecutive equal samples before a switch change counts
pub const DEBOUNCE_SAMPLES: u8 = 5;

/// Switch sampling interval in milliseconds
pub const SWITCH_POLL_MS: u32 = 10;

/// Display refresh interval in milliseconds
pub const DISPLAY_UPDATE_MS: u32 = 250;

/// Light fade step interval in milliseconds
pub const FADE_STEP_MS: u32 = 20;

/// Time between temperature conversions in milliseconds
pub const TEMPERATURE_PERIOD_MS: u32 = 2_000;

/// Minimum time between over/under temperature alarms
pub const ALARM_INTERVAL_MS: u32 = 60_000;

/// Runtime tunables. Temperatures are in tenths of a degree Celsius and
/// times of day in minutes after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Wall clock reading at power-up
    pub start_minute: u16,
    pub lights_on_minute: u16,
    pub lights_off_minute: u16,
    pub day_colour: Colour,
    pub moon_colour: Colour,
    /// Largest per-channel change per fade step
    pub fade_step: u8,
    /// Temperatures at which the fan steps up to Low, Medium and High
    pub fan_thresholds: [i16; 3],
    pub fan_hysteresis: i16,
    pub alarm_low: i16,
    pub alarm_high: i16,
    pub backlight_level: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_minute: 12 * 60,
            lights_on_minute: 8 * 60,
            lights_off_minute: 21 * 60 + 30,
            day_colour: Colour::new(255, 240, 200),
            moon_colour: Colour::new(0, 0, 24),
            fade_step: 1,
            fan_thresholds: [260, 270, 280],
            fan_hysteresis: 5,
            alarm_low: 220,
            alarm_high: 300,
            backlight_level: 160,
        }
    }
}
