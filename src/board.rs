//! Physical pin and other hardware attribute settings.
//!
//! Pins use Arduino numbering: D0-D13 are the digital header pins and
//! A0-A5 are pins 14-19. D0/D1 carry the serial console and A4/A5 the I2C
//! bus to the display, so neither pair may be assigned to a role.

/// Result type for pin map checks
pub type Result<T> = core::result::Result<T, PinError>;

/// Highest Arduino pin number on the ATmega328P (A5)
pub const MAX_PIN: u8 = 19;

/// Pins wired to a hardware PWM output compare unit
pub const PWM_PINS: [u8; 6] = [3, 5, 6, 9, 10, 11];

/// D0/D1 serial, A4/A5 I2C SDA/SCL
pub const RESERVED_PINS: [u8; 4] = [0, 1, 18, 19];

/// 1-Wire bus pin. The breadboard build (Trinket + FTDI) uses D4.
pub const ONE_WIRE_BUS: u8 = if cfg!(feature = "breadboard") { 4 } else { 2 };

/// Whether the fan is fitted. Build without the `fan` feature to disable it.
pub const FAN_ENABLED: bool = cfg!(feature = "fan");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareRevision {
    /// First board: no backlight control, 9 bit temperature readings
    Original,
    /// Aqua328 board with PWM backlight and 10 bit temperature readings
    Aqua328,
}

impl HardwareRevision {
    /// Revision chosen by the `aqua328` cargo feature
    pub const fn selected() -> Self {
        if cfg!(feature = "aqua328") {
            HardwareRevision::Aqua328
        } else {
            HardwareRevision::Original
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    Speaker,
    OneWireBus,
    LidSwitch,
    UserSwitch,
    Red,
    Green,
    Blue,
    Fan,
    Backlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Whether a pin reading `level_high` means the role is active
    #[inline]
    pub const fn is_active(self, level_high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => level_high,
            Polarity::ActiveLow => !level_high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    DigitalIn,
    DigitalOut,
    Pwm,
    OneWire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    pub role: Role,
    pub pin: u8,
    pub kind: PinKind,
    pub polarity: Polarity,
}

const fn assign(role: Role, pin: u8, kind: PinKind, polarity: Polarity) -> PinAssignment {
    PinAssignment { role, pin, kind, polarity }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    DuplicatePin { pin: u8, first: Role, second: Role },
    DuplicateRole(Role),
    OutOfRange { role: Role, pin: u8 },
    Reserved { role: Role, pin: u8 },
    NotPwmCapable { role: Role, pin: u8 },
    InvalidPrecision(u8),
}

/// A complete pin-to-function table for one board revision
#[derive(Debug)]
pub struct PinMap {
    pub revision: HardwareRevision,
    /// DS18B20 resolution in bits
    pub temperature_precision: u8,
    pub fan_enabled: bool,
    pub assignments: &'static [PinAssignment],
}

const ORIGINAL_PINS: [PinAssignment; 8] = [
    assign(Role::Speaker, 10, PinKind::DigitalOut, Polarity::ActiveHigh),
    assign(Role::OneWireBus, ONE_WIRE_BUS, PinKind::OneWire, Polarity::ActiveLow),
    assign(Role::LidSwitch, 7, PinKind::DigitalIn, Polarity::ActiveLow),
    assign(Role::UserSwitch, 8, PinKind::DigitalIn, Polarity::ActiveLow),
    assign(Role::Red, 5, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Green, 6, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Blue, 3, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Fan, 9, PinKind::Pwm, Polarity::ActiveHigh),
];

const AQUA328_PINS: [PinAssignment; 9] = [
    assign(Role::Speaker, 10, PinKind::DigitalOut, Polarity::ActiveHigh),
    assign(Role::OneWireBus, ONE_WIRE_BUS, PinKind::OneWire, Polarity::ActiveLow),
    assign(Role::LidSwitch, 7, PinKind::DigitalIn, Polarity::ActiveLow),
    assign(Role::UserSwitch, 8, PinKind::DigitalIn, Polarity::ActiveLow),
    assign(Role::Red, 5, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Green, 6, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Blue, 3, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Fan, 9, PinKind::Pwm, Polarity::ActiveHigh),
    assign(Role::Backlight, 11, PinKind::Pwm, Polarity::ActiveHigh),
];

pub const ORIGINAL: PinMap = PinMap {
    revision: HardwareRevision::Original,
    temperature_precision: 9,
    fan_enabled: FAN_ENABLED,
    assignments: &ORIGINAL_PINS,
};

pub const AQUA328: PinMap = PinMap {
    revision: HardwareRevision::Aqua328,
    temperature_precision: 10,
    fan_enabled: FAN_ENABLED,
    assignments: &AQUA328_PINS,
};

// Both tables are checked when the firmware is compiled
const _: () = assert!(pin_table_ok(&ORIGINAL_PINS, 9));
const _: () = assert!(pin_table_ok(&AQUA328_PINS, 10));

const fn pin_table_ok(assignments: &'static [PinAssignment], precision: u8) -> bool {
    let map = PinMap {
        revision: HardwareRevision::Original,
        temperature_precision: precision,
        fan_enabled: true,
        assignments,
    };
    map.validate().is_ok()
}

impl PinMap {
    pub const fn for_revision(revision: HardwareRevision) -> &'static PinMap {
        match revision {
            HardwareRevision::Original => &ORIGINAL,
            HardwareRevision::Aqua328 => &AQUA328,
        }
    }

    /// Pin map of the board this firmware is built for
    pub const fn selected() -> &'static PinMap {
        Self::for_revision(HardwareRevision::selected())
    }

    pub const fn assignment(&self, role: Role) -> Option<&PinAssignment> {
        if matches!(role, Role::Fan) && !self.fan_enabled {
            return None;
        }
        let mut i = 0;
        while i < self.assignments.len() {
            if self.assignments[i].role as u8 == role as u8 {
                return Some(&self.assignments[i]);
            }
            i += 1;
        }
        None
    }

    pub const fn pin(&self, role: Role) -> Option<u8> {
        match self.assignment(role) {
            Some(a) => Some(a.pin),
            None => None,
        }
    }

    /// Check every pin is used once, every role appears once and that
    /// PWM roles sit on PWM capable pins.
    pub const fn validate(&self) -> Result<()> {
        if self.temperature_precision < 9 || self.temperature_precision > 12 {
            return Err(PinError::InvalidPrecision(self.temperature_precision));
        }

        let pins = self.assignments;
        let mut i = 0;
        while i < pins.len() {
            let a = pins[i];
            if a.pin > MAX_PIN {
                return Err(PinError::OutOfRange { role: a.role, pin: a.pin });
            }
            if is_reserved(a.pin) {
                return Err(PinError::Reserved { role: a.role, pin: a.pin });
            }
            if matches!(a.kind, PinKind::Pwm) && !is_pwm_capable(a.pin) {
                return Err(PinError::NotPwmCapable { role: a.role, pin: a.pin });
            }

            let mut j = i + 1;
            while j < pins.len() {
                let b = pins[j];
                if b.pin == a.pin {
                    return Err(PinError::DuplicatePin { pin: a.pin, first: a.role, second: b.role });
                }
                if b.role as u8 == a.role as u8 {
                    return Err(PinError::DuplicateRole(a.role));
                }
                j += 1;
            }
            i += 1;
        }
        Ok(())
    }
}

pub const fn is_pwm_capable(pin: u8) -> bool {
    contains(&PWM_PINS, pin)
}

pub const fn is_reserved(pin: u8) -> bool {
    contains(&RESERVED_PINS, pin)
}

const fn contains(list: &[u8], pin: u8) -> bool {
    let mut i = 0;
    while i < list.len() {
        if list[i] == pin {
            return true;
        }
        i += 1;
    }
    false
}

/// ATmega328P I/O ports behind the Arduino pin numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    B,
    C,
    D,
}

/// Port and bit for an Arduino pin number
pub const fn port_bit(pin: u8) -> Option<(Port, u8)> {
    match pin {
        0..=7 => Some((Port::D, pin)),
        8..=13 => Some((Port::B, pin - 8)),
        14..=19 => Some((Port::C, pin - 14)),
        _ => None,
    }
}

/// Output compare unit driving a PWM pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    Timer0A,
    Timer0B,
    Timer1A,
    Timer1B,
    Timer2A,
    Timer2B,
}

pub const fn pwm_channel(pin: u8) -> Option<PwmChannel> {
    match pin {
        6 => Some(PwmChannel::Timer0A),
        5 => Some(PwmChannel::Timer0B),
        9 => Some(PwmChannel::Timer1A),
        10 => Some(PwmChannel::Timer1B),
        11 => Some(PwmChannel::Timer2A),
        3 => Some(PwmChannel::Timer2B),
        _ => None,
    }
}
