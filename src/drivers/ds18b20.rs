//! DS18B20 temperature probe, the only device on the 1-Wire bus
use super::onewire::{check_crc, OneWire, OneWireError, Result, SlotDelay};
use embedded_hal::digital::v2::{InputPin, OutputPin};

const CMD_CONVERT_T: u8 = 0x44;
const CMD_WRITE_SCRATCHPAD: u8 = 0x4E;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;

/// Alarm registers written along with the configuration. The alarm search
/// isn't used, these are the factory values.
const ALARM_HIGH: u8 = 0x4B;
const ALARM_LOW: u8 = 0x46;

/// Raw reading the sensor holds before its first conversion (85 C)
pub const POWER_ON_RAW: i16 = 0x0550;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Resolution {
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            9 => Some(Resolution::Bits9),
            10 => Some(Resolution::Bits10),
            11 => Some(Resolution::Bits11),
            12 => Some(Resolution::Bits12),
            _ => None,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    /// Configuration register value: R1 R0 in bits 6..5, the rest read as 1
    pub const fn config_byte(self) -> u8 {
        ((self.bits() - 9) << 5) | 0x1F
    }

    pub const fn from_config_byte(config: u8) -> Self {
        match (config >> 5) & 0x03 {
            0 => Resolution::Bits9,
            1 => Resolution::Bits10,
            2 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    /// Worst-case conversion time, rounded up
    pub const fn conversion_time_ms(self) -> u16 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }

    /// Mask clearing the low bits that are undefined at this resolution
    const fn mask(self) -> i16 {
        !((1 << (12 - self.bits())) - 1)
    }
}

/// Temperature in sixteenths of a degree Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature(i16);

impl Temperature {
    pub const fn from_raw(raw: i16, resolution: Resolution) -> Self {
        Temperature(raw & resolution.mask())
    }

    pub const fn from_sixteenths(raw: i16) -> Self {
        Temperature(raw)
    }

    pub const fn from_tenths(tenths: i16) -> Self {
        Temperature(((tenths as i32 * 16) / 10) as i16)
    }

    pub const fn sixteenths(self) -> i16 {
        self.0
    }

    /// Tenths of a degree, truncated towards zero
    pub const fn tenths(self) -> i16 {
        ((self.0 as i32 * 10) / 16) as i16
    }

    pub const fn is_power_on_value(self) -> bool {
        self.0 == POWER_ON_RAW
    }
}

/// Decoded scratchpad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scratchpad {
    pub temperature: Temperature,
    pub resolution: Resolution,
}

impl Scratchpad {
    /// Check the CRC and decode the 9 scratchpad bytes.
    ///
    /// A released line with nobody answering reads as all ones and a line
    /// held low reads as all zeros. Zeros carry a valid CRC, so both are
    /// turned away before it is checked.
    pub fn parse<E>(bytes: &[u8; 9]) -> Result<Self, E> {
        if *bytes == [0xFF; 9] {
            return Err(OneWireError::NoPresence);
        }
        if *bytes == [0x00; 9] {
            return Err(OneWireError::BusShorted);
        }
        check_crc(&bytes[..8], bytes[8])?;
        let resolution = Resolution::from_config_byte(bytes[4]);
        let raw = i16::from_le_bytes([bytes[0], bytes[1]]);
        Ok(Scratchpad { temperature: Temperature::from_raw(raw, resolution), resolution })
    }
}

pub struct Ds18b20 {
    resolution: Resolution,
}

impl Ds18b20 {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Write the resolution into the configuration register
    pub fn configure<P, E, D>(&self, bus: &mut OneWire<P>, delay: &mut D) -> Result<(), E>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
        D: SlotDelay,
    {
        bus.skip_rom(delay)?;
        bus.write_bytes(
            delay,
            &[CMD_WRITE_SCRATCHPAD, ALARM_HIGH, ALARM_LOW, self.resolution.config_byte()],
        )
    }

    /// Kick off a conversion. The result is ready after
    /// `conversion_time_ms`.
    pub fn start_conversion<P, E, D>(&self, bus: &mut OneWire<P>, delay: &mut D) -> Result<(), E>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
        D: SlotDelay,
    {
        bus.skip_rom(delay)?;
        bus.write_byte(delay, CMD_CONVERT_T)
    }

    pub fn read_scratchpad<P, E, D>(&self, bus: &mut OneWire<P>, delay: &mut D) -> Result<Scratchpad, E>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
        D: SlotDelay,
    {
        bus.skip_rom(delay)?;
        bus.write_byte(delay, CMD_READ_SCRATCHPAD)?;
        let mut bytes = [0u8; 9];
        bus.read_bytes(delay, &mut bytes)?;
        Scratchpad::parse(&bytes)
    }

    pub fn read_temperature<P, E, D>(&self, bus: &mut OneWire<P>, delay: &mut D) -> Result<Temperature, E>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
        D: SlotDelay,
    {
        Ok(self.read_scratchpad(bus, delay)?.temperature)
    }
}
