//! Custom glyphs for the 1602 display.
//!
//! The HD44780 has eight CGRAM slots of 5x8 pixels. Character codes 0-7
//! print whatever was last written to the matching slot, so a glyph's slot
//! number doubles as its character code.

use crate::board::HardwareRevision;

pub type Result<T> = core::result::Result<T, GlyphError>;

/// Rows per character cell
pub const GLYPH_ROWS: usize = 8;

/// Pixels per row
pub const GLYPH_WIDTH: u8 = 5;

const ROW_MASK: u8 = !((1 << GLYPH_WIDTH) - 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphError {
    /// A row uses bits above the 5 pixel columns
    RowOverflow { glyph: GlyphId, row: usize, bits: u8 },
}

/// One 5x8 character bitmap, top row first, bit 4 is the leftmost pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph(pub [u8; GLYPH_ROWS]);

impl Glyph {
    pub const fn rows(&self) -> &[u8; GLYPH_ROWS] {
        &self.0
    }

    pub const fn is_valid(&self) -> bool {
        self.first_bad_row().is_none()
    }

    const fn first_bad_row(&self) -> Option<usize> {
        let mut row = 0;
        while row < GLYPH_ROWS {
            if self.0[row] & ROW_MASK != 0 {
                return Some(row);
            }
            row += 1;
        }
        None
    }

    /// Pixel at column `x` (0 = left) and row `y` (0 = top)
    pub fn pixel(&self, x: u8, y: usize) -> bool {
        if x >= GLYPH_WIDTH || y >= GLYPH_ROWS {
            return false;
        }
        self.0[y] & (1 << (GLYPH_WIDTH - 1 - x)) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GlyphId {
    On = 0,
    Off = 1,
    Degrees = 2,
    Fan = 3,
    Fan1 = 4,
    Fan2 = 5,
    Fan3 = 6,
}

impl GlyphId {
    pub const ALL: [GlyphId; 7] = [
        GlyphId::On,
        GlyphId::Off,
        GlyphId::Degrees,
        GlyphId::Fan,
        GlyphId::Fan1,
        GlyphId::Fan2,
        GlyphId::Fan3,
    ];

    /// CGRAM slot the glyph is loaded into
    #[inline]
    pub const fn slot(self) -> u8 {
        self as u8
    }

    /// Character code that prints the glyph once loaded
    #[inline]
    pub const fn char_code(self) -> u8 {
        self.slot()
    }
}

pub const ON: Glyph = Glyph([
    0b00100,
    0b01110,
    0b11111,
    0b10101,
    0b00100,
    0b00100,
    0b00100,
    0b00100,
]);

pub const OFF: Glyph = Glyph([
    0b00100,
    0b00100,
    0b00100,
    0b00100,
    0b10101,
    0b11111,
    0b01110,
    0b00100,
]);

/// Small 3x3 degree ring used on the Aqua328 board
pub const DEGREES_SMALL: Glyph = Glyph([
    0b01000,
    0b10100,
    0b01000,
    0b00000,
    0b00000,
    0b00000,
    0b00000,
    0b00000,
]);

/// 4x4 degree ring used on the original board
pub const DEGREES_LARGE: Glyph = Glyph([
    0b00110,
    0b01001,
    0b01001,
    0b00110,
    0b00000,
    0b00000,
    0b00000,
    0b00000,
]);

pub const FAN: Glyph = Glyph([
    0b10101,
    0b01110,
    0b11011,
    0b01110,
    0b10101,
    0b00000,
    0b00000,
    0b00000,
]);

pub const FAN1: Glyph = Glyph([
    0b00000,
    0b00000,
    0b00100,
    0b01100,
    0b11100,
    0b00000,
    0b00000,
    0b00000,
]);

pub const FAN2: Glyph = Glyph([
    0b00000,
    0b00010,
    0b00110,
    0b01110,
    0b11110,
    0b00000,
    0b00000,
    0b00000,
]);

pub const FAN3: Glyph = Glyph([
    0b00001,
    0b00011,
    0b00111,
    0b01111,
    0b11111,
    0b00000,
    0b00000,
    0b00000,
]);

/// The glyphs one board revision loads at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphSet {
    glyphs: [Glyph; 7],
}

pub const ORIGINAL_GLYPHS: GlyphSet = GlyphSet {
    glyphs: [ON, OFF, DEGREES_LARGE, FAN, FAN1, FAN2, FAN3],
};

pub const AQUA328_GLYPHS: GlyphSet = GlyphSet {
    glyphs: [ON, OFF, DEGREES_SMALL, FAN, FAN1, FAN2, FAN3],
};

const _: () = assert!(ORIGINAL_GLYPHS.validate().is_ok());
const _: () = assert!(AQUA328_GLYPHS.validate().is_ok());

impl GlyphSet {
    pub const fn for_revision(revision: HardwareRevision) -> &'static GlyphSet {
        match revision {
            HardwareRevision::Original => &ORIGINAL_GLYPHS,
            HardwareRevision::Aqua328 => &AQUA328_GLYPHS,
        }
    }

    #[inline]
    pub const fn get(&self, id: GlyphId) -> &Glyph {
        &self.glyphs[id as usize]
    }

    /// Glyphs in CGRAM slot order
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId, &Glyph)> + '_ {
        GlyphId::ALL.iter().map(move |&id| (id, self.get(id)))
    }

    pub const fn validate(&self) -> Result<()> {
        let mut i = 0;
        while i < GlyphId::ALL.len() {
            let id = GlyphId::ALL[i];
            let glyph = self.get(id);
            if let Some(row) = glyph.first_bad_row() {
                return Err(GlyphError::RowOverflow { glyph: id, row, bits: glyph.0[row] });
            }
            i += 1;
        }
        Ok(())
    }
}

/// Bar glyph for a fan speed level; level 0 has none
pub const fn fan_level_glyph(level: u8) -> Option<GlyphId> {
    match level {
        0 => None,
        1 => Some(GlyphId::Fan1),
        2 => Some(GlyphId::Fan2),
        _ => Some(GlyphId::Fan3),
    }
}
