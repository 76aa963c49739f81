// src/font.rs

//! Glyph bitmap lookup backed by the embedded public-domain 8x8 font.
//!
//! Cells are 8x16 pixels; each 8x8 source row is painted twice to double the
//! glyph height. In every row byte the least significant bit is the leftmost
//! pixel.

use font8x8::legacy::{
    BASIC_LEGACY, BLOCK_LEGACY, BOX_LEGACY, GREEK_LEGACY, HIRAGANA_LEGACY, LATIN_LEGACY,
};

/// Width of one character cell in pixels.
pub const CELL_WIDTH: usize = 8;
/// Height of one character cell in pixels.
pub const CELL_HEIGHT: usize = 16;

/// Bitmap drawn for printable characters with no coverage in the font.
pub const FALLBACK_BITMAP: [u8; 8] = BASIC_LEGACY[b'?' as usize];

/// Looks up the 8x8 bitmap for a character. Returns `None` for characters the
/// embedded font does not cover.
pub fn glyph_bitmap(c: char) -> Option<[u8; 8]> {
    let cp = c as u32;
    match cp {
        0x0020..=0x007e => Some(BASIC_LEGACY[cp as usize]),
        0x00a0..=0x00ff => Some(LATIN_LEGACY[(cp - 0x00a0) as usize]),
        0x0390..=0x03c9 => Some(GREEK_LEGACY[(cp - 0x0390) as usize]),
        0x2500..=0x257f => Some(BOX_LEGACY[(cp - 0x2500) as usize]),
        0x2580..=0x259f => Some(BLOCK_LEGACY[(cp - 0x2580) as usize]),
        0x3040..=0x309f => Some(HIRAGANA_LEGACY[(cp - 0x3040) as usize]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_is_covered_and_empty() {
        let bitmap = glyph_bitmap(' ').unwrap();
        assert!(bitmap.iter().all(|&row| row == 0));
    }

    #[test]
    fn ascii_letters_have_pixels() {
        let bitmap = glyph_bitmap('A').unwrap();
        assert!(bitmap.iter().any(|&row| row != 0));
    }

    #[test]
    fn box_drawing_is_covered() {
        assert!(glyph_bitmap('─').is_some());
        assert!(glyph_bitmap('│').is_some());
        assert!(glyph_bitmap('█').is_some());
    }

    #[test]
    fn uncovered_characters_return_none() {
        assert_eq!(glyph_bitmap('\u{1F600}'), None);
    }
}
