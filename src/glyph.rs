// src/glyph.rs

//! Defines the `Glyph` struct representing a single character cell, along with
//! its visual attributes.

use crate::color::Color;
use bitflags::bitflags;

/// Marks the trailing cell of a double-width character. The renderer paints
/// such cells as background only; the leading cell carries the character.
pub const WIDE_CHAR_PLACEHOLDER: char = '\0';

bitflags! {
    /// Text attribute flags (bold, underline, reverse video, etc.).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u16 {
        const BOLD          = 1 << 0;
        const FAINT         = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const REVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Visual attributes of a cell: foreground, background, and style flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attributes {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

/// A single character cell on the screen grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// The character displayed in this cell.
    pub c: char,
    /// The visual attributes of this cell.
    pub attr: Attributes,
}

impl Glyph {
    /// A blank cell carrying the given attributes. Used for erase and scroll
    /// fill so background color extends into cleared regions.
    pub fn blank(attr: Attributes) -> Self {
        Glyph { c: ' ', attr }
    }
}

impl Default for Glyph {
    fn default() -> Self {
        Glyph::blank(Attributes::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_glyph_is_a_plain_space() {
        let g = Glyph::default();
        assert_eq!(g.c, ' ');
        assert_eq!(g.attr.fg, Color::Default);
        assert_eq!(g.attr.bg, Color::Default);
        assert!(g.attr.flags.is_empty());
    }

    #[test]
    fn blank_keeps_attributes() {
        let attr = Attributes {
            fg: Color::Indexed(3),
            bg: Color::Indexed(4),
            flags: AttrFlags::REVERSE,
        };
        let g = Glyph::blank(attr);
        assert_eq!(g.c, ' ');
        assert_eq!(g.attr, attr);
    }
}
