// src/term/mod.rs

//! The terminal screen model and its escape-sequence interpreter.
//!
//! One `Term` owns everything the recording stream mutates: the glyph grid,
//! the cursor, pending attributes, tab stops, the scroll region, character
//! sets, DEC private modes, and the parser state. All of it persists across
//! `process_bytes` calls, so escape sequences and multi-byte characters split
//! across records resume where they left off.

mod parser;
mod screen;
mod unicode;


use crate::glyph::{Attributes, Glyph};
use parser::Parser;

/// Cursor position in cells, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

/// Character set selectable into G0/G1 via designation sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterSet {
    #[default]
    Ascii,
    /// DEC special graphics: remaps `` ` ``..`~` to line-drawing characters.
    DecSpecialGraphics,
}

/// DEC private modes with a pixel-visible effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DecModes {
    origin_mode: bool,
    autowrap: bool,
    cursor_visible: bool,
}

impl Default for DecModes {
    fn default() -> Self {
        DecModes {
            origin_mode: false,
            autowrap: true,
            cursor_visible: true,
        }
    }
}

#[derive(Debug)]
pub struct Term {
    cols: usize,
    rows: usize,
    grid: Vec<Vec<Glyph>>,
    cursor: Cursor,
    saved_cursor: Cursor,
    saved_attributes: Attributes,
    current_attributes: Attributes,
    scroll_top: usize,
    scroll_bot: usize, // inclusive
    tabs: Vec<bool>,
    tab_interval: u8,
    charsets: [CharacterSet; 2],
    active_charset: usize,
    modes: DecModes,
    /// Pending wrap: the cursor sits on the last column and the next
    /// printable moves to the start of the following line first.
    wrap_next: bool,
    parser: Parser,
    dirty: bool,
}

impl Term {
    pub fn new(cols: usize, rows: usize, tab_interval: u8) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Term {
            cols,
            rows,
            grid: vec![vec![Glyph::default(); cols]; rows],
            cursor: Cursor::default(),
            saved_cursor: Cursor::default(),
            saved_attributes: Attributes::default(),
            current_attributes: Attributes::default(),
            scroll_top: 0,
            scroll_bot: rows - 1,
            tabs: seed_tabs(cols, tab_interval),
            tab_interval,
            charsets: [CharacterSet::default(); 2],
            active_charset: 0,
            modes: DecModes::default(),
            wrap_next: false,
            parser: Parser::default(),
            dirty: false,
        }
    }

    /// Interprets a chunk of terminal output. Returns true iff the chunk
    /// changed what a viewer would see: a cell's rendered appearance, the
    /// position of a visible cursor, or the cursor's visibility itself.
    /// Cursor motion is judged on the net effect of the whole chunk; a
    /// captured frame only shows where the cursor ended up.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> bool {
        self.dirty = false;
        let cursor_before = self.cursor;
        let visible_before = self.modes.cursor_visible;
        for &byte in bytes {
            parser::process_byte(self, byte);
        }
        if self.modes.cursor_visible != visible_before
            || (self.modes.cursor_visible && self.cursor != cursor_before)
        {
            self.dirty = true;
        }
        self.dirty
    }

    /// True while the parser sits inside a device control string. Frames are
    /// not worth capturing mid-DCS; the payload is still being consumed.
    pub fn in_string_sequence(&self) -> bool {
        self.parser.in_dcs()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The glyph at cell `(x, y)`. Out-of-range coordinates read as blank.
    pub fn glyph(&self, x: usize, y: usize) -> Glyph {
        self.grid
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cursor_visible(&self) -> bool {
        self.modes.cursor_visible
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

fn seed_tabs(cols: usize, interval: u8) -> Vec<bool> {
    let mut tabs = vec![false; cols];
    if interval > 0 {
        let step = interval as usize;
        for (x, stop) in tabs.iter_mut().enumerate() {
            *stop = x > 0 && x % step == 0;
        }
    }
    tabs
}
