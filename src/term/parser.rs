// src/term/parser.rs

//! The byte-driven escape-sequence state machine.
//!
//! Bytes arrive one at a time and may stop mid-sequence at a record boundary;
//! everything needed to resume lives in `Parser`. Malformed or unrecognized
//! sequences are consumed without touching the grid.

use super::unicode::{self, Utf8DecodeResult, Utf8Decoder};
use super::{screen, CharacterSet, Term};
use crate::color::Color;
use crate::glyph::{AttrFlags, Attributes};
use log::{trace, warn};

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;
/// 8-bit string terminator (ST).
const ST: u8 = 0x9c;

/// Caps collected parameter/intermediate/string bytes; a stream that never
/// terminates a sequence cannot grow the buffer without bound.
const MAX_SEQUENCE_LEN: usize = 512;
const MAX_CSI_PARAMS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    EscIntermediate,
    Csi,
    Osc,
    Dcs,
}

#[derive(Debug, Default)]
pub(super) struct Parser {
    state: ParserState,
    buffer: Vec<u8>,
    /// An ESC was seen inside an OSC/DCS body; the next byte decides between
    /// a string terminator and a fresh escape sequence.
    string_esc: bool,
    utf8: Utf8Decoder,
}

impl Parser {
    pub(super) fn in_dcs(&self) -> bool {
        self.state == ParserState::Dcs
    }

    pub(super) fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.buffer.clear();
        self.string_esc = false;
        self.utf8.reset();
    }
}

pub(super) fn process_byte(term: &mut Term, byte: u8) {
    match term.parser.state {
        ParserState::Ground => ground(term, byte),
        ParserState::Escape => escape(term, byte),
        ParserState::EscIntermediate => esc_intermediate(term, byte),
        ParserState::Csi => csi(term, byte),
        ParserState::Osc | ParserState::Dcs => string_body(term, byte),
    }
}

fn ground(term: &mut Term, byte: u8) {
    if term.parser.utf8.in_progress() && byte < 0x80 {
        warn!("byte 0x{byte:02x} interrupted a multi-byte character");
        term.parser.utf8.reset();
        print_char(term, char::REPLACEMENT_CHARACTER);
    }
    match byte {
        ESC => {
            term.parser.state = ParserState::Escape;
            term.parser.buffer.clear();
        }
        BEL => {}
        0x08 => screen::backspace(term),
        0x09 => screen::tab_forward(term, 1),
        // LF, VT, and FF all index.
        0x0a | 0x0b | 0x0c => screen::index(term),
        0x0d => screen::carriage_return(term),
        0x0e => term.active_charset = 1, // SO
        0x0f => term.active_charset = 0, // SI
        0x00..=0x1f | 0x7f => {}
        _ => match term.parser.utf8.decode(byte) {
            Utf8DecodeResult::Decoded(c) => print_char(term, c),
            Utf8DecodeResult::NeedsMoreBytes => {}
            Utf8DecodeResult::InvalidSequence => {
                print_char(term, char::REPLACEMENT_CHARACTER);
            }
        },
    }
}

fn print_char(term: &mut Term, c: char) {
    let c = unicode::map_charset(c, term.charsets[term.active_charset]);
    screen::put_char(term, c);
}

fn escape(term: &mut Term, byte: u8) {
    term.parser.state = ParserState::Ground;
    match byte {
        b'[' => {
            term.parser.state = ParserState::Csi;
            term.parser.buffer.clear();
        }
        b']' => {
            term.parser.state = ParserState::Osc;
            term.parser.buffer.clear();
            term.parser.string_esc = false;
        }
        b'P' => {
            term.parser.state = ParserState::Dcs;
            term.parser.buffer.clear();
            term.parser.string_esc = false;
        }
        // APC, PM, SOS: string sequences with no visible effect.
        b'_' | b'^' | b'X' => {
            term.parser.state = ParserState::Osc;
            term.parser.buffer.clear();
            term.parser.string_esc = false;
        }
        // Any intermediate byte opens an ESC-intermediate sequence; the
        // final byte is consumed there even when the pair is unsupported.
        0x20..=0x2f => {
            term.parser.buffer.clear();
            term.parser.buffer.push(byte);
            term.parser.state = ParserState::EscIntermediate;
        }
        b'7' => screen::save_cursor(term),
        b'8' => screen::restore_cursor(term),
        b'D' => screen::index(term),
        b'E' => {
            // NEL
            screen::index(term);
            screen::carriage_return(term);
        }
        b'H' => screen::set_tab_stop(term),
        b'M' => screen::reverse_index(term),
        b'c' => {
            screen::reset(term);
            term.parser.reset();
        }
        b'=' | b'>' => {} // DECKPAM / DECKPNM
        b'\\' => {}       // stray ST
        _ => trace!("ignoring unsupported escape final 0x{byte:02x}"),
    }
}

fn esc_intermediate(term: &mut Term, byte: u8) {
    match byte {
        0x20..=0x2f => {
            if term.parser.buffer.len() < MAX_SEQUENCE_LEN {
                term.parser.buffer.push(byte);
            }
        }
        0x30..=0x7e => {
            let introducer = term.parser.buffer.first().copied();
            if let Some(slot) = match introducer {
                Some(b'(') => Some(0),
                Some(b')') => Some(1),
                _ => None,
            } {
                term.charsets[slot] = match byte {
                    b'0' => CharacterSet::DecSpecialGraphics,
                    _ => CharacterSet::Ascii,
                };
            }
            term.parser.state = ParserState::Ground;
            term.parser.buffer.clear();
        }
        ESC => {
            term.parser.state = ParserState::Escape;
            term.parser.buffer.clear();
        }
        _ => {
            term.parser.state = ParserState::Ground;
            term.parser.buffer.clear();
        }
    }
}

fn csi(term: &mut Term, byte: u8) {
    match byte {
        0x40..=0x7e => {
            let sequence = parse_csi_sequence(&term.parser.buffer, byte);
            term.parser.state = ParserState::Ground;
            term.parser.buffer.clear();
            handle_csi_sequence(term, sequence);
        }
        0x20..=0x3f => {
            if term.parser.buffer.len() < MAX_SEQUENCE_LEN {
                term.parser.buffer.push(byte);
            }
        }
        ESC => {
            term.parser.state = ParserState::Escape;
            term.parser.buffer.clear();
        }
        _ => {
            warn!("aborting CSI sequence on byte 0x{byte:02x}");
            term.parser.state = ParserState::Ground;
            term.parser.buffer.clear();
        }
    }
}

fn string_body(term: &mut Term, byte: u8) {
    if term.parser.string_esc {
        term.parser.string_esc = false;
        if byte == b'\\' {
            finish_string(term);
        } else {
            // The ESC opened a new sequence instead of terminating this one.
            term.parser.buffer.clear();
            term.parser.state = ParserState::Escape;
            escape(term, byte);
        }
        return;
    }
    match byte {
        BEL if term.parser.state == ParserState::Osc => finish_string(term),
        ST => finish_string(term),
        ESC => term.parser.string_esc = true,
        _ => {
            if term.parser.buffer.len() < MAX_SEQUENCE_LEN {
                term.parser.buffer.push(byte);
            }
        }
    }
}

fn finish_string(term: &mut Term) {
    // Titles, clipboard payloads, and device control bodies change no cell;
    // collection only keeps the parser synchronized.
    trace!(
        "discarding {}-byte string sequence body",
        term.parser.buffer.len()
    );
    term.parser.buffer.clear();
    term.parser.string_esc = false;
    term.parser.state = ParserState::Ground;
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum EraseDirection {
    ToEnd,
    ToStart,
    All,
    Unsupported(usize),
}

#[derive(Debug, PartialEq, Eq)]
enum CsiSequence {
    InsertBlankChars(usize),
    CursorUp(usize),
    CursorDown(usize),
    CursorForward(usize),
    CursorBackward(usize),
    CursorNextLine(usize),
    CursorPrevLine(usize),
    CursorColumn(usize),
    CursorRow(usize),
    CursorPosition { row: usize, col: usize },
    TabForward(usize),
    TabBackward(usize),
    EraseInDisplay(EraseDirection),
    EraseInLine(EraseDirection),
    EraseChars(usize),
    InsertLines(usize),
    DeleteLines(usize),
    DeleteChars(usize),
    ScrollUp(usize),
    ScrollDown(usize),
    TabClear(usize),
    PrivateModeSet(Vec<u16>),
    PrivateModeReset(Vec<u16>),
    Sgr(Vec<u16>),
    SetScrollingRegion { top: usize, bottom: usize },
    SaveCursor,
    RestoreCursor,
    Unsupported(u8),
}

fn parse_csi_sequence(buffer: &[u8], final_byte: u8) -> CsiSequence {
    let mut params_bytes = buffer;
    let mut private_marker = None;
    if let Some(&marker) = params_bytes.first() {
        if matches!(marker, 0x3c..=0x3f) {
            private_marker = Some(marker);
            params_bytes = &params_bytes[1..];
        }
    }
    // Anything beyond digits and semicolons (intermediate bytes, stray
    // markers, subparameter colons) makes the sequence one we do not
    // interpret; treating its parameters as plain ones would corrupt state.
    if params_bytes.iter().any(|&b| !b.is_ascii_digit() && b != b';') {
        return CsiSequence::Unsupported(final_byte);
    }
    let mut params: Vec<u16> = Vec::new();
    for part in params_bytes.split(|&b| b == b';') {
        let mut value: u16 = 0;
        for &digit in part {
            value = value
                .saturating_mul(10)
                .saturating_add((digit - b'0') as u16);
        }
        params.push(value);
        if params.len() >= MAX_CSI_PARAMS {
            break;
        }
    }
    // A zero parameter and an absent one both take the default.
    let param = |idx: usize, default: usize| -> usize {
        match params.get(idx) {
            Some(&v) if v != 0 => v as usize,
            _ => default,
        }
    };
    let raw = |idx: usize| params.get(idx).copied().unwrap_or(0) as usize;
    let parse_erase = |idx: usize| match raw(idx) {
        0 => EraseDirection::ToEnd,
        1 => EraseDirection::ToStart,
        2 => EraseDirection::All,
        v => EraseDirection::Unsupported(v),
    };
    match final_byte {
        b'h' if private_marker == Some(b'?') => CsiSequence::PrivateModeSet(params),
        b'l' if private_marker == Some(b'?') => CsiSequence::PrivateModeReset(params),
        // `<`, `=`, and `>` prefix sequences (DA2, modifier resources, ...)
        // that share final bytes with plain ones but mean something else.
        _ if private_marker.is_some() => CsiSequence::Unsupported(final_byte),
        b'@' => CsiSequence::InsertBlankChars(param(0, 1)),
        b'A' => CsiSequence::CursorUp(param(0, 1)),
        b'B' => CsiSequence::CursorDown(param(0, 1)),
        b'C' => CsiSequence::CursorForward(param(0, 1)),
        b'D' => CsiSequence::CursorBackward(param(0, 1)),
        b'E' => CsiSequence::CursorNextLine(param(0, 1)),
        b'F' => CsiSequence::CursorPrevLine(param(0, 1)),
        b'G' => CsiSequence::CursorColumn(param(0, 1)),
        b'H' | b'f' => CsiSequence::CursorPosition {
            row: param(0, 1),
            col: param(1, 1),
        },
        b'I' => CsiSequence::TabForward(param(0, 1)),
        b'J' => CsiSequence::EraseInDisplay(parse_erase(0)),
        b'K' => CsiSequence::EraseInLine(parse_erase(0)),
        b'L' => CsiSequence::InsertLines(param(0, 1)),
        b'M' => CsiSequence::DeleteLines(param(0, 1)),
        b'P' => CsiSequence::DeleteChars(param(0, 1)),
        b'S' => CsiSequence::ScrollUp(param(0, 1)),
        b'T' => CsiSequence::ScrollDown(param(0, 1)),
        b'X' => CsiSequence::EraseChars(param(0, 1)),
        b'Z' => CsiSequence::TabBackward(param(0, 1)),
        b'd' => CsiSequence::CursorRow(param(0, 1)),
        b'g' => CsiSequence::TabClear(raw(0)),
        b'm' => CsiSequence::Sgr(params),
        b'r' => CsiSequence::SetScrollingRegion {
            top: param(0, 1),
            bottom: raw(1),
        },
        b's' => CsiSequence::SaveCursor,
        b'u' => CsiSequence::RestoreCursor,
        _ => CsiSequence::Unsupported(final_byte),
    }
}

fn handle_csi_sequence(term: &mut Term, sequence: CsiSequence) {
    match sequence {
        CsiSequence::InsertBlankChars(n) => screen::insert_blank_chars(term, n),
        CsiSequence::CursorUp(n) => screen::move_cursor_up(term, n),
        CsiSequence::CursorDown(n) => screen::move_cursor_down(term, n),
        CsiSequence::CursorForward(n) => screen::move_cursor_forward(term, n),
        CsiSequence::CursorBackward(n) => screen::move_cursor_backward(term, n),
        CsiSequence::CursorNextLine(n) => {
            screen::move_cursor_down(term, n);
            screen::carriage_return(term);
        }
        CsiSequence::CursorPrevLine(n) => {
            screen::move_cursor_up(term, n);
            screen::carriage_return(term);
        }
        CsiSequence::CursorColumn(col) => screen::set_cursor_column(term, col),
        CsiSequence::CursorRow(row) => screen::set_cursor_row(term, row),
        CsiSequence::CursorPosition { row, col } => screen::set_cursor_pos(term, row, col),
        CsiSequence::TabForward(n) => screen::tab_forward(term, n),
        CsiSequence::TabBackward(n) => screen::tab_backward(term, n),
        CsiSequence::EraseInDisplay(direction) => match direction {
            EraseDirection::ToEnd => screen::erase_display_to_end(term),
            EraseDirection::ToStart => screen::erase_display_to_start(term),
            EraseDirection::All => screen::erase_display(term),
            EraseDirection::Unsupported(v) => trace!("unsupported ED mode {v}"),
        },
        CsiSequence::EraseInLine(direction) => match direction {
            EraseDirection::ToEnd => screen::erase_line_to_end(term),
            EraseDirection::ToStart => screen::erase_line_to_start(term),
            EraseDirection::All => screen::erase_line(term),
            EraseDirection::Unsupported(v) => trace!("unsupported EL mode {v}"),
        },
        CsiSequence::EraseChars(n) => screen::erase_chars(term, n),
        CsiSequence::InsertLines(n) => screen::insert_blank_lines(term, n),
        CsiSequence::DeleteLines(n) => screen::delete_lines(term, n),
        CsiSequence::DeleteChars(n) => screen::delete_chars(term, n),
        CsiSequence::ScrollUp(n) => screen::scroll_up(term, n),
        CsiSequence::ScrollDown(n) => screen::scroll_down(term, n),
        CsiSequence::TabClear(mode) => screen::clear_tab_stops(term, mode),
        CsiSequence::PrivateModeSet(modes) => {
            for mode in modes {
                set_private_mode(term, mode, true);
            }
        }
        CsiSequence::PrivateModeReset(modes) => {
            for mode in modes {
                set_private_mode(term, mode, false);
            }
        }
        CsiSequence::Sgr(params) => handle_sgr(term, &params),
        CsiSequence::SetScrollingRegion { top, bottom } => {
            screen::set_scrolling_region(term, top, bottom);
        }
        CsiSequence::SaveCursor => screen::save_cursor(term),
        CsiSequence::RestoreCursor => screen::restore_cursor(term),
        CsiSequence::Unsupported(final_byte) => {
            trace!("ignoring unsupported CSI final byte 0x{final_byte:02x}");
        }
    }
}

fn set_private_mode(term: &mut Term, mode: u16, set: bool) {
    match mode {
        6 => {
            term.modes.origin_mode = set;
            screen::set_cursor_pos(term, 1, 1);
        }
        7 => term.modes.autowrap = set,
        // Visibility changes surface through the net-change check in
        // `process_bytes`.
        25 => term.modes.cursor_visible = set,
        _ => trace!("ignoring DEC private mode {mode}"),
    }
}

fn handle_sgr(term: &mut Term, params: &[u16]) {
    if params.is_empty() {
        term.current_attributes = Attributes::default();
        return;
    }
    let attrs = &mut term.current_attributes;
    let mut i = 0;
    while i < params.len() {
        match params[i] {
            0 => *attrs = Attributes::default(),
            1 => attrs.flags |= AttrFlags::BOLD,
            2 => attrs.flags |= AttrFlags::FAINT,
            3 => attrs.flags |= AttrFlags::ITALIC,
            4 => attrs.flags |= AttrFlags::UNDERLINE,
            5 | 6 => attrs.flags |= AttrFlags::BLINK,
            7 => attrs.flags |= AttrFlags::REVERSE,
            8 => attrs.flags |= AttrFlags::HIDDEN,
            9 => attrs.flags |= AttrFlags::STRIKETHROUGH,
            22 => attrs.flags &= !(AttrFlags::BOLD | AttrFlags::FAINT),
            23 => attrs.flags &= !AttrFlags::ITALIC,
            24 => attrs.flags &= !AttrFlags::UNDERLINE,
            25 => attrs.flags &= !AttrFlags::BLINK,
            27 => attrs.flags &= !AttrFlags::REVERSE,
            28 => attrs.flags &= !AttrFlags::HIDDEN,
            29 => attrs.flags &= !AttrFlags::STRIKETHROUGH,
            p @ 30..=37 => attrs.fg = Color::Indexed((p - 30) as u8),
            38 => match parse_extended_color(&params[i + 1..]) {
                Some((color, consumed)) => {
                    attrs.fg = color;
                    i += consumed;
                }
                None => break,
            },
            39 => attrs.fg = Color::Default,
            p @ 40..=47 => attrs.bg = Color::Indexed((p - 40) as u8),
            48 => match parse_extended_color(&params[i + 1..]) {
                Some((color, consumed)) => {
                    attrs.bg = color;
                    i += consumed;
                }
                None => break,
            },
            49 => attrs.bg = Color::Default,
            p @ 90..=97 => attrs.fg = Color::Indexed((p - 90 + 8) as u8),
            p @ 100..=107 => attrs.bg = Color::Indexed((p - 100 + 8) as u8),
            p => trace!("ignoring SGR parameter {p}"),
        }
        i += 1;
    }
}

/// Parses the tail of an SGR 38/48: `5;idx` or `2;r;g;b`. Returns the color
/// and how many parameters it consumed.
fn parse_extended_color(rest: &[u16]) -> Option<(Color, usize)> {
    match rest.first()? {
        5 => {
            let idx = (*rest.get(1)?).min(255) as u8;
            Some((Color::Indexed(idx), 2))
        }
        2 => {
            let r = (*rest.get(1)?).min(255) as u8;
            let g = (*rest.get(2)?).min(255) as u8;
            let b = (*rest.get(3)?).min(255) as u8;
            Some((Color::Rgb(r, g, b), 4))
        }
        _ => None,
    }
}
