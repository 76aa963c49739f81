// src/term/unicode.rs

//! Incremental UTF-8 decoding and character-set mapping.
//!
//! The decoder carries partial sequences across calls, which is what lets a
//! multi-byte character straddle two records without corruption.

use super::CharacterSet;

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Utf8DecodeResult {
    /// A complete character was decoded.
    Decoded(char),
    /// The byte cannot continue or start a sequence.
    InvalidSequence,
    /// A multi-byte sequence is in progress.
    NeedsMoreBytes,
}

#[derive(Debug, Default)]
pub(super) struct Utf8Decoder {
    buffer: [u8; 4],
    len: usize,
    expected: usize,
}

impl Utf8Decoder {
    pub(super) fn in_progress(&self) -> bool {
        self.len > 0
    }

    pub(super) fn reset(&mut self) {
        self.len = 0;
        self.expected = 0;
    }

    pub(super) fn decode(&mut self, byte: u8) -> Utf8DecodeResult {
        if self.len == 0 {
            let expected = match byte {
                0x00..=0x7f => return Utf8DecodeResult::Decoded(byte as char),
                0xc2..=0xdf => 2,
                0xe0..=0xef => 3,
                0xf0..=0xf4 => 4,
                // Continuation byte with no sequence open, or an overlong /
                // out-of-range lead byte.
                _ => return Utf8DecodeResult::InvalidSequence,
            };
            self.buffer[0] = byte;
            self.len = 1;
            self.expected = expected;
            return Utf8DecodeResult::NeedsMoreBytes;
        }
        if !(0x80..=0xbf).contains(&byte) {
            self.reset();
            return Utf8DecodeResult::InvalidSequence;
        }
        self.buffer[self.len] = byte;
        self.len += 1;
        if self.len < self.expected {
            return Utf8DecodeResult::NeedsMoreBytes;
        }
        let decoded = std::str::from_utf8(&self.buffer[..self.len])
            .ok()
            .and_then(|s| s.chars().next());
        self.reset();
        match decoded {
            Some(c) => Utf8DecodeResult::Decoded(c),
            None => Utf8DecodeResult::InvalidSequence,
        }
    }
}

/// Applies the active character set to a decoded character.
pub(super) fn map_charset(c: char, set: CharacterSet) -> char {
    match set {
        CharacterSet::Ascii => c,
        CharacterSet::DecSpecialGraphics => map_dec_graphics(c),
    }
}

/// The line-drawing portion of the DEC special graphics set. Characters
/// outside the remapped range pass through unchanged.
fn map_dec_graphics(c: char) -> char {
    match c {
        '`' => '◆',
        'a' => '▒',
        'f' => '°',
        'g' => '±',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'q' => '─',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_decodes_immediately() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b'A'), Utf8DecodeResult::Decoded('A'));
        assert!(!decoder.in_progress());
    }

    #[test]
    fn multibyte_decodes_across_calls() {
        let mut decoder = Utf8Decoder::default();
        let bytes = "é".as_bytes();
        assert_eq!(decoder.decode(bytes[0]), Utf8DecodeResult::NeedsMoreBytes);
        assert!(decoder.in_progress());
        assert_eq!(decoder.decode(bytes[1]), Utf8DecodeResult::Decoded('é'));
    }

    #[test]
    fn four_byte_sequence() {
        let mut decoder = Utf8Decoder::default();
        let bytes = "🦀".as_bytes();
        for &b in &bytes[..3] {
            assert_eq!(decoder.decode(b), Utf8DecodeResult::NeedsMoreBytes);
        }
        assert_eq!(decoder.decode(bytes[3]), Utf8DecodeResult::Decoded('🦀'));
    }

    #[test]
    fn stray_continuation_is_invalid() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(0x80), Utf8DecodeResult::InvalidSequence);
    }

    #[test]
    fn interrupted_sequence_resets() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(0xe2), Utf8DecodeResult::NeedsMoreBytes);
        assert_eq!(decoder.decode(b'x'), Utf8DecodeResult::InvalidSequence);
        assert!(!decoder.in_progress());
        // Recovers on the next valid input.
        assert_eq!(decoder.decode(b'y'), Utf8DecodeResult::Decoded('y'));
    }

    #[test]
    fn dec_graphics_remaps_line_drawing() {
        assert_eq!(map_charset('q', CharacterSet::DecSpecialGraphics), '─');
        assert_eq!(map_charset('x', CharacterSet::DecSpecialGraphics), '│');
        assert_eq!(map_charset('q', CharacterSet::Ascii), 'q');
        assert_eq!(map_charset('Q', CharacterSet::DecSpecialGraphics), 'Q');
    }
}
