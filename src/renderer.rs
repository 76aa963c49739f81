// src/renderer.rs

//! Paints the terminal grid into an RGB pixel buffer and reduces it to
//! palette indices for the encoder.

use crate::color::{self, Color};
use crate::config::Config;
use crate::font::{self, CELL_HEIGHT, CELL_WIDTH};
use crate::glyph::{AttrFlags, Attributes, WIDE_CHAR_PLACEHOLDER};
use crate::term::Term;

const BYTES_PER_PIXEL: usize = 3;

/// Flat row-major RGB buffer sized to the full terminal, rewritten in place
/// for every captured frame.
#[derive(Debug)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        PixelBuffer {
            width,
            height,
            data: vec![0; width * height * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let off = (y * self.width + x) * BYTES_PER_PIXEL;
        (self.data[off], self.data[off + 1], self.data[off + 2])
    }

    fn put(&mut self, x: usize, y: usize, rgb: (u8, u8, u8)) {
        let off = (y * self.width + x) * BYTES_PER_PIXEL;
        self.data[off] = rgb.0;
        self.data[off + 1] = rgb.1;
        self.data[off + 2] = rgb.2;
    }
}

/// Quantizes every pixel into `out`, one palette index per pixel, row-major.
/// `out` must hold exactly `width * height` bytes.
pub fn apply_colormap(pb: &PixelBuffer, out: &mut [u8]) {
    debug_assert_eq!(out.len(), pb.width * pb.height);
    for (index, rgb) in out.iter_mut().zip(pb.data.chunks_exact(BYTES_PER_PIXEL)) {
        *index = color::quantize(rgb[0], rgb[1], rgb[2]);
    }
}

/// Renders `Term` state to pixels. Stateless apart from the configured
/// default colors; the output is a pure function of the grid.
#[derive(Debug)]
pub struct Renderer {
    fg_index: u8,
    bg_index: u8,
    cursor_index: u8,
}

impl Renderer {
    pub fn new(config: &Config) -> Self {
        Renderer {
            fg_index: config.foreground_color,
            bg_index: config.background_color,
            cursor_index: config.cursor_color,
        }
    }

    pub fn render(&self, term: &Term, pb: &mut PixelBuffer) {
        let cursor = term.cursor();
        for y in 0..term.rows() {
            for x in 0..term.cols() {
                let glyph = term.glyph(x, y);
                let (fg, mut bg) = self.effective_colors(&glyph.attr);
                if term.cursor_visible() && x == cursor.x && y == cursor.y {
                    bg = color::indexed_to_rgb(self.cursor_index);
                }
                let bitmap = match glyph.c {
                    WIDE_CHAR_PLACEHOLDER | ' ' => None,
                    c => Some(font::glyph_bitmap(c).unwrap_or(font::FALLBACK_BITMAP)),
                };
                paint_cell(pb, x, y, bitmap, fg, bg, glyph.attr.flags);
            }
        }
    }

    /// Resolves an attribute pair to concrete RGB: defaults come from the
    /// configured palette indices, BOLD brightens the low 8 foreground
    /// indices, REVERSE swaps after resolution, HIDDEN paints foreground as
    /// background.
    fn effective_colors(&self, attr: &Attributes) -> ((u8, u8, u8), (u8, u8, u8)) {
        let bold = attr.flags.contains(AttrFlags::BOLD);
        let mut fg = resolve(attr.fg, self.fg_index, bold);
        let mut bg = resolve(attr.bg, self.bg_index, false);
        if attr.flags.contains(AttrFlags::REVERSE) {
            std::mem::swap(&mut fg, &mut bg);
        }
        if attr.flags.contains(AttrFlags::HIDDEN) {
            fg = bg;
        }
        (fg, bg)
    }
}

fn resolve(color: Color, default_index: u8, brighten: bool) -> (u8, u8, u8) {
    let brightened = |idx: u8| if brighten && idx < 8 { idx + 8 } else { idx };
    match color {
        Color::Default => color::indexed_to_rgb(brightened(default_index)),
        Color::Indexed(idx) => color::indexed_to_rgb(brightened(idx)),
        Color::Rgb(r, g, b) => (r, g, b),
    }
}

fn paint_cell(
    pb: &mut PixelBuffer,
    col: usize,
    row: usize,
    bitmap: Option<[u8; 8]>,
    fg: (u8, u8, u8),
    bg: (u8, u8, u8),
    flags: AttrFlags,
) {
    let x0 = col * CELL_WIDTH;
    let y0 = row * CELL_HEIGHT;
    let underline = flags.contains(AttrFlags::UNDERLINE);
    for dy in 0..CELL_HEIGHT {
        // Each source row covers two scanlines.
        let row_bits = bitmap.map_or(0, |b| b[dy / 2]);
        for dx in 0..CELL_WIDTH {
            let on = (row_bits >> dx) & 1 == 1 || (underline && dy == CELL_HEIGHT - 1);
            pb.put(x0 + dx, y0 + dy, if on { fg } else { bg });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn test_config() -> Config {
        use clap::Parser;
        Config::try_parse_from(["gifcast", "-w", "2", "-h", "1"]).unwrap()
    }

    fn rendered(term: &Term, config: &Config) -> PixelBuffer {
        let mut pb = PixelBuffer::new(
            term.cols() * CELL_WIDTH,
            term.rows() * CELL_HEIGHT,
        );
        Renderer::new(config).render(term, &mut pb);
        pb
    }

    #[test]
    fn blank_cell_under_cursor_takes_cursor_color() {
        let config = test_config();
        let term = Term::new(2, 1, 8);
        let pb = rendered(&term, &config);
        let cursor_rgb = crate::color::indexed_to_rgb(2);
        assert_eq!(pb.pixel(0, 0), cursor_rgb);
        // The neighboring cell keeps the default background.
        assert_eq!(pb.pixel(CELL_WIDTH, 0), crate::color::indexed_to_rgb(0));
    }

    #[test]
    fn hidden_cursor_leaves_background() {
        let config = test_config();
        let mut term = Term::new(2, 1, 8);
        term.process_bytes(b"\x1b[?25l");
        let pb = rendered(&term, &config);
        assert_eq!(pb.pixel(0, 0), crate::color::indexed_to_rgb(0));
    }

    #[test]
    fn glyph_pixels_use_foreground() {
        let config = test_config();
        let mut term = Term::new(2, 1, 8);
        term.process_bytes(b"\x1b[?25lX");
        let pb = rendered(&term, &config);
        let fg = crate::color::indexed_to_rgb(7);
        let cell: Vec<_> = (0..CELL_HEIGHT)
            .flat_map(|y| (0..CELL_WIDTH).map(move |x| (x, y)))
            .map(|(x, y)| pb.pixel(x, y))
            .collect();
        assert!(cell.contains(&fg));
        assert!(cell.contains(&crate::color::indexed_to_rgb(0)));
    }

    #[test]
    fn bold_brightens_default_foreground() {
        let config = test_config();
        let mut term = Term::new(2, 1, 8);
        term.process_bytes(b"\x1b[?25l\x1b[1mX");
        let pb = rendered(&term, &config);
        let bright = crate::color::indexed_to_rgb(15);
        let mut found = false;
        for y in 0..CELL_HEIGHT {
            for x in 0..CELL_WIDTH {
                found |= pb.pixel(x, y) == bright;
            }
        }
        assert!(found);
    }

    #[test]
    fn reverse_swaps_colors() {
        let config = test_config();
        let mut term = Term::new(2, 1, 8);
        // Reverse video on a blank cell paints it in the foreground color.
        term.process_bytes(b"\x1b[?25l\x1b[7m\x1b[K");
        let pb = rendered(&term, &config);
        assert_eq!(pb.pixel(0, 0), crate::color::indexed_to_rgb(7));
    }

    #[test]
    fn underline_paints_bottom_scanline() {
        let config = test_config();
        let mut term = Term::new(2, 1, 8);
        term.process_bytes(b"\x1b[?25l\x1b[4m ");
        let pb = rendered(&term, &config);
        let fg = crate::color::indexed_to_rgb(7);
        for x in 0..CELL_WIDTH {
            assert_eq!(pb.pixel(x, CELL_HEIGHT - 1), fg);
        }
        assert_eq!(pb.pixel(0, 0), crate::color::indexed_to_rgb(0));
    }

    #[test]
    fn colormap_matches_quantized_pixels() {
        let config = test_config();
        let mut term = Term::new(2, 1, 8);
        term.process_bytes(b"\x1b[31mA");
        let pb = rendered(&term, &config);
        let mut indices = vec![0u8; pb.width() * pb.height()];
        apply_colormap(&pb, &mut indices);
        let (r, g, b) = pb.pixel(3, 3);
        assert_eq!(indices[3 * pb.width() + 3], crate::color::quantize(r, g, b));
    }
}
