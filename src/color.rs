// src/color.rs

//! Color representation, 256-color palette resolution, and the 3-3-2 output
//! colormap used for the emitted GIF.

use once_cell::sync::Lazy;

/// Represents a color value carried by a cell attribute.
/// Can be a default placeholder, an indexed color from the 256-color palette,
/// or an RGB true color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Default foreground or background color, resolved by the renderer from
    /// the configured palette indices.
    #[default]
    Default,
    /// An indexed color from the 256-color palette (indices 0-255).
    Indexed(u8),
    /// An RGB true color, with each component from 0 to 255.
    Rgb(u8, u8, u8),
}

// Constants for 256-color palette indexing
const ANSI_NAMED_COLOR_COUNT: u8 = 16;
const COLOR_CUBE_OFFSET: u8 = 16;
const COLOR_CUBE_SIZE: u8 = 6; // 6x6x6 cube
const COLOR_CUBE_TOTAL_COLORS: u8 = COLOR_CUBE_SIZE * COLOR_CUBE_SIZE * COLOR_CUBE_SIZE; // 216
const GRAYSCALE_OFFSET: u8 = COLOR_CUBE_OFFSET + COLOR_CUBE_TOTAL_COLORS; // 16 + 216 = 232

/// Common sRGB values for the 16 standard ANSI colors (8 normal + 8 bright).
const ANSI_RGB: [(u8, u8, u8); ANSI_NAMED_COLOR_COUNT as usize] = [
    (0, 0, 0),       // black
    (205, 0, 0),     // red
    (0, 205, 0),     // green
    (205, 205, 0),   // yellow
    (0, 0, 238),     // blue
    (205, 0, 205),   // magenta
    (0, 205, 205),   // cyan
    (229, 229, 229), // white
    (127, 127, 127), // bright black
    (255, 0, 0),     // bright red
    (0, 255, 0),     // bright green
    (255, 255, 0),   // bright yellow
    (92, 92, 255),   // bright blue
    (255, 0, 255),   // bright magenta
    (0, 255, 255),   // bright cyan
    (255, 255, 255), // bright white
];

/// Resolves a 256-color palette index to its sRGB value: the 16 named ANSI
/// colors, the 6x6x6 color cube (16-231), and the grayscale ramp (232-255).
pub fn indexed_to_rgb(idx: u8) -> (u8, u8, u8) {
    if idx < ANSI_NAMED_COLOR_COUNT {
        return ANSI_RGB[idx as usize];
    }
    if idx < GRAYSCALE_OFFSET {
        let cube_idx = idx - COLOR_CUBE_OFFSET;
        let r_comp = (cube_idx / (COLOR_CUBE_SIZE * COLOR_CUBE_SIZE)) % COLOR_CUBE_SIZE;
        let g_comp = (cube_idx / COLOR_CUBE_SIZE) % COLOR_CUBE_SIZE;
        let b_comp = cube_idx % COLOR_CUBE_SIZE;
        let level = |comp: u8| if comp == 0 { 0 } else { comp * 40 + 55 };
        return (level(r_comp), level(g_comp), level(b_comp));
    }
    // Grayscale ramp (indices 232-255)
    let level = (idx - GRAYSCALE_OFFSET) * 10 + 8;
    (level, level, level)
}

// Output colormap layout: 3 bits red, 3 bits green, 2 bits blue.
const RED_BITS: u32 = 3;
const GREEN_BITS: u32 = 3;
const BLUE_BITS: u32 = 2;
const RED_SHIFT: u32 = GREEN_BITS + BLUE_BITS;
const GREEN_SHIFT: u32 = BLUE_BITS;
const RED_MAX: u32 = (1 << RED_BITS) - 1;
const GREEN_MAX: u32 = (1 << GREEN_BITS) - 1;
const BLUE_MAX: u32 = (1 << BLUE_BITS) - 1;

/// The global GIF palette: 256 entries of packed RGB, one per possible
/// quantized index, each channel level scaled to the full 0-255 range.
pub static OUTPUT_PALETTE: Lazy<[u8; 768]> = Lazy::new(|| {
    let mut palette = [0u8; 768];
    for (i, entry) in palette.chunks_exact_mut(3).enumerate() {
        let i = i as u32;
        let r = (i >> RED_SHIFT) & RED_MAX;
        let g = (i >> GREEN_SHIFT) & GREEN_MAX;
        let b = i & BLUE_MAX;
        entry[0] = (r * 255 / RED_MAX) as u8;
        entry[1] = (g * 255 / GREEN_MAX) as u8;
        entry[2] = (b * 255 / BLUE_MAX) as u8;
    }
    palette
});

/// Reduces a 24-bit pixel to its palette index by keeping the top 3/3/2 bits
/// of each channel. Total over all inputs and stable against `OUTPUT_PALETTE`.
pub fn quantize(r: u8, g: u8, b: u8) -> u8 {
    ((r >> (8 - RED_BITS)) << RED_SHIFT) as u8
        | ((g >> (8 - GREEN_BITS)) << GREEN_SHIFT) as u8
        | (b >> (8 - BLUE_BITS))
}
