// src/config.rs

//! Command-line configuration.
//!
//! The recording comes in on stdin and the GIF leaves on stdout, so the
//! entire surface is flags. `-h` is taken by height, matching the historical
//! option set; help moves to `-H`.

use clap::{ArgAction, Parser};

/// Convert a ttyrec terminal recording (stdin) into an animated GIF (stdout).
#[derive(Parser, Debug, Clone)]
#[command(name = "gifcast", version, disable_help_flag = true)]
pub struct Config {
    /// Terminal width in character cells.
    #[arg(short = 'w', long, default_value_t = 80, value_parser = clap::value_parser!(u16).range(1..))]
    pub width: u16,

    /// Terminal height in character cells.
    #[arg(short = 'h', long, default_value_t = 24, value_parser = clap::value_parser!(u16).range(1..))]
    pub height: u16,

    /// How long the final frame stays on screen, in milliseconds.
    /// 0 disables the hold frame.
    #[arg(short = 'l', long, default_value_t = 300)]
    pub last_frame_delay: u32,

    /// Default foreground color as a 256-color palette index.
    #[arg(short = 'f', long, default_value_t = 7)]
    pub foreground_color: u8,

    /// Default background color as a 256-color palette index.
    #[arg(short = 'b', long, default_value_t = 0)]
    pub background_color: u8,

    /// Cursor color as a 256-color palette index.
    #[arg(short = 'c', long, default_value_t = 2)]
    pub cursor_color: u8,

    /// Tab stop interval in cells. 0 leaves no tab stops.
    #[arg(short = 't', long, default_value_t = 8)]
    pub tabstop: u8,

    /// Print help.
    #[arg(short = 'H', long = "help", action = ArgAction::Help)]
    help: Option<bool>,
}

impl Config {
    /// Output image width in pixels.
    pub fn pixel_width(&self) -> usize {
        self.width as usize * crate::font::CELL_WIDTH
    }

    /// Output image height in pixels.
    pub fn pixel_height(&self) -> usize {
        self.height as usize * crate::font::CELL_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("gifcast").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.width, 80);
        assert_eq!(config.height, 24);
        assert_eq!(config.last_frame_delay, 300);
        assert_eq!(config.foreground_color, 7);
        assert_eq!(config.background_color, 0);
        assert_eq!(config.cursor_color, 2);
        assert_eq!(config.tabstop, 8);
    }

    #[test]
    fn short_flags_parse() {
        let config = parse(&["-w", "132", "-h", "43", "-l", "0", "-f", "15", "-b", "4", "-c", "1", "-t", "4"]).unwrap();
        assert_eq!(config.width, 132);
        assert_eq!(config.height, 43);
        assert_eq!(config.last_frame_delay, 0);
        assert_eq!(config.foreground_color, 15);
        assert_eq!(config.background_color, 4);
        assert_eq!(config.cursor_color, 1);
        assert_eq!(config.tabstop, 4);
    }

    #[test]
    fn zero_geometry_is_rejected() {
        assert!(parse(&["-w", "0"]).is_err());
        assert!(parse(&["-h", "0"]).is_err());
    }

    #[test]
    fn out_of_range_colors_are_rejected() {
        assert!(parse(&["-f", "256"]).is_err());
        assert!(parse(&["-b", "-1"]).is_err());
    }

    #[test]
    fn pixel_geometry_uses_cell_size() {
        let config = parse(&["-w", "10", "-h", "5"]).unwrap();
        assert_eq!(config.pixel_width(), 80);
        assert_eq!(config.pixel_height(), 80);
    }
}
