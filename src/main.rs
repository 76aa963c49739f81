// src/main.rs

mod capture;
mod color;
mod config;
mod encoder;
mod font;
mod glyph;
mod record;
mod renderer;
mod term;

use anyhow::{ensure, Context};
use clap::Parser;
use log::{debug, info};
use std::io::{self, Write};

use crate::config::Config;
use crate::encoder::GifSink;
use crate::record::RecordReader;
use crate::renderer::Renderer;
use crate::term::Term;

fn main() -> anyhow::Result<()> {
    // Stdout carries the GIF; all logging goes to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_micros()
        .init();

    let config = Config::parse();
    ensure!(
        config.pixel_width() <= u16::MAX as usize && config.pixel_height() <= u16::MAX as usize,
        "image dimensions {}x{} px exceed the GIF limit of 65535",
        config.pixel_width(),
        config.pixel_height()
    );
    info!(
        "converting at {}x{} cells ({}x{} px)",
        config.width,
        config.height,
        config.pixel_width(),
        config.pixel_height()
    );

    let mut term = Term::new(config.width as usize, config.height as usize, config.tabstop);
    let renderer = Renderer::new(&config);
    let mut sink = GifSink::open(
        config.pixel_width() as u16,
        config.pixel_height() as u16,
        crate::color::OUTPUT_PALETTE.as_slice(),
    )?;

    let stdin = io::stdin().lock();
    let records = RecordReader::new(stdin);
    capture::convert(
        records,
        &mut term,
        &renderer,
        &mut sink,
        config.last_frame_delay,
    )?;

    let bytes = sink.finish()?;
    debug!("writing {} bytes to stdout", bytes.len());
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&bytes)
        .context("failed to write GIF to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}
