// src/encoder.rs

//! The frame sink boundary and its GIF implementation.
//!
//! `GifSink` encodes into memory; the caller writes the finished file to
//! stdout only after a clean run, so a fatal error never leaves a partial
//! GIF behind.

use anyhow::{Context, Result};
use gif::{DisposalMethod, Encoder, Frame, Repeat};
use log::debug;
use std::borrow::Cow;

/// Parameters supplied with every submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    /// Display duration in hundredths of a second.
    pub delay_cs: u16,
    /// Palette index rendered as transparent, if any.
    pub transparent: Option<u8>,
    /// Whether playback should wait for user input on this frame.
    pub needs_input: bool,
}

/// Receives quantized frames in presentation order.
pub trait FrameSink {
    fn push_frame(&mut self, params: FrameParams, index_buffer: &[u8]) -> Result<()>;
}

/// Animated-GIF sink: global 256-entry palette, infinite looping,
/// restore-to-background disposal.
pub struct GifSink {
    encoder: Encoder<Vec<u8>>,
    width: u16,
    height: u16,
    frames: usize,
}

impl GifSink {
    pub fn open(width: u16, height: u16, palette: &[u8]) -> Result<Self> {
        let mut encoder = Encoder::new(Vec::new(), width, height, palette)
            .context("failed to start GIF stream")?;
        encoder
            .set_repeat(Repeat::Infinite)
            .context("failed to set GIF loop count")?;
        Ok(GifSink {
            encoder,
            width,
            height,
            frames: 0,
        })
    }

    /// Finalizes the stream and returns the complete file.
    pub fn finish(self) -> Result<Vec<u8>> {
        debug!("finalizing GIF with {} frames", self.frames);
        self.encoder
            .into_inner()
            .context("failed to finalize GIF stream")
    }
}

impl FrameSink for GifSink {
    fn push_frame(&mut self, params: FrameParams, index_buffer: &[u8]) -> Result<()> {
        let mut frame = Frame::default();
        frame.width = self.width;
        frame.height = self.height;
        frame.buffer = Cow::Borrowed(index_buffer);
        frame.delay = params.delay_cs;
        frame.transparent = params.transparent;
        frame.needs_user_input = params.needs_input;
        frame.dispose = DisposalMethod::Background;
        self.encoder
            .write_frame(&frame)
            .with_context(|| format!("failed to encode frame {}", self.frames))?;
        self.frames += 1;
        Ok(())
    }
}
