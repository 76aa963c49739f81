// src/capture.rs

//! The conversion loop: feed each record through the terminal, decide
//! whether the result is worth a frame, and account for the time in between.

use anyhow::{Context, Result};
use log::{debug, info, trace};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::encoder::{FrameParams, FrameSink};
use crate::record::Record;
use crate::renderer::{apply_colormap, PixelBuffer, Renderer};
use crate::term::Term;

/// Accumulates wall-clock time between captured frames in microseconds.
///
/// The baseline starts at the first record's timestamp, so the first frame
/// carries only the minimum delay rather than the recording's absolute start
/// time. Records skipped by the capture policy fold their time into the next
/// emitted frame.
#[derive(Debug, Default)]
pub struct FrameTimer {
    pending_usec: i64,
    last: Option<(i32, i32)>,
}

impl FrameTimer {
    pub fn new() -> Self {
        FrameTimer::default()
    }

    /// Advances the timer to a record's timestamp.
    pub fn accrue(&mut self, seconds: i32, microseconds: i32) {
        if let Some((prev_sec, prev_usec)) = self.last {
            let delta = (seconds as i64 - prev_sec as i64) * 1_000_000
                + (microseconds as i64 - prev_usec as i64);
            // Out-of-order timestamps contribute nothing.
            self.pending_usec += delta.max(0);
        }
        self.last = Some((seconds, microseconds));
    }

    /// Converts the pending time into a GIF delay (hundredths of a second,
    /// rounded to nearest with a one-unit floor) and resets it.
    pub fn take_delay_cs(&mut self) -> u16 {
        let delay = (self.pending_usec + 5_000) / 10_000 + 1;
        self.pending_usec = 0;
        delay.clamp(1, u16::MAX as i64) as u16
    }
}

/// Keeps SIGINT ignored while held, so an interrupt cannot kill the process
/// halfway through writing terminal state. Restores the default disposition
/// on drop.
struct InterruptGuard;

impl InterruptGuard {
    fn install() -> Result<Self> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        // SAFETY: replacing the SIGINT disposition with SIG_IGN involves no
        // handler code and is async-signal-safe.
        unsafe { sigaction(Signal::SIGINT, &ignore) }.context("failed to ignore SIGINT")?;
        Ok(InterruptGuard)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        // SAFETY: restoring SIG_DFL; see install().
        let _ = unsafe { sigaction(Signal::SIGINT, &default) };
    }
}

/// Runs the conversion: interprets every record, captures frames per the
/// emission policy, and appends the hold frame at end of stream.
///
/// A frame is captured when the record produced a visible change, or
/// unconditionally outside device control strings; mid-DCS records without
/// visible output only accrue time.
pub fn convert<I, S>(
    records: I,
    term: &mut Term,
    renderer: &Renderer,
    sink: &mut S,
    last_frame_delay_ms: u32,
) -> Result<()>
where
    I: IntoIterator<Item = Record>,
    S: FrameSink,
{
    let _guard = InterruptGuard::install()?;
    let mut pb = PixelBuffer::new(
        term.cols() * crate::font::CELL_WIDTH,
        term.rows() * crate::font::CELL_HEIGHT,
    );
    let mut indices = vec![0u8; pb.width() * pb.height()];
    let mut timer = FrameTimer::new();
    let mut captured = 0usize;
    let mut processed = 0usize;

    for record in records {
        let dirty = term.process_bytes(&record.payload);
        timer.accrue(record.seconds, record.microseconds);
        processed += 1;
        if dirty || !term.in_string_sequence() {
            renderer.render(term, &mut pb);
            apply_colormap(&pb, &mut indices);
            sink.push_frame(
                FrameParams {
                    delay_cs: timer.take_delay_cs(),
                    transparent: None,
                    needs_input: false,
                },
                &indices,
            )?;
            captured += 1;
        } else {
            trace!("suppressing frame for record {processed}");
        }
    }

    if last_frame_delay_ms > 0 {
        if captured == 0 {
            // Nothing was ever rendered; show the final screen state.
            renderer.render(term, &mut pb);
            apply_colormap(&pb, &mut indices);
        }
        let delay_cs = (last_frame_delay_ms / 10).clamp(1, u16::MAX as u32) as u16;
        sink.push_frame(
            FrameParams {
                delay_cs,
                transparent: None,
                needs_input: false,
            },
            &indices,
        )?;
        debug!("appended hold frame of {delay_cs} cs");
    }

    info!("processed {processed} records into {captured} capture frames");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    struct MockSink {
        frames: Vec<(FrameParams, Vec<u8>)>,
    }

    impl MockSink {
        fn new() -> Self {
            MockSink { frames: Vec::new() }
        }

        fn delays(&self) -> Vec<u16> {
            self.frames.iter().map(|(p, _)| p.delay_cs).collect()
        }
    }

    impl FrameSink for MockSink {
        fn push_frame(&mut self, params: FrameParams, index_buffer: &[u8]) -> Result<()> {
            self.frames.push((params, index_buffer.to_vec()));
            Ok(())
        }
    }

    fn record(seconds: i32, microseconds: i32, payload: &[u8]) -> Record {
        Record {
            seconds,
            microseconds,
            payload: payload.to_vec(),
        }
    }

    fn run(records: Vec<Record>, last_frame_delay_ms: u32) -> MockSink {
        use clap::Parser;
        let config = Config::try_parse_from(["gifcast", "-w", "4", "-h", "2"]).unwrap();
        let mut term = Term::new(4, 2, config.tabstop);
        let renderer = Renderer::new(&config);
        let mut sink = MockSink::new();
        convert(records, &mut term, &renderer, &mut sink, last_frame_delay_ms).unwrap();
        sink
    }

    #[test_log::test]
    fn empty_stream_yields_only_the_hold_frame() {
        let sink = run(Vec::new(), 300);
        assert_eq!(sink.delays(), vec![30]);
    }

    #[test_log::test]
    fn zero_hold_delay_yields_a_frameless_stream() {
        let sink = run(Vec::new(), 0);
        assert!(sink.frames.is_empty());
    }

    #[test_log::test]
    fn one_record_yields_one_capture_frame_plus_hold() {
        let sink = run(vec![record(100, 0, b"hi")], 300);
        assert_eq!(sink.delays(), vec![1, 30]);
    }

    #[test_log::test]
    fn delays_follow_record_spacing() {
        let records = vec![
            record(100, 0, b"a"),
            record(100, 500_000, b"b"),
            record(101, 0, b"c"),
        ];
        let sink = run(records, 0);
        // First frame gets the 1 cs floor; the rest carry their gaps.
        assert_eq!(sink.delays(), vec![1, 51, 51]);
    }

    #[test_log::test]
    fn same_timestamp_records_get_the_floor_delay() {
        let records = vec![record(5, 0, b"a"), record(5, 0, b"b")];
        let sink = run(records, 0);
        assert_eq!(sink.delays(), vec![1, 1]);
    }

    #[test_log::test]
    fn suppressed_records_fold_time_into_the_next_frame() {
        let records = vec![
            record(10, 0, b"a"),
            record(10, 200_000, b"\x1bPdevice control"),
            record(10, 500_000, b" body\x1b\\"),
        ];
        let sink = run(records, 0);
        // The middle record enters a DCS with no visible change and is
        // skipped; its 0.2 s reappears on the terminating record's frame.
        assert_eq!(sink.delays(), vec![1, 51]);
    }

    #[test_log::test]
    fn mid_dcs_visible_output_is_impossible_but_terminator_emits_clean() {
        let records = vec![record(0, 0, b"\x1bPstart"), record(0, 0, b"\x1b\\")];
        let sink = run(records, 0);
        // Only the record that leaves the string sequence emits.
        assert_eq!(sink.frames.len(), 1);
    }

    #[test_log::test]
    fn delay_conservation_within_rounding() {
        let records = vec![
            record(0, 0, b"a"),
            record(0, 123_456, b"b"),
            record(1, 7_000, b"c"),
            record(2, 650_000, b"d"),
        ];
        let sink = run(records, 0);
        let total_cs: i64 = sink.delays().iter().map(|&d| d as i64).sum();
        // Elapsed time is 2.65 s = 265 cs; each frame may add at most one
        // unit of rounding, and the first frame adds its floor.
        let elapsed_cs = 265;
        assert!(
            (total_cs - elapsed_cs).abs() <= sink.frames.len() as i64,
            "total {total_cs} vs elapsed {elapsed_cs}"
        );
    }

    #[test_log::test]
    fn every_emitted_frame_has_positive_delay() {
        let records = vec![
            record(0, 0, b"a"),
            record(0, 1, b"b"),
            record(0, 2, b"c"),
        ];
        let sink = run(records, 5);
        assert!(sink.delays().iter().all(|&d| d >= 1));
    }

    #[test_log::test]
    fn hold_frame_repeats_the_last_index_buffer() {
        let sink = run(vec![record(0, 0, b"zz")], 300);
        assert_eq!(sink.frames.len(), 2);
        assert_eq!(sink.frames[0].1, sink.frames[1].1);
    }

    #[test_log::test]
    fn out_of_order_timestamps_do_not_underflow() {
        let records = vec![record(10, 0, b"a"), record(5, 0, b"b"), record(11, 0, b"c")];
        let sink = run(records, 0);
        assert!(sink.delays().iter().all(|&d| d >= 1));
    }

    #[test_log::test]
    fn timer_rounds_to_nearest_unit() {
        let mut timer = FrameTimer::new();
        timer.accrue(0, 0);
        timer.accrue(0, 14_999);
        assert_eq!(timer.take_delay_cs(), 2);
        timer.accrue(0, 30_000);
        assert_eq!(timer.take_delay_cs(), 3);
        // Pending time resets after each take.
        assert_eq!(timer.take_delay_cs(), 1);
    }
}
