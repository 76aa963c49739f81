// src/record.rs

//! Reader for the ttyrec recording format.
//!
//! A recording is a sequence of records, each a 12-byte header of three
//! little-endian `i32` values (seconds, microseconds, payload length)
//! followed by that many payload bytes. Recordings are routinely truncated
//! mid-record (interrupted sessions), so any short read ends the stream
//! cleanly rather than raising an error.

use log::{debug, warn};
use std::io::{ErrorKind, Read};

const HEADER_LEN: usize = 12;

/// Upper bound on a single record payload. Declared lengths beyond this are
/// treated as stream corruption, so a hostile header cannot drive an
/// arbitrarily large allocation.
pub const MAX_PAYLOAD_LEN: i32 = 1 << 20;

/// One timestamped chunk of terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub seconds: i32,
    pub microseconds: i32,
    pub payload: Vec<u8>,
}

/// Iterator over the records of a ttyrec stream. Yields fully formed records
/// until EOF, truncation, or a malformed header, whichever comes first.
#[derive(Debug)]
pub struct RecordReader<R> {
    input: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(input: R) -> Self {
        RecordReader { input, done: false }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done {
            return None;
        }
        let mut header = [0u8; HEADER_LEN];
        if !read_full(&mut self.input, &mut header) {
            self.done = true;
            return None;
        }
        let seconds = le_i32(&header[0..4]);
        let microseconds = le_i32(&header[4..8]);
        let length = le_i32(&header[8..12]);
        if length <= 0 || length > MAX_PAYLOAD_LEN {
            warn!("record with invalid payload length {length}; treating as end of stream");
            self.done = true;
            return None;
        }
        let mut payload = vec![0u8; length as usize];
        if !read_full(&mut self.input, &mut payload) {
            debug!("stream truncated inside a {length}-byte payload");
            self.done = true;
            return None;
        }
        Some(Record {
            seconds,
            microseconds,
            payload,
        })
    }
}

fn le_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Fills `buf` completely. Returns false on EOF or I/O error before the
/// buffer is full; both mean the recording ends here.
fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> bool {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => return false,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("read error in recording stream: {e}");
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(seconds: i32, microseconds: i32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&seconds.to_le_bytes());
        out.extend_from_slice(&microseconds.to_le_bytes());
        out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn read_all(bytes: Vec<u8>) -> Vec<Record> {
        RecordReader::new(Cursor::new(bytes)).collect()
    }

    #[test]
    fn reads_consecutive_records() {
        let mut bytes = encode(1, 500_000, b"hello");
        bytes.extend(encode(2, 0, b"world"));
        let records = read_all(bytes);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seconds, 1);
        assert_eq!(records[0].microseconds, 500_000);
        assert_eq!(records[0].payload, b"hello");
        assert_eq!(records[1].payload, b"world");
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert!(read_all(Vec::new()).is_empty());
    }

    #[test]
    fn truncation_yields_only_complete_records() {
        let full = {
            let mut b = encode(0, 0, b"one");
            b.extend(encode(1, 0, b"two"));
            b
        };
        // Cutting anywhere inside the second record leaves exactly one record.
        let first_len = encode(0, 0, b"one").len();
        for cut in first_len..full.len() {
            let records = read_all(full[..cut].to_vec());
            assert_eq!(records.len(), 1, "cut at {cut}");
            assert_eq!(records[0].payload, b"one");
        }
        // Cutting inside the first record leaves none.
        for cut in 0..first_len {
            assert!(read_all(full[..cut].to_vec()).is_empty(), "cut at {cut}");
        }
    }

    #[test]
    fn zero_or_negative_length_ends_stream() {
        for length in [0i32, -1, i32::MIN] {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&3i32.to_le_bytes());
            bytes.extend_from_slice(&0i32.to_le_bytes());
            bytes.extend_from_slice(&length.to_le_bytes());
            bytes.extend(encode(4, 0, b"after"));
            assert!(read_all(bytes).is_empty(), "length {length}");
        }
    }

    #[test]
    fn oversized_declared_length_is_treated_as_truncation() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&(MAX_PAYLOAD_LEN + 1).to_le_bytes());
        assert!(read_all(bytes).is_empty());
    }

    #[test]
    fn stops_at_first_bad_header_even_with_more_data() {
        let mut bytes = encode(0, 0, b"ok");
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&(-5i32).to_le_bytes());
        bytes.extend(encode(9, 0, b"unreachable"));
        let records = read_all(bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"ok");
    }
}
