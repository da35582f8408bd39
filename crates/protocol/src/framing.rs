//! Frame reader - splits a byte stream into `\n`-delimited frames.
//!
//! Reads off a socket arrive in arbitrary pieces: a delimiter may be split
//! across reads, one read may hold several frames. The reader keeps the
//! trailing partial frame until its delimiter shows up.

use crate::error::FrameError;
use crate::types::DEFAULT_MAX_FRAME_BYTES;

/// Accumulates raw bytes and yields complete, trimmed, non-blank frames.
#[derive(Debug)]
pub struct FrameReader {
    buf: Vec<u8>,
    /// Start of the next unconsumed frame in `buf`.
    start: usize,
    /// Bytes before this offset are known to contain no delimiter.
    scanned: usize,
    max_frame_len: usize,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameReader {
    /// `max_frame_len` bounds the bytes buffered without a delimiter.
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(4096),
            start: 0,
            scanned: 0,
            max_frame_len: max_frame_len.max(1),
        }
    }

    /// Append bytes read from the transport.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.start > 0 && self.start == self.buf.len() {
            self.buf.clear();
            self.start = 0;
            self.scanned = 0;
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame, skipping blank ones.
    ///
    /// Returns `Ok(None)` when only a partial frame (or nothing) is buffered,
    /// and `Err(FrameError::Oversized)` once the partial frame outgrows the cap.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        loop {
            let from = self.scanned.max(self.start);
            let Some(offset) = self.buf[from..].iter().position(|&b| b == b'\n') else {
                self.scanned = self.buf.len();
                let pending = self.buf.len() - self.start;
                if pending > self.max_frame_len {
                    return Err(FrameError::Oversized {
                        limit: self.max_frame_len,
                    });
                }
                self.compact();
                return Ok(None);
            };

            let end = from + offset;
            let frame = trim_ascii(&self.buf[self.start..end]);
            let frame = (!frame.is_empty()).then(|| frame.to_vec());
            self.start = end + 1;
            self.scanned = self.start;

            if frame.is_some() {
                return Ok(frame);
            }
        }
    }

    /// Push `bytes` and collect every frame completed by them.
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_tictactoe_protocol::FrameReader;
    ///
    /// let mut reader = FrameReader::default();
    /// assert!(reader.feed(b"{\"action\":").unwrap().is_empty());
    /// let frames = reader.feed(b"\"draw\"}\n\n  \n{\"a").unwrap();
    /// assert_eq!(frames, vec![b"{\"action\":\"draw\"}".to_vec()]);
    /// assert_eq!(reader.buffered(), 3);
    /// ```
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Vec<u8>>, FrameError> {
        self.push(bytes);
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Bytes of the trailing partial frame.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.start
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.start = 0;
        self.scanned = 0;
    }

    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.buf.drain(..self.start);
        self.scanned -= self.start;
        self.start = 0;
    }
}

fn trim_ascii(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_split_across_reads() {
        let mut reader = FrameReader::default();
        assert!(reader.feed(b"{\"action\":\"draw\"}").unwrap().is_empty());
        let frames = reader.feed(b"\n").unwrap();
        assert_eq!(frames, vec![b"{\"action\":\"draw\"}".to_vec()]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_multiple_frames_in_one_read() {
        let mut reader = FrameReader::default();
        let frames = reader.feed(b"a\nb\r\nc\n").unwrap();
        assert_eq!(frames, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_blank_frames_are_discarded() {
        let mut reader = FrameReader::default();
        let frames = reader.feed(b"\n \n\t\r\nx\n\n").unwrap();
        assert_eq!(frames, vec![b"x".to_vec()]);
    }

    #[test]
    fn test_partial_frame_retained() {
        let mut reader = FrameReader::default();
        let frames = reader.feed(b"one\ntw").unwrap();
        assert_eq!(frames, vec![b"one".to_vec()]);
        assert_eq!(reader.buffered(), 2);
        let frames = reader.feed(b"o\n").unwrap();
        assert_eq!(frames, vec![b"two".to_vec()]);
    }

    #[test]
    fn test_oversized_partial_frame_is_rejected() {
        let mut reader = FrameReader::new(8);
        assert!(reader.feed(b"12345678").unwrap().is_empty());
        let err = reader.feed(b"9").unwrap_err();
        assert_eq!(err, FrameError::Oversized { limit: 8 });
    }

    #[test]
    fn test_cap_applies_to_partial_frame_only() {
        let mut reader = FrameReader::new(8);
        // Complete frames longer than the remainder do not trip the cap.
        let frames = reader.feed(b"1234567\nabc").unwrap();
        assert_eq!(frames, vec![b"1234567".to_vec()]);
        assert_eq!(reader.buffered(), 3);
    }
}
