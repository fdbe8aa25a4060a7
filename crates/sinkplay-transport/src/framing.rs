//! Newline framing for the SyncPlay byte stream.
//!
//! SyncPlay servers are built on a line receiver: every JSON message is
//! terminated by `\n`, and there is no length prefix. TCP hands us an
//! arbitrary chunking of that stream, so we buffer until a delimiter shows
//! up and then cut one frame per `\n`.
//!
//! [`LineFrameCodec`] plugs into `tokio_util::codec::FramedRead`, which owns
//! the carry-over buffer (`BytesMut`) and calls [`Decoder::decode`] every
//! time new bytes arrive.
//!
//! ```text
//!  chunk 1: {"Hello":{...}}\n{"Sta      chunk 2: te":{...}}\r\n
//!           └──── frame 1 ────┘└──── buffered ───┘ └─ frame 2 ─┘
//! ```
//!
//! Only `\n` is a delimiter. A `\r` right before it stays in the frame;
//! the JSON parser treats it as trailing whitespace.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::TransportError;

/// Default cap on a partial (not yet delimited) frame: 1 MiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

const DELIMITER: u8 = b'\n';

/// Splits an incoming byte stream into `\n`-terminated frames.
///
/// The emitted frames exclude the delimiter. The codec is restartable per
/// connection: create a fresh one for every socket.
#[derive(Debug, Clone)]
pub struct LineFrameCodec {
    /// Upper bound on buffered bytes without a delimiter.
    max_frame_len: usize,

    /// Where to resume scanning for `\n`. Bytes before this index were
    /// already searched on a previous call, so a long frame that trickles
    /// in over many reads is scanned once, not quadratically.
    next_index: usize,
}

impl LineFrameCodec {
    /// Creates a codec with the [`DEFAULT_MAX_FRAME_LEN`] limit.
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Creates a codec that rejects partial frames longer than
    /// `max_frame_len` bytes.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            max_frame_len,
            next_index: 0,
        }
    }

    /// Returns the configured partial-frame limit.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for LineFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineFrameCodec {
    type Item = Vec<u8>;
    type Error = TransportError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        let scan_from = self.next_index.min(src.len());
        let found = src[scan_from..]
            .iter()
            .position(|b| *b == DELIMITER);

        match found {
            Some(offset) => {
                let end = scan_from + offset;
                self.next_index = 0;
                // `split_to` hands back the front of the buffer (frame and
                // delimiter) and leaves the rest in `src` for the next call.
                let mut frame = src.split_to(end + 1);
                frame.truncate(end);
                Ok(Some(frame.to_vec()))
            }
            None if src.len() > self.max_frame_len => {
                Err(TransportError::FrameTooLarge {
                    limit: self.max_frame_len,
                })
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        // An unterminated tail at EOF is not a frame.
        if !src.is_empty() {
            tracing::debug!(
                bytes = src.len(),
                "discarding partial frame at end of stream"
            );
            src.clear();
        }
        self.next_index = 0;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds `chunks` through a codec one at a time, collecting every
    /// frame it emits along the way.
    fn decode_chunks(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
        let mut codec = LineFrameCodec::new();
        let mut buf = BytesMut::new();
        let mut frames = Vec::new();
        for chunk in chunks {
            buf.extend_from_slice(chunk);
            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                frames.push(frame);
            }
        }
        frames
    }

    #[test]
    fn test_decode_single_frame_strips_newline() {
        let frames = decode_chunks(&[b"{\"a\":1}\n"]);
        assert_eq!(frames, vec![b"{\"a\":1}".to_vec()]);
    }

    #[test]
    fn test_decode_keeps_carriage_return_in_payload() {
        let frames = decode_chunks(&[b"abc\r\n"]);
        assert_eq!(frames, vec![b"abc\r".to_vec()]);
    }

    #[test]
    fn test_decode_multiple_frames_in_one_chunk() {
        let frames = decode_chunks(&[b"one\ntwo\nthree\n"]);
        assert_eq!(
            frames,
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
    }

    #[test]
    fn test_decode_frame_split_across_chunks() {
        let frames = decode_chunks(&[b"hel", b"lo wor", b"ld\nnext"]);
        assert_eq!(frames, vec![b"hello world".to_vec()]);
    }

    #[test]
    fn test_decode_partial_frame_waits_for_delimiter() {
        let mut codec = LineFrameCodec::new();
        let mut buf = BytesMut::from(&b"no newline yet"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 14, "partial data must stay buffered");
    }

    #[test]
    fn test_decode_empty_line_yields_empty_frame() {
        let frames = decode_chunks(&[b"\n\n"]);
        assert_eq!(frames, vec![Vec::new(), Vec::new()]);
    }

    #[test]
    fn test_decode_oversized_partial_frame_errors() {
        let mut codec = LineFrameCodec::with_max_frame_len(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        let result = codec.decode(&mut buf);
        assert!(matches!(
            result,
            Err(TransportError::FrameTooLarge { limit: 8 })
        ));
    }

    #[test]
    fn test_decode_long_frame_with_delimiter_within_chunk_is_accepted() {
        // The limit guards buffering, not completed frames.
        let mut codec = LineFrameCodec::with_max_frame_len(4);
        let mut buf = BytesMut::from(&b"abcdefgh\n"[..]);
        let frame = codec.decode(&mut buf).unwrap();
        assert_eq!(frame, Some(b"abcdefgh".to_vec()));
    }

    #[test]
    fn test_decode_eof_discards_unterminated_tail() {
        let mut codec = LineFrameCodec::new();
        let mut buf = BytesMut::from(&b"done\npartial"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some(b"done".to_vec()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_max_frame_len_default() {
        assert_eq!(LineFrameCodec::default().max_frame_len(), 1024 * 1024);
    }
}
