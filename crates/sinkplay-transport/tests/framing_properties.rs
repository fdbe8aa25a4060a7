//! Property tests for the newline frame splitter.
//!
//! The splitter must be transparent to how TCP happens to chunk the
//! stream: whatever the chunk boundaries, the frames are exactly what
//! splitting the concatenated bytes on `\n` would give.

use bytes::BytesMut;
use proptest::prelude::*;
use sinkplay_transport::LineFrameCodec;
use tokio_util::codec::Decoder;

/// Reference answer: split on `\n`, dropping the unterminated tail.
fn split_reference(stream: &[u8]) -> Vec<Vec<u8>> {
    let mut frames: Vec<Vec<u8>> =
        stream.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
    // The last piece never saw a delimiter.
    frames.pop();
    frames
}

/// Runs `stream` through a codec, cutting it at the given offsets.
fn split_with_codec(stream: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut codec = LineFrameCodec::new();
    let mut buf = BytesMut::new();
    let mut frames = Vec::new();

    let mut bounds: Vec<usize> =
        cuts.iter().map(|c| c % (stream.len() + 1)).collect();
    bounds.push(0);
    bounds.push(stream.len());
    bounds.sort_unstable();
    bounds.dedup();

    for window in bounds.windows(2) {
        buf.extend_from_slice(&stream[window[0]..window[1]]);
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            frames.push(frame);
        }
    }
    frames
}

/// Bytes biased towards delimiters so most cases contain several frames.
fn stream_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(b'\n'),
            1 => Just(b'\r'),
            12 => any::<u8>(),
        ],
        0..512,
    )
}

proptest! {
    #[test]
    fn prop_rechunking_is_transparent(
        stream in stream_strategy(),
        cuts in prop::collection::vec(any::<usize>(), 0..32),
    ) {
        prop_assert_eq!(
            split_with_codec(&stream, &cuts),
            split_reference(&stream)
        );
    }

    #[test]
    fn prop_byte_at_a_time_matches_whole_stream(stream in stream_strategy()) {
        let every_offset: Vec<usize> = (0..=stream.len()).collect();
        prop_assert_eq!(
            split_with_codec(&stream, &every_offset),
            split_with_codec(&stream, &[])
        );
    }
}
