//! Stream decoder - reassembles frames from arbitrarily chunked reads.
//!
//! Transports deliver byte chunks at whatever boundaries the socket layer
//! produces. [`StreamDecoder`] concatenates them with its carry-over
//! buffer, decodes every complete frame, and keeps at most one incomplete
//! frame (under 16 bytes) for the next chunk.
//!
//! Resynchronization is by drop: if the leading byte of the working buffer
//! is not a recognized tag, the whole buffer is discarded silently. The
//! decoder never scans for a tag at a later offset, so a missed frame can
//! take a following partial frame with it. That is the accepted cost on a
//! best-effort telemetry channel; no malformed-frame error ever reaches
//! the consumer.
//!
//! # Example
//!
//! ```
//! use dronewire::{codec, Control, Payload, StreamDecoder};
//!
//! let frame = codec::encode(&Payload::Control(Control {
//!     attitude: [0.0, 0.0, 0.0, 1.0],
//! }))
//! .unwrap();
//!
//! let mut decoder = StreamDecoder::new();
//! // Frame split across two reads.
//! assert!(decoder.push(&frame[..4]).unwrap().is_empty());
//! let payloads = decoder.push(&frame[4..]).unwrap();
//! assert_eq!(payloads.len(), 1);
//! ```

use bytes::BytesMut;
use tracing::debug;

use crate::error::Result;

use super::codec;
use super::payload::Payload;
use super::wire_format::{Tag, MAX_FRAME_SIZE};

/// Buffer for accumulating incoming bytes and extracting decoded payloads.
///
/// Owned exclusively by one reader; chunk delivery must be serialized.
#[derive(Debug)]
pub struct StreamDecoder {
    /// Bytes carried over between pushes, at most one incomplete frame.
    carry: BytesMut,
}

impl StreamDecoder {
    /// Create a decoder with an empty carry-over buffer.
    pub fn new() -> Self {
        Self {
            carry: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Push a chunk and extract every payload it completes.
    ///
    /// Payloads are returned in wire order. A chunk may complete zero
    /// frames (partial data), one, or several (coalesced frames).
    /// Unparseable leading bytes discard the whole working buffer; the
    /// decoder is then ready for the next well-formed chunk.
    ///
    /// # Errors
    ///
    /// Only on an internal length-routing bug; tag-valid input never
    /// fails.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Payload>> {
        self.carry.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        loop {
            let Some(&lead) = self.carry.first() else {
                break;
            };
            let Some(tag) = Tag::from_byte(lead) else {
                // Resync-by-drop: no scanning for a later tag.
                debug!(
                    dropped = self.carry.len(),
                    lead, "unrecognized tag, dropping buffer"
                );
                self.carry.clear();
                break;
            };

            let frame_size = tag.frame_size();
            if self.carry.len() < frame_size {
                // Incomplete frame, wait for the next chunk.
                break;
            }

            let frame = self.carry.split_to(frame_size);
            payloads.push(codec::decode(tag, &frame[1..])?);
        }

        Ok(payloads)
    }

    /// Number of carried-over bytes awaiting more data.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Discard any carried-over bytes.
    pub fn clear(&mut self) {
        self.carry.clear();
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::payload::{Control, State, Temperatures};
    use crate::protocol::wire_format::{CONTROL_FRAME_SIZE, STATE_FRAME_SIZE};

    fn state_frame() -> Vec<u8> {
        codec::encode_state(&State {
            attitude: [0.5, -0.5, 0.25, -0.25],
            temperatures: Temperatures {
                inside: 30,
                outside: -5,
            },
            load: [0.5, 1.0, 1.5],
            memory: 0.5,
            cpu: 0.25,
        })
        .unwrap()
        .to_vec()
    }

    fn control_frame() -> Vec<u8> {
        codec::encode_control(&Control {
            attitude: [0.25, -0.25, 0.5, -1.0],
        })
        .unwrap()
        .to_vec()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut decoder = StreamDecoder::new();
        let payloads = decoder.push(&state_frame()).unwrap();

        assert_eq!(payloads.len(), 1);
        assert!(matches!(payloads[0], Payload::State(_)));
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_fragmentation_invariance() {
        // Splitting a state frame at every possible byte offset must yield
        // exactly the same single payload as the unsplit frame.
        let frame = state_frame();
        let mut whole = StreamDecoder::new();
        let expected = whole.push(&frame).unwrap();
        assert_eq!(expected.len(), 1);

        for split in 1..STATE_FRAME_SIZE {
            let mut decoder = StreamDecoder::new();
            let first = decoder.push(&frame[..split]).unwrap();
            assert!(first.is_empty(), "split at {split} decoded early");
            assert_eq!(decoder.pending(), split);

            let second = decoder.push(&frame[split..]).unwrap();
            assert_eq!(second.len(), 1, "split at {split}");
            assert_eq!(second[0], expected[0]);
            assert_eq!(decoder.pending(), 0);
        }
    }

    #[test]
    fn test_multi_frame_coalescing() {
        // One chunk holding a control frame then a state frame yields both
        // payloads, in wire order, from a single push.
        let mut chunk = control_frame();
        chunk.extend_from_slice(&state_frame());
        assert_eq!(chunk.len(), CONTROL_FRAME_SIZE + STATE_FRAME_SIZE);

        let mut decoder = StreamDecoder::new();
        let payloads = decoder.push(&chunk).unwrap();

        assert_eq!(payloads.len(), 2);
        assert!(matches!(payloads[0], Payload::Control(_)));
        assert!(matches!(payloads[1], Payload::State(_)));
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = StreamDecoder::new();
        let mut all = Vec::new();

        for &byte in &control_frame() {
            all.extend(decoder.push(&[byte]).unwrap());
        }

        assert_eq!(all.len(), 1);
        assert!(matches!(all[0], Payload::Control(_)));
    }

    #[test]
    fn test_resync_by_drop() {
        let mut decoder = StreamDecoder::new();

        // Unrecognized leading tag: zero payloads, buffer dropped.
        let garbage = [0xFFu8, 0x01, 0x02, 0x03];
        assert!(decoder.push(&garbage).unwrap().is_empty());
        assert_eq!(decoder.pending(), 0);

        // The next well-formed chunk parses normally.
        let payloads = decoder.push(&state_frame()).unwrap();
        assert_eq!(payloads.len(), 1);
    }

    #[test]
    fn test_garbage_after_complete_frame_is_dropped() {
        let mut chunk = control_frame();
        chunk.extend_from_slice(&[0xAB, 0xCD]);

        let mut decoder = StreamDecoder::new();
        let payloads = decoder.push(&chunk).unwrap();

        // The valid leading frame survives; the trailing junk does not.
        assert_eq!(payloads.len(), 1);
        assert_eq!(decoder.pending(), 0);

        let again = decoder.push(&state_frame()).unwrap();
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_exactly_frame_length_decodes_immediately() {
        let frame = control_frame();
        let mut decoder = StreamDecoder::new();

        // First push leaves a partial frame pending.
        assert!(decoder.push(&frame[..3]).unwrap().is_empty());
        // Second push brings the buffer to exactly the frame length.
        let payloads = decoder.push(&frame[3..]).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_carry_over_bounded_by_one_frame() {
        let mut decoder = StreamDecoder::new();
        let mut stream = state_frame();
        stream.extend_from_slice(&state_frame());
        stream.extend_from_slice(&control_frame());

        // Feed in awkward 7-byte chunks; pending never reaches a full
        // state frame.
        let mut total = 0;
        for chunk in stream.chunks(7) {
            total += decoder.push(chunk).unwrap().len();
            assert!(decoder.pending() < STATE_FRAME_SIZE);
        }
        assert_eq!(total, 3);
    }

    #[test]
    fn test_clear_resets_carry() {
        let mut decoder = StreamDecoder::new();
        decoder.push(&state_frame()[..5]).unwrap();
        assert_eq!(decoder.pending(), 5);

        decoder.clear();
        assert_eq!(decoder.pending(), 0);

        let payloads = decoder.push(&control_frame()).unwrap();
        assert_eq!(payloads.len(), 1);
    }
}
