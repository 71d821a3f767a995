//! Frame codec - pure encode/decode between payloads and tagged frames.
//!
//! Encoding validates every input against its documented domain before
//! producing bytes and returns a freshly allocated frame per call. Decoding
//! requires the payload slice length to exactly match the tag's fixed size;
//! a mismatch is an internal-consistency error, since the stream decoder
//! only ever routes exact-length slices here.
//!
//! # Example
//!
//! ```
//! use dronewire::{codec, Control, Payload, Tag};
//!
//! let frame = codec::encode(&Payload::Control(Control {
//!     attitude: [0.0, 0.0, 0.0, 1.0],
//! }))
//! .unwrap();
//! assert_eq!(frame.len(), 9);
//! assert_eq!(frame[0], Tag::Control as u8);
//!
//! let decoded = codec::decode(Tag::Control, &frame[1..]).unwrap();
//! assert_eq!(decoded, Payload::Control(Control { attitude: [0.0, 0.0, 0.0, 1.0] }));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

use super::payload::{Control, Payload, State, Temperatures};
use super::wire_format::{
    pack_attitude, pack_fraction, pack_load, unpack_attitude, unpack_fraction, unpack_load, Tag,
    CONTROL_FRAME_SIZE, CONTROL_PAYLOAD_SIZE, STATE_FRAME_SIZE, STATE_PAYLOAD_SIZE,
};

/// Encode a payload into a complete tagged frame.
pub fn encode(payload: &Payload) -> Result<Bytes> {
    match payload {
        Payload::State(state) => encode_state(state),
        Payload::Control(control) => encode_control(control),
    }
}

/// Encode a state payload into a 16-byte frame.
pub fn encode_state(state: &State) -> Result<Bytes> {
    state.validate()?;

    let mut buf = BytesMut::with_capacity(STATE_FRAME_SIZE);
    buf.put_u8(Tag::State as u8);
    for &q in &state.attitude {
        buf.put_i16(pack_attitude(q));
    }
    buf.put_i8(state.temperatures.inside);
    buf.put_i8(state.temperatures.outside);
    for &l in &state.load {
        buf.put_u8(pack_load(l));
    }
    buf.put_u8(pack_fraction(state.memory));
    buf.put_u8(pack_fraction(state.cpu));

    debug_assert_eq!(buf.len(), STATE_FRAME_SIZE);
    Ok(buf.freeze())
}

/// Encode a control payload into a 9-byte frame.
pub fn encode_control(control: &Control) -> Result<Bytes> {
    control.validate()?;

    let mut buf = BytesMut::with_capacity(CONTROL_FRAME_SIZE);
    buf.put_u8(Tag::Control as u8);
    for &q in &control.attitude {
        buf.put_i16(pack_attitude(q));
    }

    debug_assert_eq!(buf.len(), CONTROL_FRAME_SIZE);
    Ok(buf.freeze())
}

/// Decode the payload bytes of a frame with the given tag.
///
/// `data` is the frame without its tag byte and must be exactly the tag's
/// payload size.
pub fn decode(tag: Tag, data: &[u8]) -> Result<Payload> {
    match tag {
        Tag::State => decode_state(data).map(Payload::State),
        Tag::Control => decode_control(data).map(Payload::Control),
    }
}

/// Decode a 15-byte state payload.
pub fn decode_state(data: &[u8]) -> Result<State> {
    if data.len() != STATE_PAYLOAD_SIZE {
        return Err(WireError::MalformedFrame(format!(
            "state payload is {} bytes, expected {STATE_PAYLOAD_SIZE}",
            data.len()
        )));
    }

    Ok(State {
        attitude: decode_attitude(&data[..8]),
        temperatures: Temperatures {
            inside: data[8] as i8,
            outside: data[9] as i8,
        },
        load: [
            unpack_load(data[10]),
            unpack_load(data[11]),
            unpack_load(data[12]),
        ],
        memory: unpack_fraction(data[13]),
        cpu: unpack_fraction(data[14]),
    })
}

/// Decode an 8-byte control payload.
pub fn decode_control(data: &[u8]) -> Result<Control> {
    if data.len() != CONTROL_PAYLOAD_SIZE {
        return Err(WireError::MalformedFrame(format!(
            "control payload is {} bytes, expected {CONTROL_PAYLOAD_SIZE}",
            data.len()
        )));
    }

    Ok(Control {
        attitude: decode_attitude(data),
    })
}

fn decode_attitude(data: &[u8]) -> [f64; 4] {
    let mut attitude = [0.0; 4];
    for (i, comp) in attitude.iter_mut().enumerate() {
        let raw = i16::from_be_bytes([data[i * 2], data[i * 2 + 1]]);
        *comp = unpack_attitude(raw);
    }
    attitude
}
