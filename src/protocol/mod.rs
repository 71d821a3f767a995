//! Protocol module - wire format, payload types, codec, and stream decoder.
//!
//! This module implements the binary telemetry protocol:
//! - Tag byte and fixed frame sizes ([`wire_format`])
//! - Typed [`State`] / [`Control`] payloads
//! - Pure encode/decode between payloads and tagged frames ([`codec`])
//! - [`stream::StreamDecoder`] for reassembling frames from chunked reads

pub mod codec;
pub mod stream;
mod payload;
mod wire_format;

pub use payload::{Control, Payload, State, Temperatures};
pub use wire_format::{
    Tag, CONTROL_FRAME_SIZE, CONTROL_PAYLOAD_SIZE, MAX_FRAME_SIZE, STATE_FRAME_SIZE,
    STATE_PAYLOAD_SIZE,
};
