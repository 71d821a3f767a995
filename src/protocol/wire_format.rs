//! Wire format constants and scalar mappings.
//!
//! Frames are one tag byte followed by a fixed-size payload. Network byte
//! order (big-endian) is used for all multi-byte fields.
//!
//! ```text
//! State frame (16 bytes):
//! ┌─────┬─────┬─────┬─────┬─────┬────┬────┬────┬────┬────┬───┬───┐
//! │ tag │ q'₀ │ q'₁ │ q'₂ │ q'₃ │ tᵢ │ tₒ │ l₁ │ l₅ │l₁₅ │ m │ c │
//! │  1  │  2  │  2  │  2  │  2  │ 1  │ 1  │ 1  │ 1  │ 1  │ 1 │ 1 │
//! └─────┴─────┴─────┴─────┴─────┴────┴────┴────┴────┴────┴───┴───┘
//!
//! Control frame (9 bytes):
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │ tag │ q'₀ │ q'₁ │ q'₂ │ q'₃ │
//! └─────┴─────┴─────┴─────┴─────┘
//! ```
//!
//! Attitude components are signed 16-bit fixed point, `q' = trunc(q·10⁴)`
//! (floor for positive, ceil for negative). Load averages saturate at
//! `min(l·100, 255)`. Memory/CPU fractions are `trunc(v·100)`.

/// State payload size in bytes (without the tag).
pub const STATE_PAYLOAD_SIZE: usize = 15;

/// Control payload size in bytes (without the tag).
pub const CONTROL_PAYLOAD_SIZE: usize = 8;

/// Full state frame size, tag included.
pub const STATE_FRAME_SIZE: usize = STATE_PAYLOAD_SIZE + 1;

/// Full control frame size, tag included.
pub const CONTROL_FRAME_SIZE: usize = CONTROL_PAYLOAD_SIZE + 1;

/// Largest frame the protocol can produce. The stream decoder's carry-over
/// buffer never holds more than one incomplete frame, so it stays below
/// this bound.
pub const MAX_FRAME_SIZE: usize = STATE_FRAME_SIZE;

/// Fixed-point scale for attitude components (resolution 1e-4).
const ATTITUDE_SCALE: f64 = 1e4;

/// Scale for load averages and memory/cpu fractions.
const PERCENT_SCALE: f64 = 100.0;

/// Frame tag byte, identifying payload kind and therefore frame length.
///
/// This is a closed set: any other leading byte is unparseable data and
/// causes the stream decoder to resynchronize by dropping its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// Telemetry state frame (attitude, temperatures, load, memory, cpu).
    State = 0,
    /// Control frame (attitude only).
    Control = 1,
}

impl Tag {
    /// Parse a tag byte. Returns `None` for unrecognized values.
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Tag::State),
            1 => Some(Tag::Control),
            _ => None,
        }
    }

    /// Payload size in bytes for this tag (without the tag byte).
    #[inline]
    pub fn payload_size(self) -> usize {
        match self {
            Tag::State => STATE_PAYLOAD_SIZE,
            Tag::Control => CONTROL_PAYLOAD_SIZE,
        }
    }

    /// Full frame size for this tag, tag byte included.
    #[inline]
    pub fn frame_size(self) -> usize {
        self.payload_size() + 1
    }
}

/// Map an attitude component in [-1, 1] to 16-bit signed fixed point.
///
/// Truncates toward zero, so positive values floor and negative values
/// ceil. Representable range is ±3.2767; callers validate the domain.
#[inline]
pub(crate) fn pack_attitude(q: f64) -> i16 {
    (q * ATTITUDE_SCALE) as i16
}

/// Reverse of [`pack_attitude`].
#[inline]
pub(crate) fn unpack_attitude(raw: i16) -> f64 {
    f64::from(raw) / ATTITUDE_SCALE
}

/// Map a load average (≥ 0) to a byte, saturating at 255.
///
/// Lossy above 2.55 by design; the clamp is intentional, not an error.
#[inline]
pub(crate) fn pack_load(load: f64) -> u8 {
    (load * PERCENT_SCALE).min(255.0) as u8
}

/// Reverse of [`pack_load`] (up to the saturation).
#[inline]
pub(crate) fn unpack_load(raw: u8) -> f64 {
    f64::from(raw) / PERCENT_SCALE
}

/// Map a fraction in [0, 1] to a truncated percentage byte.
#[inline]
pub(crate) fn pack_fraction(value: f64) -> u8 {
    (value * PERCENT_SCALE) as u8
}

/// Reverse of [`pack_fraction`].
#[inline]
pub(crate) fn unpack_fraction(raw: u8) -> f64 {
    f64::from(raw) / PERCENT_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_byte() {
        assert_eq!(Tag::from_byte(0), Some(Tag::State));
        assert_eq!(Tag::from_byte(1), Some(Tag::Control));
        assert_eq!(Tag::from_byte(2), None);
        assert_eq!(Tag::from_byte(0xFF), None);
    }

    #[test]
    fn test_frame_sizes() {
        assert_eq!(Tag::State.frame_size(), 16);
        assert_eq!(Tag::Control.frame_size(), 9);
        assert_eq!(MAX_FRAME_SIZE, 16);
    }

    #[test]
    fn test_pack_attitude_truncates_toward_zero() {
        // Floor for positive values.
        assert_eq!(pack_attitude(0.70716), 7071);
        // Ceil for negative values.
        assert_eq!(pack_attitude(-0.70716), -7071);
        assert_eq!(pack_attitude(1.0), 10000);
        assert_eq!(pack_attitude(-1.0), -10000);
        assert_eq!(pack_attitude(0.0), 0);
    }

    #[test]
    fn test_attitude_roundtrip_resolution() {
        for &q in &[-1.0, -0.5, -0.1234, 0.0, 0.1234, 0.5, 1.0] {
            let back = unpack_attitude(pack_attitude(q));
            assert!((back - q).abs() < 1e-4, "q={q} back={back}");
        }
    }

    #[test]
    fn test_pack_load_saturates() {
        assert_eq!(pack_load(0.0), 0);
        assert_eq!(pack_load(1.25), 125);
        assert_eq!(pack_load(2.55), 255);
        assert_eq!(pack_load(5.0), 255);
        assert_eq!(pack_load(1000.0), 255);
    }

    #[test]
    fn test_pack_fraction() {
        assert_eq!(pack_fraction(0.0), 0);
        assert_eq!(pack_fraction(0.25), 25);
        assert_eq!(pack_fraction(1.0), 100);
    }
}
