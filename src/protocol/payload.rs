//! Typed payloads carried by the protocol.

use crate::error::{Result, WireError};

use super::wire_format::Tag;

/// Board and enclosure temperatures in whole degrees Celsius.
///
/// The wire carries each as one signed byte, so the `[-128, 127]` domain is
/// enforced by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Temperatures {
    /// Temperature inside the enclosure.
    pub inside: i8,
    /// Temperature outside the enclosure.
    pub outside: i8,
}

/// Periodic telemetry state produced by the vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Unit quaternion components, each in `[-1, 1]`.
    pub attitude: [f64; 4],
    /// Inside/outside temperatures in degrees.
    pub temperatures: Temperatures,
    /// 1/5/15-minute load averages, each ≥ 0. Values above 2.55 saturate
    /// on the wire.
    pub load: [f64; 3],
    /// Memory utilization fraction in `[0, 1]`.
    pub memory: f64,
    /// CPU utilization fraction in `[0, 1]`.
    pub cpu: f64,
}

/// Operator control command sent to the vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    /// Target attitude quaternion components, each in `[-1, 1]`.
    pub attitude: [f64; 4],
}

/// A decoded protocol payload, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Telemetry state.
    State(State),
    /// Control command.
    Control(Control),
}

impl Payload {
    /// The wire tag for this payload.
    #[inline]
    pub fn tag(&self) -> Tag {
        match self {
            Payload::State(_) => Tag::State,
            Payload::Control(_) => Tag::Control,
        }
    }
}

fn check_attitude(attitude: &[f64; 4]) -> Result<()> {
    for (i, &q) in attitude.iter().enumerate() {
        if !(-1.0..=1.0).contains(&q) || q.is_nan() {
            return Err(WireError::Validation(format!(
                "attitude[{i}] = {q} outside [-1, 1]"
            )));
        }
    }
    Ok(())
}

impl State {
    /// Check every field against its documented domain.
    ///
    /// Called by the encoder before any bytes are produced.
    pub fn validate(&self) -> Result<()> {
        check_attitude(&self.attitude)?;
        for (i, &l) in self.load.iter().enumerate() {
            if !(l >= 0.0) {
                return Err(WireError::Validation(format!("load[{i}] = {l} is negative")));
            }
        }
        if !(0.0..=1.0).contains(&self.memory) || self.memory.is_nan() {
            return Err(WireError::Validation(format!(
                "memory = {} outside [0, 1]",
                self.memory
            )));
        }
        if !(0.0..=1.0).contains(&self.cpu) || self.cpu.is_nan() {
            return Err(WireError::Validation(format!(
                "cpu = {} outside [0, 1]",
                self.cpu
            )));
        }
        Ok(())
    }
}

impl Control {
    /// Check the attitude against its documented domain.
    pub fn validate(&self) -> Result<()> {
        check_attitude(&self.attitude)
    }
}
