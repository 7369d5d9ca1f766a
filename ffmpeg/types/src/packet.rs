/*!
    Compressed packet type.
*/

use crate::{Pts, Rational};

/**
    An encoded packet received from the encoder.

    Owns its bytes; the FFmpeg packet they were copied from has already
    been released.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Compressed bytes (one or more access units).
    pub data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: Option<Pts>,
    /// Decode timestamp.
    pub dts: Option<Pts>,
    /// Time base for `pts` and `dts`.
    pub time_base: Rational,
    /// Whether the packet starts with a keyframe.
    pub is_keyframe: bool,
}

impl Packet {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
