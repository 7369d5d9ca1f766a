/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary of the ecosystem — the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.
*/

mod codec;
mod error;
mod format;
mod packet;
mod time;

pub use self::codec::CodecId;
pub use self::error::{Error, ParseError, Result};
pub use self::format::{PixelFormat, Plane};
pub use self::packet::Packet;
pub use self::time::{Pts, Rational};
