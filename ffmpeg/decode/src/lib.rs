/*!
    Media decoding for the ffmpeg crate ecosystem.

    This crate transforms encoded packets back into raw planar frames. The
    encode smoke test uses it as an oracle: decode what was just encoded and
    compare the pixels with what went in.
*/

pub use ffmpeg_types::{CodecId, Error, Packet, PixelFormat, Plane, Pts, Result};

mod frame;
mod video;

pub use frame::DecodedFrame;
pub use video::VideoDecoder;
