/*!
    Media output for the ffmpeg crate ecosystem.

    This crate handles the output side of the encode pipeline. It takes
    encoded packets from the encoder and appends their bytes, in the order
    received, to a binary sink. For H.264 that produces a raw Annex B
    elementary stream (`.h264`) that players and `ffprobe` read directly.
*/

mod sink;

pub use sink::Sink;
