/*!
    Media encoding for the ffmpeg crate ecosystem.

    This crate transforms raw frames into compressed packets. It wraps an
    FFmpeg encoder context in an owned handle that follows FFmpeg's
    send/receive protocol: submit a frame, drain whatever packets are ready,
    and at end of stream flush and drain again.

    # Video Encoding

    ```ignore
    use ffmpeg_encode::{EncoderPreset, VideoEncoder, VideoEncoderConfig};
    use ffmpeg_types::{PixelFormat, Pts, Rational};

    let config = VideoEncoderConfig::configure(
        640,
        480,
        400_000,
        Rational::new(25, 1),
        10,
        1,
        PixelFormat::Yuv420p,
        Some(EncoderPreset::Ultrafast),
    )?;

    let mut encoder = VideoEncoder::open(config)?;
    let mut frame = encoder.prepare_frame()?;
    frame.fill_solid_color(128, 64, 192)?;

    encoder.submit(&mut frame, Pts(0))?;
    for packet in encoder.drain() {
        let packet = packet?;
        // Write packet.data
    }

    // Mandatory: frames buffered for B-frame reordering only come out here
    encoder.flush()?;
    for packet in encoder.drain() {
        let packet = packet?;
        // Write packet.data
    }

    encoder.close();
    ```

    # Presets

    Encoder presets trade speed for compression efficiency:

    - `Ultrafast`: Fastest, largest files
    - `Fast`: Good for real-time
    - `Medium`: Default balance
    - `Slow`/`Veryslow`: Best compression, slowest

    The preset is passed to the encoder as its private `preset` option, so
    it only applies to encoders that understand it (libx264, libx265).

    # Frame Requirements

    Frames come from [`VideoEncoder::prepare_frame`], which allocates planes
    matching the configured format and dimensions. Only planar YUV formats
    are supported.
*/

pub use ffmpeg_types::{CodecId, Error, Packet, PixelFormat, Plane, Pts, Rational, Result};

mod config;
mod convert;
mod frame;
mod video;

pub use config::{EncoderPreset, VideoEncoderConfig};
pub use frame::{FRAME_ALIGN, FrameBuffer};
pub use video::{Drain, VideoEncoder};
