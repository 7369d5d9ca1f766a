/*!
    Video encoder implementation.
*/

use ffmpeg_next::{
    Dictionary,
    codec::{context::Context, encoder::video::Encoder as VideoEncoderFFmpeg},
    ffi,
};
use tracing::{debug, info};

use ffmpeg_types::{Error, Packet, Pts, Rational, Result};

use crate::config::VideoEncoderConfig;
use crate::convert::{codec_id_to_ffmpeg, pixel_format_to_ffmpeg, rational_to_ffmpeg};
use crate::frame::FrameBuffer;

/**
    Video encoder.

    Owns an opened FFmpeg encoder context. The context is freed exactly once,
    when the encoder is closed or dropped.
*/
pub struct VideoEncoder {
    encoder: VideoEncoderFFmpeg,
    config: VideoEncoderConfig,
    encoder_name: String,
    frames_submitted: u64,
    flushed: bool,
}

impl VideoEncoder {
    /**
        Find an encoder for the configured codec and open it.

        Fails with [`Error::CodecUnavailable`] if FFmpeg has no matching
        encoder, or [`Error::OpenFailed`] if the encoder rejects the
        configuration.
    */
    pub fn open(config: VideoEncoderConfig) -> Result<Self> {
        config.validate()?;
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        // Find the codec
        let codec = match config.encoder_name.as_deref() {
            Some(name) => ffmpeg_next::encoder::find_by_name(name).ok_or_else(|| {
                Error::codec_unavailable(format!("no encoder named '{name}'"))
            })?,
            None => ffmpeg_next::encoder::find(codec_id_to_ffmpeg(config.codec)).ok_or_else(
                || Error::codec_unavailable(format!("no {} encoder available", config.codec)),
            )?,
        };
        let encoder_name = codec.name().to_string();

        // Create encoder context
        let encoder_ctx = Context::new_with_codec(codec);
        let mut encoder = encoder_ctx.encoder().video().map_err(|_| {
            Error::codec_unavailable(format!("encoder '{encoder_name}' is not a video encoder"))
        })?;

        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(pixel_format_to_ffmpeg(config.pixel_format));
        encoder.set_bit_rate(config.bitrate as usize);

        // Time base is inverse of frame rate for video
        encoder.set_frame_rate(Some(rational_to_ffmpeg(config.frame_rate)));
        encoder.set_time_base(rational_to_ffmpeg(config.time_base()));

        encoder.set_gop(config.gop_size);
        encoder.set_max_b_frames(config.max_b_frames as usize);

        let mut opts = Dictionary::new();
        if let Some(preset) = config.preset {
            opts.set("preset", preset.as_str());
        }

        let encoder = encoder.open_with(opts).map_err(|e| {
            Error::open_failed(format!("{encoder_name} rejected the configuration: {e}"))
        })?;

        info!(
            encoder = %encoder_name,
            width = config.width,
            height = config.height,
            bitrate = config.bitrate,
            frame_rate = %config.frame_rate,
            gop = config.gop_size,
            max_b_frames = config.max_b_frames,
            pixel_format = %config.pixel_format,
            preset = config.preset.map(|p| p.as_str()),
            "opened video encoder"
        );

        Ok(Self {
            encoder,
            config,
            encoder_name,
            frames_submitted: 0,
            flushed: false,
        })
    }

    /**
        The configuration the encoder was opened with.
    */
    pub fn config(&self) -> &VideoEncoderConfig {
        &self.config
    }

    /**
        Name of the FFmpeg encoder implementation in use (e.g. `libx264`).
    */
    pub fn encoder_name(&self) -> &str {
        &self.encoder_name
    }

    /**
        Get the time base for frames and encoded packets.
    */
    pub fn time_base(&self) -> Rational {
        self.config.time_base()
    }

    /**
        Number of frames the encoder has accepted.
    */
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /**
        Allocate a frame buffer matching the configured format and size.
    */
    pub fn prepare_frame(&self) -> Result<FrameBuffer> {
        FrameBuffer::allocate(
            self.config.pixel_format,
            self.config.width,
            self.config.height,
        )
    }

    /**
        Stamp the frame with `pts` and hand it to the encoder.

        The encoder may buffer the frame without producing output; call
        [`drain`](Self::drain) afterwards. A refusal from the encoder is
        reported as [`Error::Submit`], which callers may treat as
        recoverable.
    */
    pub fn submit(&mut self, frame: &mut FrameBuffer, pts: Pts) -> Result<()> {
        if frame.format() != self.config.pixel_format
            || frame.width() != self.config.width
            || frame.height() != self.config.height
        {
            return Err(Error::configuration(format!(
                "frame {} {}x{} doesn't match encoder {} {}x{}",
                frame.format(),
                frame.width(),
                frame.height(),
                self.config.pixel_format,
                self.config.width,
                self.config.height
            )));
        }
        if self.flushed {
            return Err(Error::submit("encoder has already been flushed"));
        }

        frame.set_pts(pts)?;
        self.encoder
            .send_frame(frame.as_ffmpeg())
            .map_err(|e| Error::submit(format!("frame at pts {}: {e}", pts.0)))?;

        self.frames_submitted += 1;
        debug!(pts = pts.0, "submitted frame");
        Ok(())
    }

    /**
        Receive the packets the encoder has ready.

        The returned iterator stops when the encoder reports that no packet
        is currently available. It reflects the encoder's queue at the time
        it is driven and cannot be restarted.
    */
    pub fn drain(&mut self) -> Drain<'_> {
        let time_base = self.time_base();
        Drain {
            encoder: &mut self.encoder,
            time_base,
            done: false,
        }
    }

    /**
        Signal end of stream so frames held for reordering are released.

        Must be followed by [`drain`](Self::drain). Flushing twice is a no-op.
    */
    pub fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return Ok(());
        }
        self.encoder
            .send_eof()
            .map_err(|e| Error::codec(format!("failed to flush encoder: {e}")))?;
        self.flushed = true;
        debug!(frames = self.frames_submitted, "flushed encoder");
        Ok(())
    }

    /**
        Release the encoder.
    */
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        debug!(
            encoder = %self.encoder_name,
            frames = self.frames_submitted,
            flushed = self.flushed,
            "closing video encoder"
        );
    }
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("encoder", &self.encoder_name)
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("time_base", &self.time_base())
            .field("frames_submitted", &self.frames_submitted)
            .finish_non_exhaustive()
    }
}

/**
    Packets currently available from a [`VideoEncoder`].

    Each FFmpeg packet is copied into an owned [`Packet`] and released
    before the next one is received.
*/
pub struct Drain<'a> {
    encoder: &'a mut VideoEncoderFFmpeg,
    time_base: Rational,
    done: bool,
}

impl Iterator for Drain<'_> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut encoded_pkt = ffmpeg_next::Packet::empty();
        match self.encoder.receive_packet(&mut encoded_pkt) {
            Ok(()) => {
                let packet = convert_packet(&encoded_pkt, self.time_base);
                debug!(
                    size = packet.len(),
                    pts = packet.pts.map(|p| p.0),
                    keyframe = packet.is_keyframe,
                    "received packet"
                );
                Some(Ok(packet))
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                self.done = true;
                None
            }
            Err(ffmpeg_next::Error::Eof) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(Error::codec(format!("failed to receive packet: {e}"))))
            }
        }
    }
}

impl std::iter::FusedIterator for Drain<'_> {}

/**
    Convert an FFmpeg packet to our Packet type.
*/
fn convert_packet(pkt: &ffmpeg_next::Packet, time_base: Rational) -> Packet {
    Packet {
        data: pkt.data().map(|d| d.to_vec()).unwrap_or_default(),
        pts: pkt.pts().map(Pts),
        dts: pkt.dts().map(Pts),
        time_base,
        is_keyframe: pkt.is_key(),
    }
}
