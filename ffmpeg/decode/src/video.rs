/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::{Id as CodecIdFFmpeg, context::Context, decoder::Video as VideoDecoderFFmpeg},
    ffi,
    format::Pixel,
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::{debug, warn};

use ffmpeg_types::{CodecId, Error, Packet, PixelFormat, Plane, Pts, Result};

use crate::frame::DecodedFrame;

/**
    Video decoder.

    Decodes video packets into planar YUV frames.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    codec: CodecId,
}

impl VideoDecoder {
    /**
        Open FFmpeg's default decoder for `codec`.

        The stream is expected to carry its parameter sets in-band, as raw
        encoder output does.
    */
    pub fn new(codec: CodecId) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let ffmpeg_codec = ffmpeg_next::decoder::find(codec_id_to_ffmpeg(codec))
            .ok_or_else(|| Error::codec_unavailable(format!("no {codec} decoder available")))?;

        let decoder = Context::new_with_codec(ffmpeg_codec)
            .decoder()
            .video()
            .map_err(|e| Error::codec(format!("failed to open {codec} decoder: {e}")))?;

        debug!(%codec, "opened video decoder");
        Ok(Self { decoder, codec })
    }

    pub fn codec(&self) -> CodecId {
        self.codec
    }

    /**
        Decode a packet, returning decoded frames.

        May return zero, one, or multiple frames depending on codec buffering.
        B-frames cause the decoder to buffer frames internally.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<DecodedFrame>> {
        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };
        ffmpeg_pkt.set_pts(packet.pts.map(|p| p.0));
        ffmpeg_pkt.set_dts(packet.dts.map(|p| p.0));

        // EAGAIN means decoder buffer is full - receive frames first then retry
        match self.decoder.send_packet(&ffmpeg_pkt) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                let mut all_frames = self.receive_frames()?;
                self.decoder
                    .send_packet(&ffmpeg_pkt)
                    .map_err(|e| Error::codec(e.to_string()))?;
                all_frames.extend(self.receive_frames()?);
                return Ok(all_frames);
            }
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        self.receive_frames()
    }

    /**
        Flush the decoder to get any remaining buffered frames.

        Call this at end of stream to retrieve frames the decoder has buffered.
    */
    pub fn flush(&mut self) -> Result<Vec<DecodedFrame>> {
        let mut all_frames = self.receive_frames()?;

        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        all_frames.extend(self.receive_frames()?);
        Ok(all_frames)
    }

    /**
        Receive all available frames from the decoder.
    */
    fn receive_frames(&mut self) -> Result<Vec<DecodedFrame>> {
        let mut frames = Vec::new();
        let mut decoded_frame = VideoFrameFFmpeg::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded_frame) {
                Ok(()) => frames.push(convert_frame(&decoded_frame)?),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => {
                    warn!(error = %e, "failed to receive decoded frame");
                    return Err(Error::codec(e.to_string()));
                }
            }
        }

        Ok(frames)
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/**
    Convert an FFmpeg frame to our DecodedFrame type.
*/
fn convert_frame(frame: &VideoFrameFFmpeg) -> Result<DecodedFrame> {
    let width = frame.width();
    let height = frame.height();
    if width == 0 || height == 0 {
        return Err(Error::codec("frame has zero dimensions"));
    }

    let format = pixel_format_from_ffmpeg(frame.format()).ok_or_else(|| {
        Error::codec(format!("unsupported decoded pixel format: {:?}", frame.format()))
    })?;

    let planes = Plane::ALL.map(|plane| {
        let (w, h) = format.plane_size(plane, width, height);
        let (w, h) = (w as usize, h as usize);
        let stride = frame.stride(plane.index());
        let data = frame.data(plane.index());

        let mut output = Vec::with_capacity(w * h);
        for y in 0..h {
            let row_start = y * stride;
            output.extend_from_slice(&data[row_start..row_start + w]);
        }
        output
    });

    Ok(DecodedFrame::new(
        width,
        height,
        format,
        frame.pts().map(Pts),
        planes,
    ))
}

/**
    Convert our CodecId to FFmpeg's codec ID.
*/
fn codec_id_to_ffmpeg(codec: CodecId) -> CodecIdFFmpeg {
    match codec {
        CodecId::H264 => CodecIdFFmpeg::H264,
        CodecId::H265 => CodecIdFFmpeg::HEVC,
        CodecId::Mpeg4 => CodecIdFFmpeg::MPEG4,
        CodecId::Vp9 => CodecIdFFmpeg::VP9,
        CodecId::Av1 => CodecIdFFmpeg::AV1,
    }
}

/**
    Convert FFmpeg's Pixel format to our PixelFormat.

    Full-range (JPEG) variants share the plane layout of their
    limited-range counterparts.
*/
fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P | Pixel::YUVJ420P => Some(PixelFormat::Yuv420p),
        Pixel::YUV422P | Pixel::YUVJ422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P | Pixel::YUVJ444P => Some(PixelFormat::Yuv444p),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_packet_yields_no_frames_or_an_error() {
        let Ok(mut decoder) = VideoDecoder::new(CodecId::H264) else {
            eprintln!("skipping: no H.264 decoder");
            return;
        };
        let packet = Packet {
            data: vec![0xde, 0xad, 0xbe, 0xef],
            pts: Some(Pts(0)),
            dts: Some(Pts(0)),
            time_base: ffmpeg_types::Rational::new(1, 25),
            is_keyframe: false,
        };
        if let Ok(frames) = decoder.decode(&packet) {
            assert!(frames.is_empty());
        }
        assert!(decoder.flush().map(|f| f.is_empty()).unwrap_or(true));
    }

    #[test]
    fn pixel_format_mapping() {
        assert_eq!(
            pixel_format_from_ffmpeg(Pixel::YUVJ420P),
            Some(PixelFormat::Yuv420p)
        );
        assert_eq!(pixel_format_from_ffmpeg(Pixel::NV12), None);
    }
}
