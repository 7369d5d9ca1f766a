/*!
    Conversions between our types and FFmpeg's.
*/

use ffmpeg_next::{codec::Id as CodecIdFFmpeg, format::Pixel};

use ffmpeg_types::{CodecId, PixelFormat, Rational};

/**
    Convert our CodecId to FFmpeg's codec ID.
*/
pub(crate) fn codec_id_to_ffmpeg(codec: CodecId) -> CodecIdFFmpeg {
    match codec {
        CodecId::H264 => CodecIdFFmpeg::H264,
        CodecId::H265 => CodecIdFFmpeg::HEVC,
        CodecId::Mpeg4 => CodecIdFFmpeg::MPEG4,
        CodecId::Vp9 => CodecIdFFmpeg::VP9,
        CodecId::Av1 => CodecIdFFmpeg::AV1,
    }
}

/**
    Convert our PixelFormat to FFmpeg's Pixel format.
*/
pub(crate) fn pixel_format_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
    }
}

pub(crate) fn rational_to_ffmpeg(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}
