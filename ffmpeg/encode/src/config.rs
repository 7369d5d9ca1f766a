/*!
    Encoder configuration types.
*/

use std::fmt;
use std::str::FromStr;

use ffmpeg_types::{CodecId, Error, ParseError, PixelFormat, Rational, Result};

/**
    Encoder speed preset.

    Slower presets produce better compression (smaller files at same quality)
    but take longer to encode.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncoderPreset {
    /// Fastest encoding, largest files.
    Ultrafast,
    /// Very fast encoding.
    Superfast,
    /// Fast encoding.
    Veryfast,
    /// Faster than default.
    Faster,
    /// Fast encoding, good for real-time.
    Fast,
    /// Default balance of speed and compression.
    #[default]
    Medium,
    /// Better compression, slower.
    Slow,
    /// Even better compression.
    Slower,
    /// Best compression, slowest.
    Veryslow,
}

impl EncoderPreset {
    /**
        Get the FFmpeg preset string.
    */
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
        }
    }
}

impl fmt::Display for EncoderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncoderPreset {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ultrafast" => Ok(Self::Ultrafast),
            "superfast" => Ok(Self::Superfast),
            "veryfast" => Ok(Self::Veryfast),
            "faster" => Ok(Self::Faster),
            "fast" => Ok(Self::Fast),
            "medium" => Ok(Self::Medium),
            "slow" => Ok(Self::Slow),
            "slower" => Ok(Self::Slower),
            "veryslow" => Ok(Self::Veryslow),
            _ => Err(ParseError {
                kind: "preset",
                value: s.to_string(),
            }),
        }
    }
}

/**
    Configuration for video encoding.

    Built once before the encoder is opened. [`VideoEncoder::open`] takes it
    by value, so it cannot change while the encoder is live.

    [`VideoEncoder::open`]: crate::VideoEncoder::open
*/
#[derive(Clone, Debug, PartialEq)]
pub struct VideoEncoderConfig {
    /// Codec to use.
    pub codec: CodecId,
    /// Specific FFmpeg encoder implementation (e.g. `libx264`).
    /// When unset, FFmpeg's default encoder for `codec` is used.
    pub encoder_name: Option<String>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Frame rate.
    pub frame_rate: Rational,
    /// Keyframe interval in frames.
    pub gop_size: u32,
    /// Maximum number of consecutive B-frames.
    pub max_b_frames: u32,
    /// Input pixel format.
    pub pixel_format: PixelFormat,
    /// Encoder speed preset, passed as the encoder's `preset` option.
    pub preset: Option<EncoderPreset>,
}

impl VideoEncoderConfig {
    /**
        Create and validate an H.264 encoder configuration.

        Fails with [`Error::Configuration`] if either dimension is zero or
        the frame rate is not positive.
    */
    #[allow(clippy::too_many_arguments)]
    pub fn configure(
        width: u32,
        height: u32,
        bitrate: u64,
        frame_rate: Rational,
        gop_size: u32,
        max_b_frames: u32,
        pixel_format: PixelFormat,
        preset: Option<EncoderPreset>,
    ) -> Result<Self> {
        let config = Self {
            codec: CodecId::H264,
            encoder_name: None,
            width,
            height,
            bitrate,
            frame_rate,
            gop_size,
            max_b_frames,
            pixel_format,
            preset,
        };
        config.validate()?;
        Ok(config)
    }

    /**
        Check the static parameters.
    */
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::configuration(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.frame_rate.is_positive() {
            return Err(Error::configuration(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.encoder_name.as_deref().is_some_and(str::is_empty) {
            return Err(Error::configuration("encoder name is empty"));
        }
        Ok(())
    }

    /**
        Time base for frame and packet timestamps: one tick per frame.
    */
    pub fn time_base(&self) -> Rational {
        self.frame_rate.invert()
    }

    /**
        Set the codec.
    */
    pub fn with_codec(mut self, codec: CodecId) -> Self {
        self.codec = codec;
        self
    }

    /**
        Request a specific FFmpeg encoder implementation by name.
    */
    pub fn with_encoder_name(mut self, name: impl Into<String>) -> Self {
        self.encoder_name = Some(name.into());
        self
    }
}
