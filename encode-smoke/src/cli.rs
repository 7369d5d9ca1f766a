use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use ffmpeg_encode::{EncoderPreset, VideoEncoder, VideoEncoderConfig};
use ffmpeg_sink::Sink;
use ffmpeg_types::{CodecId, PixelFormat, Rational};

use crate::session::{self, SessionOptions, SolidColor};
use crate::verify;

/**
    Encode synthetic solid-colour frames to a raw video elementary stream.
*/
#[derive(Parser, Debug)]
#[command(name = "encode-smoke", version)]
#[command(about = "Encode synthetic solid-colour frames to a raw H.264 stream")]
pub struct Args {
    /// Output file for the raw elementary stream
    #[arg(short, long, default_value = "output.h264")]
    pub output: PathBuf,

    /// Frame width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Target bitrate in bits per second
    #[arg(long, default_value_t = 400_000)]
    pub bitrate: u64,

    /// Frame rate as N or N/D
    #[arg(long, default_value = "25/1")]
    pub fps: Rational,

    /// Keyframe interval in frames
    #[arg(long, default_value_t = 10)]
    pub gop: u32,

    /// Maximum consecutive B-frames
    #[arg(long, default_value_t = 1)]
    pub max_b_frames: u32,

    /// Input pixel format (yuv420p, yuv422p, yuv444p)
    #[arg(long, default_value = "yuv420p")]
    pub pixel_format: PixelFormat,

    /// Encoder speed preset
    #[arg(long, default_value = "ultrafast")]
    pub preset: EncoderPreset,

    /// Don't pass a preset to the encoder
    #[arg(long, conflicts_with = "preset")]
    pub no_preset: bool,

    /// Codec to encode with
    #[arg(long, default_value = "h264")]
    pub codec: CodecId,

    /// Specific FFmpeg encoder to use (e.g. libx264)
    #[arg(long)]
    pub encoder: Option<String>,

    /// Number of frames to encode
    #[arg(long, default_value_t = 1)]
    pub frames: u64,

    /// Luma (Y) value of the frame
    #[arg(long, default_value_t = 128)]
    pub luma: u8,

    /// Blue-difference chroma (U) value
    #[arg(long, default_value_t = 64)]
    pub chroma_u: u8,

    /// Red-difference chroma (V) value
    #[arg(long, default_value_t = 192)]
    pub chroma_v: u8,

    /// Step luma by one per frame
    #[arg(long)]
    pub gradient: bool,

    /// Decode the output and check it against the input colours
    #[arg(long)]
    pub verify: bool,

    /// Largest allowed difference between a decoded plane's mean and its input value
    #[arg(long, default_value_t = 8.0)]
    pub tolerance: f64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn run(self) -> Result<()> {
        let preset = (!self.no_preset).then_some(self.preset);
        let mut config = VideoEncoderConfig::configure(
            self.width,
            self.height,
            self.bitrate,
            self.fps,
            self.gop,
            self.max_b_frames,
            self.pixel_format,
            preset,
        )
        .context("invalid encoder configuration")?
        .with_codec(self.codec);
        if let Some(name) = &self.encoder {
            config = config.with_encoder_name(name);
        }

        let mut encoder = VideoEncoder::open(config).context("failed to open encoder")?;

        let options = SessionOptions {
            frames: self.frames,
            color: SolidColor::new(self.luma, self.chroma_u, self.chroma_v),
            gradient: self.gradient,
            keep_packets: self.verify,
        };
        let report = session::run(&mut encoder, &options, || Sink::file(&self.output))?;
        let encoder_name = encoder.encoder_name().to_string();
        encoder.close();

        let verified = if self.verify {
            let result = verify::check(
                self.codec,
                &report.packets,
                &options,
                report.frames_submitted,
                self.tolerance,
            )
            .context("failed to verify output")?;
            Some(result)
        } else {
            None
        };

        println!(
            "Encoded {} frame(s) with {} to {}",
            report.frames_submitted,
            encoder_name,
            self.output.display()
        );
        println!(
            "  Packets:   {} ({} during encode, {} after flush)",
            report.total_packets(),
            report.loop_packets,
            report.flush_packets
        );
        println!("  Keyframes: {}", report.keyframes);
        println!("  Bytes:     {}", report.bytes);
        if report.submit_failures > 0 {
            println!("  Refused:   {} frame(s)", report.submit_failures);
        }
        if let Some(verified) = verified {
            println!(
                "  Verified:  {} frame(s), worst plane error {:.2}",
                verified.frames, verified.worst_error
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_reference_scenario() {
        let args = Args::parse_from(["encode-smoke"]);
        assert_eq!(args.output, PathBuf::from("output.h264"));
        assert_eq!((args.width, args.height), (640, 480));
        assert_eq!(args.bitrate, 400_000);
        assert_eq!(args.fps, Rational::new(25, 1));
        assert_eq!((args.gop, args.max_b_frames), (10, 1));
        assert_eq!(args.pixel_format, PixelFormat::Yuv420p);
        assert_eq!(args.preset, EncoderPreset::Ultrafast);
        assert_eq!(args.codec, CodecId::H264);
        assert_eq!((args.luma, args.chroma_u, args.chroma_v), (128, 64, 192));
        assert_eq!(args.frames, 1);
    }

    #[test]
    fn parses_custom_values() {
        let args = Args::parse_from([
            "encode-smoke",
            "--fps",
            "30000/1001",
            "--pixel-format",
            "yuv444p",
            "--encoder",
            "libx264",
            "--no-preset",
            "-vv",
        ]);
        assert_eq!(args.fps, Rational::new(30000, 1001));
        assert_eq!(args.pixel_format, PixelFormat::Yuv444p);
        assert_eq!(args.encoder.as_deref(), Some("libx264"));
        assert!(args.no_preset);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn rejects_unknown_pixel_format() {
        assert!(Args::try_parse_from(["encode-smoke", "--pixel-format", "nv12"]).is_err());
    }

    #[test]
    fn zero_width_fails_before_opening_encoder() {
        let args = Args::parse_from(["encode-smoke", "--width", "0"]);
        let err = args.run().unwrap_err();
        assert_eq!(err.to_string(), "invalid encoder configuration");
    }
}
