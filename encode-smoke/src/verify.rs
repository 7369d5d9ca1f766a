/*!
    Round-trip check: decode the encoded packets and compare them with the
    flat colours that went in.
*/

use tracing::{debug, info};

use ffmpeg_decode::{DecodedFrame, VideoDecoder};
use ffmpeg_types::{CodecId, Error, Packet, Plane, Result};

use crate::session::{SessionOptions, SolidColor};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerifyReport {
    pub frames: usize,
    /// Largest distance between a plane's mean and its target value.
    pub worst_error: f64,
}

/**
    Decode `packets` and check every decoded frame against the colour the
    session filled it with, identified by pts.
*/
pub fn check(
    codec: CodecId,
    packets: &[Packet],
    options: &SessionOptions,
    frames_expected: u64,
    tolerance: f64,
) -> Result<VerifyReport> {
    let mut decoder = VideoDecoder::new(codec)?;

    let mut frames = Vec::new();
    for packet in packets {
        frames.extend(decoder.decode(packet)?);
    }
    frames.extend(decoder.flush()?);

    if frames.len() as u64 != frames_expected {
        return Err(Error::verify(format!(
            "decoded {} frame(s), expected {}",
            frames.len(),
            frames_expected
        )));
    }

    let mut report = VerifyReport {
        frames: frames.len(),
        worst_error: 0.0,
    };
    for (index, frame) in frames.iter().enumerate() {
        let pts = frame.pts.map_or(index as u64, |p| p.0 as u64);
        let error = compare(frame, options.color_for(pts), tolerance)
            .map_err(|e| Error::verify(format!("frame at pts {pts}: {e}")))?;
        debug!(pts, error, "verified frame");
        report.worst_error = report.worst_error.max(error);
    }

    info!(
        frames = report.frames,
        worst_error = report.worst_error,
        "decoded output matches input"
    );
    Ok(report)
}

/**
    Compare each plane's mean with the expected value, returning the largest
    difference.
*/
fn compare(
    frame: &DecodedFrame,
    color: SolidColor,
    tolerance: f64,
) -> std::result::Result<f64, String> {
    let mut worst = 0.0f64;
    for (plane, expected) in Plane::ALL.into_iter().zip([color.y, color.u, color.v]) {
        let mean = frame.mean(plane);
        let error = (mean - expected as f64).abs();
        if error > tolerance {
            return Err(format!(
                "{plane:?} plane mean {mean:.2} is more than {tolerance} away from {expected}"
            ));
        }
        worst = worst.max(error);
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use ffmpeg_types::{PixelFormat, Pts};

    use super::*;

    fn flat(y: u8, u: u8, v: u8) -> DecodedFrame {
        DecodedFrame::new(
            4,
            2,
            PixelFormat::Yuv420p,
            Some(Pts(0)),
            [vec![y; 8], vec![u; 2], vec![v; 2]],
        )
    }

    #[test]
    fn close_enough_passes() {
        let frame = flat(130, 62, 192);
        let error = compare(&frame, SolidColor::new(128, 64, 192), 8.0).unwrap();
        assert_eq!(error, 2.0);
    }

    #[test]
    fn chroma_drift_fails() {
        let frame = flat(128, 64, 160);
        let err = compare(&frame, SolidColor::new(128, 64, 192), 8.0).unwrap_err();
        assert!(err.starts_with("V plane"), "{err}");
    }
}
