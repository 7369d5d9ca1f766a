/*!
    Encode session driver.

    Runs the send/receive protocol against an opened encoder: fill the
    reused frame, submit, drain after every submission, then flush and
    drain once more so frames held for B-frame reordering reach the sink.
*/

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use ffmpeg_encode::{FrameBuffer, VideoEncoder};
use ffmpeg_sink::Sink;
use ffmpeg_types::{Packet, Pts};

/**
    The part of an encoder a session drives.
*/
pub trait FrameEncoder {
    type Frame;

    fn prepare_frame(&self) -> ffmpeg_types::Result<Self::Frame>;

    fn fill_frame(&self, frame: &mut Self::Frame, color: SolidColor) -> ffmpeg_types::Result<()>;

    fn submit(&mut self, frame: &mut Self::Frame, pts: Pts) -> ffmpeg_types::Result<()>;

    fn drain(&mut self) -> impl Iterator<Item = ffmpeg_types::Result<Packet>> + '_;

    fn flush(&mut self) -> ffmpeg_types::Result<()>;
}

impl FrameEncoder for VideoEncoder {
    type Frame = FrameBuffer;

    fn prepare_frame(&self) -> ffmpeg_types::Result<FrameBuffer> {
        VideoEncoder::prepare_frame(self)
    }

    fn fill_frame(&self, frame: &mut FrameBuffer, color: SolidColor) -> ffmpeg_types::Result<()> {
        frame.fill_solid_color(color.y, color.u, color.v)
    }

    fn submit(&mut self, frame: &mut FrameBuffer, pts: Pts) -> ffmpeg_types::Result<()> {
        VideoEncoder::submit(self, frame, pts)
    }

    fn drain(&mut self) -> impl Iterator<Item = ffmpeg_types::Result<Packet>> + '_ {
        VideoEncoder::drain(self)
    }

    fn flush(&mut self) -> ffmpeg_types::Result<()> {
        VideoEncoder::flush(self)
    }
}

/**
    Constant Y, U and V sample values.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidColor {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl SolidColor {
    pub const fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }
}

/**
    What to feed the encoder.
*/
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Number of frames to submit.
    pub frames: u64,
    /// Colour of the first frame.
    pub color: SolidColor,
    /// Step luma by one per frame so consecutive frames differ.
    pub gradient: bool,
    /// Keep copies of the packets in the report.
    pub keep_packets: bool,
}

impl SessionOptions {
    /**
        Colour of the frame at `index` (which is also its pts).
    */
    pub fn color_for(&self, index: u64) -> SolidColor {
        if self.gradient {
            SolidColor {
                y: self.color.y.wrapping_add(index as u8),
                ..self.color
            }
        } else {
            self.color
        }
    }
}

/**
    Counters from a finished session.
*/
#[derive(Clone, Debug, Default)]
pub struct SessionReport {
    pub frames_submitted: u64,
    pub submit_failures: u64,
    /// Packets drained while frames were still being submitted.
    pub loop_packets: u64,
    /// Packets drained after end of stream was signalled.
    pub flush_packets: u64,
    pub keyframes: u64,
    pub bytes: u64,
    pub packets: Vec<Packet>,
}

impl SessionReport {
    pub fn total_packets(&self) -> u64 {
        self.loop_packets + self.flush_packets
    }

    fn record(&mut self, packet: &Packet, keep: bool) {
        self.bytes += packet.len() as u64;
        if packet.is_keyframe {
            self.keyframes += 1;
        }
        if keep {
            self.packets.push(packet.clone());
        }
    }
}

/**
    Run one encode session.

    The frame buffer is allocated before the sink is opened. A frame the
    encoder refuses is logged and counted; every other failure ends the
    session, and whatever was acquired is released in reverse order as the
    locals drop.
*/
pub fn run<E, W, F>(encoder: &mut E, options: &SessionOptions, open_sink: F) -> Result<SessionReport>
where
    E: FrameEncoder,
    W: Write,
    F: FnOnce() -> ffmpeg_types::Result<Sink<W>>,
{
    let mut frame = encoder
        .prepare_frame()
        .context("failed to allocate frame buffer")?;
    let mut sink = open_sink().context("failed to open output")?;
    let mut report = SessionReport::default();

    for index in 0..options.frames {
        encoder
            .fill_frame(&mut frame, options.color_for(index))
            .context("failed to fill frame")?;

        match encoder.submit(&mut frame, Pts(index as i64)) {
            Ok(()) => report.frames_submitted += 1,
            Err(e) if e.is_recoverable() => {
                warn!(pts = index, error = %e, "encoder refused frame, continuing");
                report.submit_failures += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to submit frame {index}"));
            }
        }

        let drained = drain_into(encoder, &mut sink, &mut report, options.keep_packets)?;
        report.loop_packets += drained;
    }

    encoder.flush().context("failed to flush encoder")?;
    let drained = drain_into(encoder, &mut sink, &mut report, options.keep_packets)?;
    report.flush_packets += drained;

    sink.finish().context("failed to close output")?;

    info!(
        frames = report.frames_submitted,
        refused = report.submit_failures,
        packets = report.total_packets(),
        after_flush = report.flush_packets,
        bytes = report.bytes,
        "encode session finished"
    );
    Ok(report)
}

/**
    Drain everything the encoder has ready into the sink, in order.
*/
fn drain_into<E, W>(
    encoder: &mut E,
    sink: &mut Sink<W>,
    report: &mut SessionReport,
    keep: bool,
) -> Result<u64>
where
    E: FrameEncoder,
    W: Write,
{
    let mut count = 0;
    for packet in encoder.drain() {
        let packet = packet.context("failed to receive packet")?;
        sink.write(&packet).context("failed to write packet")?;
        report.record(&packet, keep);
        count += 1;
    }
    if count > 0 {
        debug!(count, "drained packets");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::io;

    use ffmpeg_types::{Error, Rational};

    use super::*;

    /**
        Scripted stand-in for an encoder that holds `delay` frames back,
        the way a B-frame encoder does.
    */
    #[derive(Default)]
    struct ScriptedEncoder {
        delay: usize,
        refuse: HashSet<i64>,
        fail_with_config_at: Option<i64>,
        fills: Vec<SolidColor>,
        pending: VecDeque<Pts>,
        ready: VecDeque<Packet>,
        flushed: bool,
    }

    impl ScriptedEncoder {
        fn with_delay(delay: usize) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn release(&mut self, pts: Pts) {
            self.ready.push_back(Packet {
                data: vec![pts.0 as u8; 4],
                pts: Some(pts),
                dts: Some(pts),
                time_base: Rational::new(1, 25),
                is_keyframe: pts.0 == 0,
            });
        }
    }

    impl FrameEncoder for ScriptedEncoder {
        type Frame = Option<SolidColor>;

        fn prepare_frame(&self) -> ffmpeg_types::Result<Self::Frame> {
            Ok(None)
        }

        fn fill_frame(
            &self,
            frame: &mut Self::Frame,
            color: SolidColor,
        ) -> ffmpeg_types::Result<()> {
            *frame = Some(color);
            Ok(())
        }

        fn submit(&mut self, frame: &mut Self::Frame, pts: Pts) -> ffmpeg_types::Result<()> {
            let color = frame.expect("frame filled before submit");
            self.fills.push(color);
            if self.fail_with_config_at == Some(pts.0) {
                return Err(Error::configuration("bad frame"));
            }
            if self.flushed || self.refuse.contains(&pts.0) {
                return Err(Error::submit("not now"));
            }
            self.pending.push_back(pts);
            while self.pending.len() > self.delay {
                let pts = self.pending.pop_front().unwrap();
                self.release(pts);
            }
            Ok(())
        }

        fn drain(&mut self) -> impl Iterator<Item = ffmpeg_types::Result<Packet>> + '_ {
            std::iter::from_fn(move || self.ready.pop_front().map(Ok))
        }

        fn flush(&mut self) -> ffmpeg_types::Result<()> {
            self.flushed = true;
            while let Some(pts) = self.pending.pop_front() {
                self.release(pts);
            }
            Ok(())
        }
    }

    struct BrokenWriter;

    impl io::Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn options(frames: u64) -> SessionOptions {
        SessionOptions {
            frames,
            color: SolidColor::new(128, 64, 192),
            gradient: false,
            keep_packets: true,
        }
    }

    fn memory_sink() -> ffmpeg_types::Result<Sink<Vec<u8>>> {
        Ok(Sink::new(Vec::new()))
    }

    #[test]
    fn no_frames_produces_no_packets() {
        let mut encoder = ScriptedEncoder::with_delay(1);
        let report = run(&mut encoder, &options(0), memory_sink).unwrap();
        assert_eq!(report.total_packets(), 0);
        assert_eq!(report.bytes, 0);
        assert!(encoder.flushed);
    }

    #[test]
    fn flush_recovers_buffered_frames() {
        let mut encoder = ScriptedEncoder::with_delay(2);
        let report = run(&mut encoder, &options(1), memory_sink).unwrap();
        assert_eq!(report.loop_packets, 0);
        assert_eq!(report.flush_packets, 1);
        assert_eq!(report.bytes, 4);
        assert_eq!(report.keyframes, 1);
    }

    #[test]
    fn packets_keep_receive_order() {
        let mut encoder = ScriptedEncoder::with_delay(1);
        let report = run(&mut encoder, &options(4), memory_sink).unwrap();
        let pts: Vec<_> = report.packets.iter().map(|p| p.pts.unwrap().0).collect();
        assert_eq!(pts, [0, 1, 2, 3]);
        assert_eq!(report.loop_packets, 3);
        assert_eq!(report.flush_packets, 1);
    }

    #[test]
    fn refused_frame_is_reported_and_session_continues() {
        let mut encoder = ScriptedEncoder {
            refuse: HashSet::from([1]),
            ..ScriptedEncoder::with_delay(1)
        };
        let report = run(&mut encoder, &options(3), memory_sink).unwrap();
        assert_eq!(report.frames_submitted, 2);
        assert_eq!(report.submit_failures, 1);
        assert_eq!(report.total_packets(), 2);
        assert!(encoder.flushed);
    }

    #[test]
    fn other_submit_errors_are_fatal() {
        let mut encoder = ScriptedEncoder {
            fail_with_config_at: Some(1),
            ..ScriptedEncoder::with_delay(0)
        };
        let err = run(&mut encoder, &options(3), memory_sink).unwrap_err();
        assert_eq!(err.to_string(), "failed to submit frame 1");
        assert!(!encoder.flushed);
    }

    #[test]
    fn gradient_steps_luma_per_frame() {
        let mut encoder = ScriptedEncoder::with_delay(0);
        let opts = SessionOptions {
            gradient: true,
            color: SolidColor::new(254, 64, 192),
            ..options(3)
        };
        run(&mut encoder, &opts, memory_sink).unwrap();
        let luma: Vec<_> = encoder.fills.iter().map(|c| c.y).collect();
        assert_eq!(luma, [254, 255, 0]);
        assert!(encoder.fills.iter().all(|c| c.u == 64 && c.v == 192));
    }

    #[test]
    fn sink_open_failure_is_fatal_after_frame_allocation() {
        let mut encoder = ScriptedEncoder::with_delay(0);
        let err = run(&mut encoder, &options(1), || -> ffmpeg_types::Result<Sink<Vec<u8>>> {
            Err(Error::Sink(io::Error::other("read-only filesystem")))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "failed to open output");
        assert!(encoder.fills.is_empty());
        assert!(!encoder.flushed);
    }

    #[test]
    fn sink_write_failure_is_fatal() {
        let mut encoder = ScriptedEncoder::with_delay(0);
        let err = run(&mut encoder, &options(2), || Ok(Sink::new(BrokenWriter))).unwrap_err();
        assert_eq!(err.to_string(), "failed to write packet");
        assert_eq!(encoder.fills.len(), 1);
    }
}
