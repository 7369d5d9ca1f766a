/*!
    Reusable input frame buffer.
*/

use ffmpeg_next::{ffi, util::frame::video::Video as VideoFrameFFmpeg};
use tracing::trace;

use ffmpeg_types::{Error, PixelFormat, Plane, Pts, Result};

use crate::convert::pixel_format_to_ffmpeg;

/**
    Byte alignment FFmpeg uses for plane rows and plane starts.
*/
pub const FRAME_ALIGN: usize = 32;

/**
    A planar YUV frame owned by the caller and reused across submissions.

    The planes are allocated by FFmpeg; each has its own stride, which may
    be larger than the plane's logical width.
*/
pub struct FrameBuffer {
    frame: VideoFrameFFmpeg,
    format: PixelFormat,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /**
        Allocate plane storage for the given format and dimensions.
    */
    pub fn allocate(format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::configuration(format!(
                "cannot allocate a {width}x{height} frame"
            )));
        }

        let frame = VideoFrameFFmpeg::new(pixel_format_to_ffmpeg(format), width, height);
        if unsafe { frame.is_empty() } {
            return Err(Error::allocation(format!(
                "could not allocate {format} frame buffer of {width}x{height}"
            )));
        }

        trace!(
            %format,
            width,
            height,
            y_stride = frame.stride(0),
            "allocated frame buffer"
        );

        Ok(Self {
            frame,
            format,
            width,
            height,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /**
        Presentation timestamp that will be attached to the next submission.
    */
    pub fn pts(&self) -> Option<Pts> {
        self.frame.pts().map(Pts)
    }

    /**
        Set the presentation timestamp.

        Timestamps must not go backwards over the life of the buffer.
    */
    pub fn set_pts(&mut self, pts: Pts) -> Result<()> {
        if let Some(prev) = self.pts()
            && pts < prev
        {
            return Err(Error::configuration(format!(
                "timestamp {} is earlier than previous timestamp {}",
                pts.0, prev.0
            )));
        }
        self.frame.set_pts(Some(pts.0));
        Ok(())
    }

    /**
        Row length in bytes of a plane, including padding.
    */
    pub fn stride(&self, plane: Plane) -> usize {
        self.frame.stride(plane.index())
    }

    /**
        Logical `(width, height)` of a plane.
    */
    pub fn plane_size(&self, plane: Plane) -> (usize, usize) {
        let (w, h) = self.format.plane_size(plane, self.width, self.height);
        (w as usize, h as usize)
    }

    /**
        The logical bytes of one plane row, without stride padding.
    */
    pub fn row(&self, plane: Plane, y: usize) -> &[u8] {
        let (w, _) = self.plane_size(plane);
        let start = y * self.stride(plane);
        &self.frame.data(plane.index())[start..start + w]
    }

    /**
        The full backing storage of a plane, including stride padding.
    */
    pub fn plane_data(&self, plane: Plane) -> &[u8] {
        self.frame.data(plane.index())
    }

    /**
        Fill every plane with a constant value.

        Only the logical width of each row is written; padding up to the
        stride is left as is. The encoder may still hold a reference to the
        previous contents, so the buffer is made writable first.
    */
    pub fn fill_solid_color(&mut self, y: u8, u: u8, v: u8) -> Result<()> {
        self.make_writable()?;

        for (plane, value) in Plane::ALL.into_iter().zip([y, u, v]) {
            let (w, h) = self.plane_size(plane);
            let stride = self.stride(plane);
            let data = self.frame.data_mut(plane.index());
            for row in 0..h {
                let start = row * stride;
                data[start..start + w].fill(value);
            }
        }

        Ok(())
    }

    fn make_writable(&mut self) -> Result<()> {
        let ret = unsafe { ffi::av_frame_make_writable(self.frame.as_mut_ptr()) };
        if ret < 0 {
            return Err(Error::allocation(format!(
                "frame not writable: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }

    pub(crate) fn as_ffmpeg(&self) -> &VideoFrameFFmpeg {
        &self.frame
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pts", &self.pts())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_writes_logical_width_only() {
        let mut frame = FrameBuffer::allocate(PixelFormat::Yuv420p, 33, 17).unwrap();
        frame.fill_solid_color(128, 64, 192).unwrap();

        for (plane, value) in Plane::ALL.into_iter().zip([128u8, 64, 192]) {
            let (w, h) = frame.plane_size(plane);
            assert!(frame.stride(plane) >= w);
            for y in 0..h {
                assert!(
                    frame.row(plane, y).iter().all(|&b| b == value),
                    "{plane:?} row {y} not filled"
                );
            }
        }
        assert_eq!(frame.plane_size(Plane::U), (17, 9));
    }

    #[test]
    fn fill_can_be_repeated() {
        let mut frame = FrameBuffer::allocate(PixelFormat::Yuv444p, 64, 48).unwrap();
        frame.fill_solid_color(10, 20, 30).unwrap();
        frame.fill_solid_color(200, 100, 50).unwrap();
        assert!(frame.row(Plane::Y, 47).iter().all(|&b| b == 200));
        assert!(frame.row(Plane::V, 0).iter().all(|&b| b == 50));
        assert_eq!(frame.plane_size(Plane::V), (64, 48));
    }

    #[test]
    fn strides_are_aligned() {
        let frame = FrameBuffer::allocate(PixelFormat::Yuv420p, 100, 20).unwrap();
        assert!(frame.stride(Plane::Y) >= 100);
        assert!(frame.stride(Plane::U) >= 50);
        assert_eq!(frame.stride(Plane::Y) % FRAME_ALIGN, 0);
    }

    #[test]
    fn pts_must_not_decrease() {
        let mut frame = FrameBuffer::allocate(PixelFormat::Yuv420p, 16, 16).unwrap();
        assert_eq!(frame.pts(), None);
        frame.set_pts(Pts(0)).unwrap();
        frame.set_pts(Pts(0)).unwrap();
        frame.set_pts(Pts(3)).unwrap();
        let err = frame.set_pts(Pts(2)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(frame.pts(), Some(Pts(3)));
    }

    #[test]
    fn zero_sized_frame_is_rejected() {
        let err = FrameBuffer::allocate(PixelFormat::Yuv420p, 0, 16).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
