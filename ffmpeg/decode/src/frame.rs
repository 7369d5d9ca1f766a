/*!
    Decoded frame type.
*/

use ffmpeg_types::{PixelFormat, Plane, Pts};

/**
    A decoded planar YUV frame with tightly packed planes (no stride
    padding).
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pts: Option<Pts>,
    planes: [Vec<u8>; 3],
}

impl DecodedFrame {
    /**
        Build a frame from packed Y, U and V planes.

        # Panics

        If a plane's length doesn't match the format's plane size.
    */
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Option<Pts>,
        planes: [Vec<u8>; 3],
    ) -> Self {
        for plane in Plane::ALL {
            let (w, h) = format.plane_size(plane, width, height);
            assert_eq!(
                planes[plane.index()].len(),
                w as usize * h as usize,
                "{plane:?} plane has the wrong size for {format} {width}x{height}"
            );
        }
        Self {
            width,
            height,
            format,
            pts,
            planes,
        }
    }

    pub fn plane(&self, plane: Plane) -> &[u8] {
        &self.planes[plane.index()]
    }

    /**
        Average sample value of a plane.
    */
    pub fn mean(&self, plane: Plane) -> f64 {
        let data = self.plane(plane);
        if data.is_empty() {
            return 0.0;
        }
        let sum: u64 = data.iter().map(|&b| b as u64).sum();
        sum as f64 / data.len() as f64
    }

    /**
        Largest absolute difference between any sample of a plane and
        `value`.
    */
    pub fn max_deviation(&self, plane: Plane, value: u8) -> u8 {
        self.plane(plane)
            .iter()
            .map(|&b| b.abs_diff(value))
            .max()
            .unwrap_or(0)
    }
}
