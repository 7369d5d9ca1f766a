/*!
    Pixel format types.
*/

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/**
    Planar YUV pixel formats with one luma and two chroma planes.

    These are the layouts the synthetic frame generator can fill. Each
    plane has its own stride, which may exceed its logical width.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    #[default]
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
}

/**
    One of the three planes of a planar YUV frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plane {
    Y,
    U,
    V,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Y, Plane::U, Plane::V];

    /**
        Index of the plane in FFmpeg's `data`/`linesize` arrays.
    */
    pub const fn index(self) -> usize {
        match self {
            Self::Y => 0,
            Self::U => 1,
            Self::V => 2,
        }
    }
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        This is the average over all planes.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Yuv420p => 12,
            Self::Yuv422p => 16,
            Self::Yuv444p => 24,
        }
    }

    /**
        Returns the horizontal and vertical chroma subsampling shifts.
    */
    pub const fn chroma_shift(self) -> (u32, u32) {
        match self {
            Self::Yuv420p => (1, 1),
            Self::Yuv422p => (1, 0),
            Self::Yuv444p => (0, 0),
        }
    }

    /**
        Returns the logical `(width, height)` of a plane for a frame of the
        given size.

        Chroma dimensions round up, matching FFmpeg for odd frame sizes.
    */
    pub const fn plane_size(self, plane: Plane, width: u32, height: u32) -> (u32, u32) {
        match plane {
            Plane::Y => (width, height),
            Plane::U | Plane::V => {
                let (sx, sy) = self.chroma_shift();
                (ceil_shift(width, sx), ceil_shift(height, sy))
            }
        }
    }

    /**
        Get the FFmpeg name of this format.
    */
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
        }
    }
}

const fn ceil_shift(value: u32, shift: u32) -> u32 {
    (value + (1 << shift) - 1) >> shift
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yuv420p" | "i420" | "planar-420" => Ok(Self::Yuv420p),
            "yuv422p" | "planar-422" => Ok(Self::Yuv422p),
            "yuv444p" | "planar-444" => Ok(Self::Yuv444p),
            _ => Err(ParseError::new("pixel format", s)),
        }
    }
}
