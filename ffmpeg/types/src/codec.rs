/*!
    Codec identifiers.
*/

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/**
    Video codecs the session can request from FFmpeg.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    #[default]
    H264,
    H265,
    Mpeg4,
    Vp9,
    Av1,
}

impl CodecId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Mpeg4 => "mpeg4",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h264" | "avc" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            "mpeg4" => Ok(Self::Mpeg4),
            "vp9" => Ok(Self::Vp9),
            "av1" => Ok(Self::Av1),
            _ => Err(ParseError::new("codec", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("avc".parse::<CodecId>(), Ok(CodecId::H264));
        assert_eq!("H265".parse::<CodecId>(), Ok(CodecId::H265));
        assert_eq!("hevc".parse::<CodecId>(), Ok(CodecId::H265));
        assert!("theora".parse::<CodecId>().is_err());
    }
}
