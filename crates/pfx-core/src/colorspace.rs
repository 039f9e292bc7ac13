//! Colour space tag carried by every [`Image`](crate::Image).
//!
//! The tag is buffer-level metadata: it selects how the first three bytes of
//! each pixel are read. It is never stored per pixel and changing it does not
//! touch pixel data. Conversions between tags live in `pfx-ops`.
//!
//! # Encodings
//!
//! | Tag           | byte 0          | byte 1        | byte 2        |
//! |---------------|-----------------|---------------|---------------|
//! | `Rgb`         | R `0..=255`     | G `0..=255`   | B `0..=255`   |
//! | `Hsv`         | H/2 `0..=179`   | S `0..=100`   | V `0..=100`   |
//! | `YCbCrJpeg`   | Y (full range)  | Cb            | Cr            |
//! | `YCbCrBt601`  | Y `16..=235`    | Cb `16..=240` | Cr `16..=240` |

use std::fmt;
use std::str::FromStr;

/// Interpretation of a pixel's first three channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Hue, saturation, value.
    Hsv,
    /// Full-range YCbCr as used by JPEG/JFIF.
    YCbCrJpeg,
    /// Studio-range YCbCr per ITU-R BT.601.
    YCbCrBt601,
}

impl ColorSpace {
    /// All tags, in declaration order.
    pub const ALL: [ColorSpace; 4] = [
        ColorSpace::Rgb,
        ColorSpace::Hsv,
        ColorSpace::YCbCrJpeg,
        ColorSpace::YCbCrBt601,
    ];

    /// Short lowercase name, also accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            ColorSpace::Rgb => "rgb",
            ColorSpace::Hsv => "hsv",
            ColorSpace::YCbCrJpeg => "ycbcr-jpeg",
            ColorSpace::YCbCrBt601 => "ycbcr-bt601",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorSpace::Rgb),
            "hsv" => Ok(ColorSpace::Hsv),
            "ycbcr-jpeg" | "ycbcr" | "jpeg" => Ok(ColorSpace::YCbCrJpeg),
            "ycbcr-bt601" | "bt601" => Ok(ColorSpace::YCbCrBt601),
            other => {
                let known: Vec<_> = ColorSpace::ALL.iter().map(|cs| cs.name()).collect();
                Err(format!("unknown colour space '{other}' (expected {})", known.join(", ")))
            }
        }
    }
}
