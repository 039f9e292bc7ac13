//! Pixel representation.

/// A single 4-byte pixel. Byte 3 is always alpha.
pub type Pixel = [u8; 4];

/// Index of the alpha channel within a [`Pixel`].
pub const ALPHA: usize = 3;

/// Rec.709 luminance weights, used by grayscale conversion.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Clamps `v` to `[0, 255]` and rounds half-up to a byte.
#[inline]
pub fn clamp_u8(v: f32) -> u8 {
    (v.clamp(0.0, 255.0) + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_u8() {
        assert_eq!(clamp_u8(-4.0), 0);
        assert_eq!(clamp_u8(300.0), 255);
        assert_eq!(clamp_u8(127.49), 127);
        assert_eq!(clamp_u8(127.5), 128);
        assert_eq!(clamp_u8(254.9), 255);
    }
}
