//! Flat-background checks for matting inputs.
//!
//! Difference matting only holds when each render sits on a uniform white or
//! black background. These checks sample the four corner pixels, which are
//! background for any subject that does not touch the frame edge.

use std::fmt;

use image::RgbImage;

/// The flat background colour a render is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Pure white, `#FFFFFF`.
    White,
    /// Pure black, `#000000`.
    Black,
}

impl Background {
    /// Channel value of this background (255 for white, 0 for black).
    #[must_use]
    pub fn channel_value(self) -> u8 {
        match self {
            Self::White => 255,
            Self::Black => 0,
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

/// Default tolerance for corner checks, as a mean RGB deviation.
pub const DEFAULT_TOLERANCE: u8 = 20;

/// Check that all four corners of `image` are within `tolerance` of `background`.
///
/// The deviation of a corner is the mean of its three channels' distance from
/// the background value. Empty images never match.
#[must_use]
pub fn has_background(image: &RgbImage, background: Background, tolerance: u8) -> bool {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return false;
    }

    let target = i32::from(background.channel_value());
    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];

    corners.iter().all(|&(x, y)| {
        let px = image.get_pixel(x, y);
        let deviation: i32 = px.0.iter().map(|&c| (i32::from(c) - target).abs()).sum();
        deviation <= 3 * i32::from(tolerance)
    })
}

/// Check that an image has a near-black background.
#[must_use]
pub fn background_is_black(image: &RgbImage, tolerance: u8) -> bool {
    has_background(image, Background::Black, tolerance)
}

/// Check that an image has a near-white background.
#[must_use]
pub fn background_is_white(image: &RgbImage, tolerance: u8) -> bool {
    has_background(image, Background::White, tolerance)
}
