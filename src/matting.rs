//! Difference matting math.
//!
//! A pixel with opacity `alpha` and true colour `s` over a flat background
//! `bg` is observed as `alpha * s + (1 - alpha) * bg`. Rendering the same
//! subject on white (`bg = 255`) and on black (`bg = 0`) gives two equations:
//!
//! - `white = alpha * s + (1 - alpha) * 255`
//! - `black = alpha * s`
//!
//! so `alpha = 1 - (white - black) / 255` and `s = black / alpha`.
//!
//! This module solves those equations per pixel.

use image::{Rgba, RgbaImage, RgbImage};

use crate::error::{Error, Result};

/// Alpha below which colour recovery is skipped and the pixel is left black.
pub const DEFAULT_MIN_ALPHA: f32 = 0.01;

/// Distance between pure white and pure black in RGB space: `sqrt(3 * 255^2)`.
const WHITE_BLACK_DISTANCE: f32 = 441.672_96;

/// How the three per-channel alpha estimates are reduced to one value.
///
/// On clean renders all three estimates agree; they drift apart when the two
/// renders disagree slightly (compression noise, a regenerated subject).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlphaCombine {
    /// Arithmetic mean of the three channel estimates.
    #[default]
    Mean,
    /// Euclidean length of the white/black difference vector, normalised by the
    /// white-to-black distance. Negative differences count toward transparency.
    Distance,
    /// The most transparent channel estimate.
    Min,
    /// The most opaque channel estimate.
    Max,
}

impl AlphaCombine {
    /// All rules, in declaration order.
    pub const ALL: [Self; 4] = [Self::Mean, Self::Distance, Self::Min, Self::Max];

    /// Lowercase name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Distance => "distance",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// Combine the per-channel alpha estimates for one pixel pair.
///
/// Returns alpha in `[0, 1]`. A black render brighter than its white partner
/// (a negative difference) yields a raw estimate above 1, which is clamped.
#[must_use]
pub fn combine_alpha(white: [u8; 3], black: [u8; 3], rule: AlphaCombine) -> f32 {
    let diff: [f32; 3] = std::array::from_fn(|c| f32::from(white[c]) - f32::from(black[c]));
    let estimates = diff.map(|d| 1.0 - d / 255.0);

    let alpha = match rule {
        AlphaCombine::Mean => estimates.iter().sum::<f32>() / 3.0,
        AlphaCombine::Distance => {
            let dist = diff.iter().map(|d| d * d).sum::<f32>().sqrt();
            1.0 - dist / WHITE_BLACK_DISTANCE
        }
        AlphaCombine::Min => estimates.iter().copied().fold(f32::INFINITY, f32::min),
        AlphaCombine::Max => estimates.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    };

    alpha.clamp(0.0, 1.0)
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

/// Recover one RGBA pixel from its white and black observations.
///
/// Colour comes from the black render, `s = black / alpha`. When alpha is
/// zero or below `min_alpha` the colour is indeterminate and set to `(0, 0, 0)`,
/// whatever `min_alpha` is (including zero, negative or NaN).
#[must_use]
pub fn unmatte_pixel(
    white: [u8; 3],
    black: [u8; 3],
    rule: AlphaCombine,
    min_alpha: f32,
) -> Rgba<u8> {
    let alpha = combine_alpha(white, black, rule);

    if alpha <= 0.0 || alpha < min_alpha {
        return Rgba([0, 0, 0, to_channel(alpha * 255.0)]);
    }

    let [r, g, b] = black.map(|c| to_channel(f32::from(c) / alpha));
    Rgba([r, g, b, to_channel(alpha * 255.0)])
}

fn matte_row(
    white_row: &[u8],
    black_row: &[u8],
    out_row: &mut [u8],
    rule: AlphaCombine,
    min_alpha: f32,
) {
    let pairs = white_row.chunks_exact(3).zip(black_row.chunks_exact(3));
    for ((w, b), out) in pairs.zip(out_row.chunks_exact_mut(4)) {
        let px = unmatte_pixel([w[0], w[1], w[2]], [b[0], b[1], b[2]], rule, min_alpha);
        out.copy_from_slice(&px.0);
    }
}

/// Extract an RGBA image from a white-background and a black-background render.
///
/// Rows are independent; with the `parallel` feature they are processed on the
/// rayon thread pool. The result is identical either way.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the two renders differ in size.
/// No output is produced in that case.
pub fn extract_alpha(
    on_white: &RgbImage,
    on_black: &RgbImage,
    rule: AlphaCombine,
    min_alpha: f32,
) -> Result<RgbaImage> {
    if on_white.dimensions() != on_black.dimensions() {
        return Err(Error::DimensionMismatch {
            white: on_white.dimensions(),
            black: on_black.dimensions(),
        });
    }

    let (width, height) = on_white.dimensions();
    let mut output = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return Ok(output);
    }

    let in_stride = width as usize * 3;
    let out_stride = width as usize * 4;
    let white_rows = on_white.as_raw().chunks_exact(in_stride);
    let black_rows = on_black.as_raw().chunks_exact(in_stride);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let inputs: Vec<_> = white_rows.zip(black_rows).collect();
        let out: &mut [u8] = &mut output;
        out.par_chunks_exact_mut(out_stride)
            .zip(inputs.par_iter())
            .for_each(|(out_row, (w, b))| matte_row(w, b, out_row, rule, min_alpha));
    }

    #[cfg(not(feature = "parallel"))]
    {
        let out: &mut [u8] = &mut output;
        for (out_row, (w, b)) in out.chunks_exact_mut(out_stride).zip(white_rows.zip(black_rows)) {
            matte_row(w, b, out_row, rule, min_alpha);
        }
    }

    Ok(output)
}
