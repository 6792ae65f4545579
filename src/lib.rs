//! Recover true alpha channels from white/black background renders.
//!
//! Image generators rarely emit real transparency. Rendering the same subject
//! once on pure white and once on pure black gives two observations of every
//! pixel, enough to solve the alpha-blending equation for both opacity and the
//! unmatted colour ("difference matting").
//!
//! # Quick Start
//!
//! ```no_run
//! use difference_matting::MatteEngine;
//!
//! let engine = MatteEngine::default();
//! let white = image::open("logo_white.png").unwrap();
//! let black = image::open("logo_black.png").unwrap();
//! let rgba = engine.matte(&white, &black).expect("renders must share dimensions");
//! rgba.save("logo.png").unwrap();
//! ```
//!
//! # Combination rules
//!
//! Each colour channel gives its own alpha estimate. [`AlphaCombine`] picks how
//! they are reduced to one value; the default is the arithmetic mean.
//!
//! ```no_run
//! use difference_matting::{AlphaCombine, MatteEngine, MatteOptions};
//!
//! let engine = MatteEngine::new(MatteOptions {
//!     combine: AlphaCombine::Distance,
//!     verify_backgrounds: true,
//!     ..MatteOptions::default()
//! });
//! let white = std::fs::read("logo_white.png").unwrap();
//! let black = std::fs::read("logo_black.png").unwrap();
//! let png = engine.matte_bytes(&white, &black).unwrap();
//! std::fs::write("logo.png", png).unwrap();
//! ```

#![deny(missing_docs)]

pub mod background;
mod engine;
pub mod error;
pub mod matting;

pub use background::{background_is_black, background_is_white, Background};
pub use engine::{
    default_output_path, encode_png, find_pairs, is_supported_image, save_rgba,
    transparent_fraction, ImagePair, MatteEngine, MatteOptions, MatteResult, BLACK_SUFFIX,
    WHITE_SUFFIX,
};
pub use error::{Error, Result};
pub use matting::{extract_alpha, AlphaCombine};
