//! Error types for the difference-matting crate.

use std::path::PathBuf;

use crate::background::Background;

/// Errors that can occur while loading, matting, or saving images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The white and black renders do not share the same dimensions.
    #[error(
        "dimension mismatch: white render is {}x{}, black render is {}x{}",
        white.0, white.1, black.0, black.1
    )]
    DimensionMismatch {
        /// Width and height of the white-background render.
        white: (u32, u32),
        /// Width and height of the black-background render.
        black: (u32, u32),
    },

    /// A render does not sit on the flat background it was supplied as.
    #[error("{label} render does not have a {expected} background")]
    BackgroundMismatch {
        /// The background the render was expected to have.
        expected: Background,
        /// Which input failed the check (a file name or "white"/"black").
        label: String,
    },

    /// Failed to load an image file.
    #[error("failed to load image from {}: {source}", path.display())]
    ImageLoad {
        /// Path of the file that could not be loaded.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {}: {source}", path.display())]
    ImageSave {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to decode an in-memory image byte stream.
    #[error("failed to decode image data: {0}")]
    Decode(#[source] image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported (or cannot carry an alpha channel).
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
