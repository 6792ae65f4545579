//! Matting engine: options, file and in-memory I/O, batch processing.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::background::{self, Background};
use crate::error::{Error, Result};
use crate::matting::{self, AlphaCombine};

/// File-stem suffix marking the white-background render of a pair.
pub const WHITE_SUFFIX: &str = "_white";
/// File-stem suffix marking the black-background render of a pair.
pub const BLACK_SUFFIX: &str = "_black";

/// Options controlling matting behavior.
#[derive(Debug, Clone)]
pub struct MatteOptions {
    /// Rule for reducing per-channel alpha estimates to one value.
    pub combine: AlphaCombine,
    /// Alpha below which colour recovery is skipped (0.0-1.0).
    pub min_alpha: f32,
    /// Check that each render sits on its expected flat background first.
    pub verify_backgrounds: bool,
    /// Mean per-channel deviation tolerated by the background check.
    pub background_tolerance: u8,
}

impl Default for MatteOptions {
    fn default() -> Self {
        Self {
            combine: AlphaCombine::Mean,
            min_alpha: matting::DEFAULT_MIN_ALPHA,
            verify_backgrounds: false,
            background_tolerance: background::DEFAULT_TOLERANCE,
        }
    }
}

/// Result of processing one white/black pair.
#[derive(Debug)]
pub struct MatteResult {
    /// Path of the white-background input (identifies the pair).
    pub path: PathBuf,
    /// Where the RGBA output was written, if it was.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Fraction of output pixels that are not fully opaque.
    pub transparent_fraction: f32,
    /// Human-readable status message.
    pub message: String,
}

impl MatteResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            success: false,
            transparent_fraction: 0.0,
            message,
        }
    }
}

/// A white render and its black partner found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    /// Shared stem without the colour suffix (`logo` for `logo_white.png`).
    pub stem: String,
    /// The white-background render.
    pub white: PathBuf,
    /// The black-background render, if one exists.
    pub black: Option<PathBuf>,
    /// Further renders sharing this stem; a non-empty list makes the pair ambiguous.
    pub conflicts: Vec<PathBuf>,
}

/// The matting engine.
///
/// Holds no per-image state; one engine can process any number of pairs,
/// including concurrently.
#[derive(Debug, Clone, Default)]
pub struct MatteEngine {
    options: MatteOptions,
}

impl MatteEngine {
    /// Create an engine with the given options.
    #[must_use]
    pub fn new(options: MatteOptions) -> Self {
        Self { options }
    }

    /// The options this engine runs with.
    #[must_use]
    pub fn options(&self) -> &MatteOptions {
        &self.options
    }

    /// Matte two already-converted RGB renders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the renders differ in size, or
    /// [`Error::BackgroundMismatch`] if background verification is enabled and
    /// a render fails it.
    pub fn matte_rgb(&self, on_white: &RgbImage, on_black: &RgbImage) -> Result<RgbaImage> {
        if self.options.verify_backgrounds {
            self.verify(on_white, Background::White, "white")?;
            self.verify(on_black, Background::Black, "black")?;
        }

        tracing::debug!(
            width = on_white.width(),
            height = on_white.height(),
            rule = self.options.combine.name(),
            "extracting alpha"
        );

        matting::extract_alpha(
            on_white,
            on_black,
            self.options.combine,
            self.options.min_alpha,
        )
    }

    /// Matte two decoded images of any colour type.
    ///
    /// Inputs are converted to 8-bit RGB first; any existing alpha is dropped.
    ///
    /// # Errors
    ///
    /// See [`MatteEngine::matte_rgb`].
    pub fn matte(&self, on_white: &DynamicImage, on_black: &DynamicImage) -> Result<RgbaImage> {
        self.matte_rgb(&on_white.to_rgb8(), &on_black.to_rgb8())
    }

    /// Matte two encoded image byte streams and return a PNG with transparency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if either input cannot be decoded, plus the
    /// errors of [`MatteEngine::matte_rgb`].
    pub fn matte_bytes(&self, on_white: &[u8], on_black: &[u8]) -> Result<Vec<u8>> {
        let white = image::load_from_memory(on_white).map_err(Error::Decode)?;
        let black = image::load_from_memory(on_black).map_err(Error::Decode)?;
        let rgba = self.matte(&white, &black)?;
        encode_png(&rgba)
    }

    fn verify(&self, image: &RgbImage, expected: Background, label: &str) -> Result<()> {
        if background::has_background(image, expected, self.options.background_tolerance) {
            return Ok(());
        }
        tracing::warn!(%expected, label, "background check failed");
        Err(Error::BackgroundMismatch {
            expected,
            label: label.to_string(),
        })
    }

    /// Process one pair of files: load, matte, save.
    ///
    /// Never fails; the outcome is reported in the returned [`MatteResult`].
    #[must_use]
    pub fn process_pair(&self, white: &Path, black: &Path, output: &Path) -> MatteResult {
        match self.try_process_pair(white, black, output) {
            Ok(transparent_fraction) => MatteResult {
                path: white.to_path_buf(),
                output: Some(output.to_path_buf()),
                success: true,
                transparent_fraction,
                message: format!("Saved {}", output.display()),
            },
            Err(e) => MatteResult::failed(white, e.to_string()),
        }
    }

    fn try_process_pair(&self, white: &Path, black: &Path, output: &Path) -> Result<f32> {
        let on_white = load_rgb(white)?;
        let on_black = load_rgb(black)?;

        let rgba = self.matte_rgb(&on_white, &on_black).map_err(|e| match e {
            Error::BackgroundMismatch { expected, .. } => Error::BackgroundMismatch {
                expected,
                label: file_label(if expected == Background::White { white } else { black }),
            },
            other => other,
        })?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        save_rgba(&rgba, output)?;
        tracing::info!(output = %output.display(), "wrote matte");

        Ok(transparent_fraction(&rgba))
    }

    /// Process every `<stem>_white.<ext>` / `<stem>_black.<ext>` pair in a directory.
    ///
    /// Outputs are written to `output_dir` as `<stem>_transparent.png`. A white
    /// render without a black partner, or a stem with several white or black
    /// renders, yields a failed result and writes nothing. Uses parallel
    /// iteration when the `parallel` feature is enabled.
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<MatteResult> {
        let pairs = match find_pairs(input_dir) {
            Ok(p) => p,
            Err(e) => {
                return vec![MatteResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![MatteResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        tracing::debug!(count = pairs.len(), dir = %input_dir.display(), "found pairs");

        let run = |pair: &ImagePair| match &pair.black {
            _ if !pair.conflicts.is_empty() => {
                let others: Vec<_> = pair.conflicts.iter().map(|p| file_label(p)).collect();
                MatteResult::failed(
                    &pair.white,
                    format!(
                        "Ambiguous renders for stem {}: also found {}",
                        pair.stem,
                        others.join(", ")
                    ),
                )
            }
            Some(black) => {
                let output = output_dir.join(format!("{}_transparent.png", pair.stem));
                self.process_pair(&pair.white, black, &output)
            }
            None => MatteResult::failed(
                &pair.white,
                format!("No {}{BLACK_SUFFIX} partner found", pair.stem),
            ),
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            pairs.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            pairs.iter().map(run).collect()
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

/// Fraction of pixels whose alpha is below 255.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn transparent_fraction(image: &RgbaImage) -> f32 {
    let total = u64::from(image.width()) * u64::from(image.height());
    if total == 0 {
        return 0.0;
    }
    let transparent = image.pixels().filter(|p| p[3] < 255).count();
    transparent as f32 / total as f32
}

fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Find white/black render pairs in a directory, sorted by stem.
///
/// Files are visited in name order, so the chosen partners do not depend on
/// `read_dir` order. When a stem has more than one white or black render, the
/// first of each is kept and the rest are listed in [`ImagePair::conflicts`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory cannot be read.
pub fn find_pairs(dir: &Path) -> Result<Vec<ImagePair>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_supported_image(p))
        .collect();
    files.sort();

    let mut by_stem: BTreeMap<String, (Vec<PathBuf>, Vec<PathBuf>)> = BTreeMap::new();
    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(WHITE_SUFFIX) {
            by_stem.entry(stem.to_string()).or_default().0.push(path);
        } else if let Some(stem) = name.strip_suffix(BLACK_SUFFIX) {
            by_stem.entry(stem.to_string()).or_default().1.push(path);
        }
    }

    Ok(by_stem
        .into_iter()
        .filter_map(|(stem, (whites, blacks))| {
            let mut whites = whites.into_iter();
            let white = whites.next()?;
            let mut blacks = blacks.into_iter();
            let black = blacks.next();
            Some(ImagePair {
                stem,
                white,
                black,
                conflicts: whites.chain(blacks).collect(),
            })
        })
        .collect())
}

/// Check if a file has a supported input image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image to a format that can carry the alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for extensions other than PNG or WebP,
/// and [`Error::ImageSave`] if encoding or writing fails.
pub fn save_rgba(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP => {
            img.save_with_format(path, format)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{format:?} cannot store an alpha channel; use .png or .webp"
            )));
        }
    }

    Ok(())
}

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Generate a default output path from the white-render path.
///
/// Example: `"logo_white.jpg"` becomes `"logo_transparent.png"`.
#[must_use]
pub fn default_output_path(white: &Path) -> PathBuf {
    let name = white.file_stem().unwrap_or_default().to_string_lossy();
    let stem = name.strip_suffix(WHITE_SUFFIX).unwrap_or(&name);
    let parent = white.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_transparent.png"))
}
