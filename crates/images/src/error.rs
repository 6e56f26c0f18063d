//! Typed error enum for the images crate.

use thiserror::Error;

/// Errors raised by the Image Extractor outside of the per-field sentinel
/// path (which never surfaces as an error — see [`crate::ImageExtractor`]).
#[derive(Debug, Error)]
pub enum ImageError {
    /// The object directory could not be created or is not writable.
    #[error("image directory unavailable: {0}")]
    Io(#[from] std::io::Error),
}
