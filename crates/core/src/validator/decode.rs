//! Full-decode validator built on the `image` crate.

use std::path::Path;

use image::ImageReader;

use super::{ItemValidator, ValidationError};

/// Accepts a file only if its format is recognized and its pixels decode.
///
/// Header sniffing takes precedence over the file extension, so a PNG saved
/// as `.jpg` still passes while a truncated JPEG does not.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecodeValidator;

impl ImageDecodeValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ItemValidator for ImageDecodeValidator {
    fn name(&self) -> &str {
        "image-decode"
    }

    fn validate(&self, path: &Path) -> Result<(), ValidationError> {
        let reader = ImageReader::open(path)
            .map_err(|source| ValidationError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?
            .with_guessed_format()
            .map_err(|source| ValidationError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        if reader.format().is_none() {
            return Err(ValidationError::Undecodable {
                path: path.to_path_buf(),
                reason: "unrecognized image format".to_string(),
            });
        }

        reader
            .decode()
            .map(|_| ())
            .map_err(|e| ValidationError::Undecodable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
