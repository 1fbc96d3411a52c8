//! Testing utilities and mock implementations.
//!
//! Test doubles for the engine's injected collaborators, so the whole run
//! loop can be exercised against a temporary directory without a real
//! classification service.
//!
//! # Example
//!
//! ```rust,ignore
//! use lenscat_core::testing::{fixtures, MemoryEventLog, MockOracle};
//!
//! let oracle = MockOracle::new();
//! oracle.push_result(ClassificationResult::found("a.jpg", fields, vec!["a.jpg".into()]));
//!
//! // Run the orchestrator...
//!
//! assert_eq!(oracle.calls(), vec![vec!["a.jpg".to_string()]]);
//! ```

mod memory_event_log;
mod mock_oracle;

pub use memory_event_log::MemoryEventLog;
pub use mock_oracle::{MockOracle, RecordedBatch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use image::{ImageFormat, Rgb, RgbImage};

    use crate::catalog::ProductFields;

    /// Write a small decodable image; the format follows the extension.
    ///
    /// Pixels vary with the name so different fixtures have different bytes.
    pub fn write_image(dir: &Path, name: &str) -> PathBuf {
        let seed = name.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
        let img = RgbImage::from_fn(32, 32, |x, y| {
            Rgb([
                (x * 8) as u8 ^ seed,
                (y * 8) as u8,
                ((x + y) * 4) as u8 ^ seed.rotate_left(3),
            ])
        });
        let path = dir.join(name);
        img.save(&path).expect("failed to write fixture image");
        path
    }

    /// Write a PNG under `name` whatever its extension says.
    pub fn write_png_as(dir: &Path, name: &str) -> PathBuf {
        let img = RgbImage::from_pixel(16, 16, Rgb([200, 40, 90]));
        let path = dir.join(name);
        img.save_with_format(&path, ImageFormat::Png)
            .expect("failed to write fixture image");
        path
    }

    /// Write a file with an image extension that does not decode.
    pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"this is not an image").expect("failed to write fixture file");
        path
    }

    /// Product fields with the common 54/18/145 sizes.
    pub fn product(reference: &str, color: &str) -> ProductFields {
        ProductFields {
            reference: reference.to_string(),
            size1: "54".to_string(),
            size2: "18".to_string(),
            size3: "145".to_string(),
            color: color.to_string(),
        }
    }
}
