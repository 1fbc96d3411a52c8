//! Configuration for the output organizer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Extension given to every organized file.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Whether to verify checksums after copying.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_extension() -> String {
    "jpg".to_string()
}

fn default_buffer_size() -> usize {
    1024 * 1024 // 1 MB
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            verify_checksums: false,
            buffer_size: default_buffer_size(),
        }
    }
}

impl OrganizerConfig {
    /// Enables checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}
