//! Types for the product catalog.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version written to every catalog document.
pub const CATALOG_VERSION: u32 = 1;

/// Identifying fields parsed from a product code such as `0037 54[]18-145 C4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub reference: String,
    pub size1: String,
    pub size2: String,
    pub size3: String,
    pub color: String,
}

/// Files for one reference sharing one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroup {
    pub color: String,
    /// The photograph that carried the identifying code.
    pub key_file: String,
    /// Other photographs judged to show the same product.
    #[serde(default)]
    pub additional_files: Vec<String>,
}

impl ColorGroup {
    /// Key file followed by the additional files.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key_file.as_str()).chain(self.additional_files.iter().map(String::as_str))
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files().any(|f| f == file)
    }
}

/// One catalog record per distinct reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub reference: String,
    pub size1: String,
    pub size2: String,
    pub size3: String,
    #[serde(default)]
    pub colors: Vec<ColorGroup>,
}

impl CatalogEntry {
    pub fn color(&self, color: &str) -> Option<&ColorGroup> {
        self.colors.iter().find(|g| g.color == color)
    }
}

/// The persisted catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            version: CATALOG_VERSION,
            entries: Vec::new(),
        }
    }
}

impl Catalog {
    pub fn get(&self, reference: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.reference == reference)
    }

    /// Every file name attributed to some color group.
    pub fn attributed_files(&self) -> HashSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.colors.iter())
            .flat_map(|g| g.files())
            .map(String::from)
            .collect()
    }

    /// The `(reference, color)` a file is attributed to, if any.
    pub fn owner_of(&self, file: &str) -> Option<(&str, &str)> {
        self.entries.iter().find_map(|e| {
            e.colors
                .iter()
                .find(|g| g.contains(file))
                .map(|g| (e.reference.as_str(), g.color.as_str()))
        })
    }

    pub fn stats(&self) -> CatalogStats {
        let color_groups = self.entries.iter().map(|e| e.colors.len()).sum();
        let files = self
            .entries
            .iter()
            .flat_map(|e| e.colors.iter())
            .map(|g| 1 + g.additional_files.len())
            .sum();
        CatalogStats {
            entries: self.entries.len(),
            color_groups,
            files,
        }
    }

    /// Check the uniqueness invariants, returning the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut references = HashSet::new();
        let mut files = HashSet::new();

        for entry in &self.entries {
            if !references.insert(entry.reference.as_str()) {
                return Err(format!("duplicate reference '{}'", entry.reference));
            }
            let mut colors = HashSet::new();
            for group in &entry.colors {
                if !colors.insert(group.color.as_str()) {
                    return Err(format!(
                        "duplicate color '{}' in reference '{}'",
                        group.color, entry.reference
                    ));
                }
                for file in group.files() {
                    if !files.insert(file) {
                        return Err(format!("file '{}' attributed more than once", file));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub entries: usize,
    pub color_groups: usize,
    pub files: usize,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Failed to write catalog to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(color: &str, key: &str, extra: &[&str]) -> ColorGroup {
        ColorGroup {
            color: color.to_string(),
            key_file: key.to_string(),
            additional_files: extra.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn entry(reference: &str, colors: Vec<ColorGroup>) -> CatalogEntry {
        CatalogEntry {
            reference: reference.to_string(),
            size1: "54".to_string(),
            size2: "18".to_string(),
            size3: "145".to_string(),
            colors,
        }
    }

    #[test]
    fn test_stats_and_owner_lookup() {
        let catalog = Catalog {
            version: CATALOG_VERSION,
            entries: vec![
                entry("0037", vec![group("C4", "a.jpg", &["b.jpg"]), group("C9", "c.jpg", &[])]),
                entry("0100", vec![group("C1", "d.jpg", &["e.jpg", "f.jpg"])]),
            ],
        };

        let stats = catalog.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.color_groups, 3);
        assert_eq!(stats.files, 6);

        assert_eq!(catalog.owner_of("b.jpg"), Some(("0037", "C4")));
        assert_eq!(catalog.owner_of("f.jpg"), Some(("0100", "C1")));
        assert_eq!(catalog.owner_of("z.jpg"), None);
        assert!(catalog.check_invariants().is_ok());
    }

    #[test]
    fn test_check_invariants_detects_cross_attribution() {
        let catalog = Catalog {
            version: CATALOG_VERSION,
            entries: vec![
                entry("0037", vec![group("C4", "a.jpg", &[])]),
                entry("0100", vec![group("C1", "d.jpg", &["a.jpg"])]),
            ],
        };
        let err = catalog.check_invariants().unwrap_err();
        assert!(err.contains("a.jpg"));
    }

    #[test]
    fn test_check_invariants_detects_duplicate_color() {
        let catalog = Catalog {
            version: CATALOG_VERSION,
            entries: vec![entry(
                "0037",
                vec![group("C4", "a.jpg", &[]), group("C4", "b.jpg", &[])],
            )],
        };
        assert!(catalog.check_invariants().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let catalog = Catalog {
            version: CATALOG_VERSION,
            entries: vec![entry("0037", vec![group("C4", "a.jpg", &["b.jpg"])])],
        };
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["entries"][0]["reference"], "0037");
        assert_eq!(json["entries"][0]["colors"][0]["key_file"], "a.jpg");
        assert_eq!(json["entries"][0]["colors"][0]["additional_files"][0], "b.jpg");
    }
}
