//! JSON file catalog store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::types::{Catalog, CatalogError, CATALOG_VERSION};
use super::CatalogStore;

/// Catalog persisted as a single pretty-printed JSON document.
///
/// Saves go through a temporary sibling file followed by a rename, so the
/// document on disk is always either the previous or the new version.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Move an unparseable catalog aside so the next save does not destroy it.
    fn quarantine(&self) {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        let target = self.path.with_file_name(name);

        match fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!("Preserved unreadable catalog as {:?}", target),
            Err(e) => tracing::warn!("Could not preserve unreadable catalog {:?}: {}", self.path, e),
        }
    }

    /// Raw catalog bytes, or `None` when no catalog has been written yet.
    fn read_bytes(&self) -> Result<Option<Vec<u8>>, CatalogError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CatalogError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Load without touching the file on disk.
    ///
    /// A malformed document is reported as [`CatalogError::Malformed`]
    /// instead of being quarantined.
    pub fn inspect(&self) -> Result<Catalog, CatalogError> {
        let Some(bytes) = self.read_bytes()? else {
            return Ok(Catalog::default());
        };
        Self::parse(&bytes).map_err(|reason| CatalogError::Malformed {
            path: self.path.clone(),
            reason,
        })
    }

    fn parse(bytes: &[u8]) -> Result<Catalog, String> {
        let catalog: Catalog = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if catalog.version != CATALOG_VERSION {
            return Err(format!(
                "unsupported catalog version {} (expected {})",
                catalog.version, CATALOG_VERSION
            ));
        }
        Ok(catalog)
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<Catalog, CatalogError> {
        let Some(bytes) = self.read_bytes()? else {
            return Ok(Catalog::default());
        };

        match Self::parse(&bytes) {
            Ok(catalog) => {
                if let Err(violation) = catalog.check_invariants() {
                    tracing::warn!("Catalog {:?} violates an invariant: {}", self.path, violation);
                }
                Ok(catalog)
            }
            Err(e) => {
                tracing::warn!("Catalog {:?} is malformed, starting fresh: {}", self.path, e);
                self.quarantine();
                Ok(Catalog::default())
            }
        }
    }

    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(catalog)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;

        let write_err = |source| CatalogError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(write_err)?;
        Ok(())
    }
}
