//! Types crossing the oracle boundary.

use serde::{Deserialize, Serialize};

use crate::catalog::ProductFields;

/// One photograph submitted to the oracle.
#[derive(Debug, Clone)]
pub struct BatchImage {
    pub name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl BatchImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// What the oracle reported for one batch.
///
/// `key_name` and `fields` are both present when a code was found; a result
/// missing either means no code was found in the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub key_name: Option<String>,
    pub fields: Option<ProductFields>,
    /// Batch members showing the same product, normally including the key.
    #[serde(default)]
    pub matched_names: Vec<String>,
}

impl ClassificationResult {
    /// A result reporting that no image in the batch carried a code.
    pub fn no_key() -> Self {
        Self::default()
    }

    pub fn found(
        key_name: impl Into<String>,
        fields: ProductFields,
        matched_names: Vec<String>,
    ) -> Self {
        Self {
            key_name: Some(key_name.into()),
            fields: Some(fields),
            matched_names,
        }
    }

    pub fn has_key(&self) -> bool {
        self.key_name.is_some() && self.fields.is_some()
    }
}
