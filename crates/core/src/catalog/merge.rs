//! Folding one classification result into the catalog.

use thiserror::Error;

use super::types::{Catalog, CatalogEntry, ColorGroup, ProductFields};

/// A resolved classification ready to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInput {
    pub fields: ProductFields,
    pub key_file: String,
    /// Matched files other than the key, in batch order.
    pub additional_files: Vec<String>,
}

/// What a successful merge did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new entry was created for the reference.
    NewReference { reference: String },
    /// A new color group was appended to an existing entry.
    NewColor { reference: String },
    /// An existing color group was overwritten (last write wins).
    ///
    /// `displaced` lists files of the previous group that are no longer
    /// attributed anywhere.
    ColorReplaced {
        reference: String,
        displaced: Vec<String>,
    },
}

impl MergeOutcome {
    pub fn reference(&self) -> &str {
        match self {
            Self::NewReference { reference }
            | Self::NewColor { reference }
            | Self::ColorReplaced { reference, .. } => reference,
        }
    }

    pub fn displaced(&self) -> &[String] {
        match self {
            Self::ColorReplaced { displaced, .. } => displaced,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The reference is empty once path separators are removed.
    #[error("Reference '{raw}' is empty after sanitizing")]
    EmptyReference { raw: String },

    /// A file already belongs to a different color group.
    #[error("File '{file}' is already attributed to {reference}/{color}")]
    AlreadyAttributed {
        file: String,
        reference: String,
        color: String,
    },
}

/// Make a reference or color usable as a single path component.
///
/// Path separators become underscores and surrounding whitespace is removed.
/// Colors are stored in this form too, so two colors never share an
/// organized file name.
pub fn sanitize_reference(raw: &str) -> String {
    raw.replace(['/', '\\'], "_").trim().to_string()
}

/// Apply one classification to the catalog.
///
/// New references get a fresh entry whose sizes are fixed from this
/// observation. For a known reference, an unseen color is appended and a
/// seen color is overwritten with the new key and additional files.
///
/// The catalog is left untouched when an error is returned.
pub fn merge_result(catalog: &mut Catalog, input: MergeInput) -> Result<MergeOutcome, MergeError> {
    let reference = sanitize_reference(&input.fields.reference);
    if reference.is_empty() {
        return Err(MergeError::EmptyReference {
            raw: input.fields.reference,
        });
    }
    let color = sanitize_reference(&input.fields.color);

    let mut additional_files = Vec::with_capacity(input.additional_files.len());
    for file in input.additional_files {
        if file != input.key_file && !additional_files.contains(&file) {
            additional_files.push(file);
        }
    }
    let group = ColorGroup {
        color: color.clone(),
        key_file: input.key_file,
        additional_files,
    };

    for file in group.files() {
        if let Some((owner_ref, owner_color)) = catalog.owner_of(file) {
            if owner_ref != reference || owner_color != color {
                return Err(MergeError::AlreadyAttributed {
                    file: file.to_string(),
                    reference: owner_ref.to_string(),
                    color: owner_color.to_string(),
                });
            }
        }
    }

    let Some(entry) = catalog.entries.iter_mut().find(|e| e.reference == reference) else {
        catalog.entries.push(CatalogEntry {
            reference: reference.clone(),
            size1: input.fields.size1,
            size2: input.fields.size2,
            size3: input.fields.size3,
            colors: vec![group],
        });
        return Ok(MergeOutcome::NewReference { reference });
    };

    if (entry.size1.as_str(), entry.size2.as_str(), entry.size3.as_str())
        != (
            input.fields.size1.as_str(),
            input.fields.size2.as_str(),
            input.fields.size3.as_str(),
        )
    {
        tracing::warn!(
            reference = %reference,
            "Ignoring sizes {}/{}/{}, keeping first observation {}/{}/{}",
            input.fields.size1,
            input.fields.size2,
            input.fields.size3,
            entry.size1,
            entry.size2,
            entry.size3
        );
    }

    match entry.colors.iter_mut().find(|g| g.color == color) {
        None => {
            entry.colors.push(group);
            Ok(MergeOutcome::NewColor { reference })
        }
        Some(existing) => {
            let displaced = existing
                .files()
                .filter(|f| !group.contains(f))
                .map(String::from)
                .collect();
            *existing = group;
            Ok(MergeOutcome::ColorReplaced {
                reference,
                displaced,
            })
        }
    }
}
