use std::collections::HashSet;

use crate::catalog::Catalog;

/// Names that failed during the current process invocation.
///
/// Never persisted: a failure excludes the item for the rest of this run
/// only, so it becomes eligible again on the next invocation.
#[derive(Debug, Clone, Default)]
pub struct SessionFailures {
    names: HashSet<String>,
}

impl SessionFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Read-time union of persisted successes and session failures.
///
/// The persisted half is derived from the catalog on every build; the two
/// sources are never merged into a single store.
#[derive(Debug)]
pub struct SkipSet<'a> {
    persisted: HashSet<String>,
    session: &'a SessionFailures,
}

impl<'a> SkipSet<'a> {
    pub fn build(catalog: &Catalog, session: &'a SessionFailures) -> Self {
        Self {
            persisted: catalog.attributed_files(),
            session,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.persisted.contains(name) || self.session.contains(name)
    }

    /// Number of names excluded because they are already catalogued.
    pub fn persisted_len(&self) -> usize {
        self.persisted.len()
    }

    pub fn session_len(&self) -> usize {
        self.session.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{merge_result, MergeInput, ProductFields};

    fn fields(reference: &str, color: &str) -> ProductFields {
        ProductFields {
            reference: reference.to_string(),
            size1: "54".to_string(),
            size2: "18".to_string(),
            size3: "145".to_string(),
            color: color.to_string(),
        }
    }

    #[test]
    fn test_skip_set_unions_catalog_and_session() {
        let mut catalog = Catalog::default();
        merge_result(
            &mut catalog,
            MergeInput {
                fields: fields("0037", "C4"),
                key_file: "a.jpg".to_string(),
                additional_files: vec!["b.jpg".to_string()],
            },
        )
        .unwrap();

        let mut session = SessionFailures::new();
        session.insert("broken.jpg");

        let skip = SkipSet::build(&catalog, &session);
        assert!(skip.contains("a.jpg"));
        assert!(skip.contains("b.jpg"));
        assert!(skip.contains("broken.jpg"));
        assert!(!skip.contains("c.jpg"));
        assert_eq!(skip.persisted_len(), 2);
        assert_eq!(skip.session_len(), 1);
    }

    #[test]
    fn test_session_failures_are_independent_of_catalog() {
        let catalog = Catalog::default();
        let mut session = SessionFailures::new();
        session.extend(["x.jpg", "y.jpg"]);
        assert!(!session.insert("x.jpg"));

        let skip = SkipSet::build(&catalog, &session);
        assert_eq!(skip.persisted_len(), 0);
        assert!(skip.contains("y.jpg"));
    }
}
