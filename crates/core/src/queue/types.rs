use std::path::PathBuf;

/// A candidate photograph in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceItem {
    /// File name, unique within the source directory.
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

impl SourceItem {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A contiguous, bounded slice of the backlog submitted to the oracle in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub items: Vec<SourceItem>,
}

impl Batch {
    pub fn new(items: Vec<SourceItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// File names in batch order.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|i| i.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&SourceItem> {
        self.items.iter().find(|i| i.name == name)
    }
}
