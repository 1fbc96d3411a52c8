use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use super::skip_set::SkipSet;
use super::types::{Batch, SourceItem};

/// Errors raised while enumerating the source directory.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to read source directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn has_recognized_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Enumerate image files directly inside `dir` (non-recursive), sorted by name.
pub async fn scan_source(dir: &Path, extensions: &[String]) -> Result<Vec<SourceItem>, QueueError> {
    let read_err = |source| QueueError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(read_err)?;
    let mut items = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let is_file = match entry.file_type().await {
            Ok(ft) => ft.is_file(),
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", path, e);
                false
            }
        };
        if !is_file || !has_recognized_extension(&path, extensions) {
            continue;
        }
        // Non UTF-8 names cannot round-trip through the catalog
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            tracing::warn!("Skipping file with non UTF-8 name: {:?}", path);
            continue;
        };
        items.push(SourceItem::new(name, path));
    }

    items.sort();
    Ok(items)
}

/// Every source item not in the skip set, in name order.
pub async fn build_backlog(
    dir: &Path,
    extensions: &[String],
    skip: &SkipSet<'_>,
) -> Result<Vec<SourceItem>, QueueError> {
    let items = scan_source(dir, extensions).await?;
    Ok(items.into_iter().filter(|i| !skip.contains(&i.name)).collect())
}

/// Slice a backlog into consecutive batches of at most `batch_size` items.
pub fn into_batches(backlog: Vec<SourceItem>, batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1);
    let mut batches = Vec::with_capacity(backlog.len().div_ceil(size));
    let mut current = Vec::with_capacity(size);

    for item in backlog {
        current.push(item);
        if current.len() == size {
            batches.push(Batch::new(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        batches.push(Batch::new(current));
    }

    batches
}
