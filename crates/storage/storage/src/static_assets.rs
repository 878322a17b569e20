use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// A static file scheduled for mirroring: the object key it will be stored
/// under and the local path it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    /// Relative, `/`-separated object key (e.g. `"css/stock/theme-stock.css"`).
    pub key: String,
    /// Local file the content is read from.
    pub path: PathBuf,
}

/// Collect the files to mirror from a base static tree plus an optional
/// override tree layered on top.
///
/// Keys are paths relative to the tree root with `/` separators. When both
/// trees contain the same relative path, the override tree's file wins.
/// Results are sorted by key for deterministic upload order.
pub fn collect_static_files(
    base_dir: &Path,
    override_dir: Option<&Path>,
) -> Result<Vec<StaticAsset>, StorageError> {
    let mut by_key = BTreeMap::new();
    walk_tree(base_dir, base_dir, &mut by_key)?;

    if let Some(override_dir) = override_dir {
        if override_dir.exists() {
            walk_tree(override_dir, override_dir, &mut by_key)?;
        }
    }

    Ok(by_key
        .into_iter()
        .map(|(key, path)| StaticAsset { key, path })
        .collect())
}

fn walk_tree(
    root: &Path,
    dir: &Path,
    by_key: &mut BTreeMap<String, PathBuf>,
) -> Result<(), StorageError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| StorageError::StaticSync(format!("read_dir {}: {e}", dir.display())))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| StorageError::StaticSync(format!("read_dir entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            walk_tree(root, &path, by_key)?;
        } else {
            let relative = path.strip_prefix(root).map_err(|e| {
                StorageError::StaticSync(format!("path {} outside root: {e}", path.display()))
            })?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            by_key.insert(key, path);
        }
    }
    Ok(())
}

/// Guess a content type from a file path's extension.
///
/// Falls back to `application/octet-stream` for unknown extensions, matching
/// what object stores default to anyway.
#[must_use]
pub fn guess_content_type(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
}
