//! First-run setup

use tracing::info;

use crate::error::HalfsiesResult;
use crate::models::{Category, DEFAULT_CATEGORIES};

use super::Storage;

/// Create the directory layout, persist settings and seed default categories
///
/// Safe to run repeatedly: categories are only seeded into an empty
/// collection. Returns the number of categories created.
pub fn initialize_storage(storage: &Storage) -> HalfsiesResult<usize> {
    storage.paths().ensure_directories()?;

    if !storage.paths().settings_file().exists() {
        storage.settings().save(storage.paths())?;
    }

    if !storage.categories.is_empty()? {
        return Ok(0);
    }

    for (name, icon) in DEFAULT_CATEGORIES {
        storage
            .categories
            .upsert(Category::with_icon(*name, *icon))?;
    }
    storage.categories.save()?;

    info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    Ok(DEFAULT_CATEGORIES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HalfsiesPaths;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(HalfsiesPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();

        assert_eq!(initialize_storage(&storage).unwrap(), DEFAULT_CATEGORIES.len());
        assert!(storage.paths().is_initialized());
        assert_eq!(initialize_storage(&storage).unwrap(), 0);
        assert_eq!(storage.categories.len().unwrap(), DEFAULT_CATEGORIES.len());
    }
}
