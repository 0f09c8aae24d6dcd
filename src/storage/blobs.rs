//! Receipt file store
//!
//! Uploaded files are copied into the receipts directory under their stored
//! name. Metadata lives in `receipts.json`; this type only touches bytes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HalfsiesError, HalfsiesResult};

pub struct ReceiptStore {
    dir: PathBuf,
}

impl ReceiptStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, stored_name: &str) -> PathBuf {
        self.dir.join(stored_name)
    }

    pub fn exists(&self, stored_name: &str) -> bool {
        self.path_for(stored_name).is_file()
    }

    /// Copy `source` into the store, returning the number of bytes written
    pub fn store(&self, source: &Path, stored_name: &str) -> HalfsiesResult<u64> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            HalfsiesError::Storage(format!("Failed to create receipts directory: {}", e))
        })?;
        fs::copy(source, self.path_for(stored_name)).map_err(|e| {
            HalfsiesError::Storage(format!(
                "Failed to store receipt {}: {}",
                source.display(),
                e
            ))
        })
    }

    /// Copy a stored file out to `destination`
    pub fn copy_out(&self, stored_name: &str, destination: &Path) -> HalfsiesResult<u64> {
        let source = self.path_for(stored_name);
        if !source.is_file() {
            return Err(HalfsiesError::Storage(format!(
                "Receipt file is missing: {}",
                source.display()
            )));
        }
        fs::copy(&source, destination).map_err(|e| {
            HalfsiesError::Io(format!(
                "Failed to write {}: {}",
                destination.display(),
                e
            ))
        })
    }

    /// Remove a stored file; a file that is already gone is not an error
    pub fn remove(&self, stored_name: &str) -> HalfsiesResult<()> {
        match fs::remove_file(self.path_for(stored_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HalfsiesError::Storage(format!(
                "Failed to remove receipt file {}: {}",
                stored_name, e
            ))),
        }
    }

    /// Names of all regular files in the store, sorted
    pub fn list_files(&self) -> HalfsiesResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_copy_out_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = ReceiptStore::new(temp_dir.path().join("receipts"));
        let source = temp_dir.path().join("scan.png");
        fs::write(&source, b"png bytes").unwrap();

        assert_eq!(store.store(&source, "abc.png").unwrap(), 9);
        assert!(store.exists("abc.png"));
        assert_eq!(store.list_files().unwrap(), vec!["abc.png".to_string()]);

        let out = temp_dir.path().join("out.png");
        store.copy_out("abc.png", &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"png bytes");

        store.remove("abc.png").unwrap();
        store.remove("abc.png").unwrap();
        assert!(!store.exists("abc.png"));
    }

    #[test]
    fn test_copy_out_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ReceiptStore::new(temp_dir.path().to_path_buf());
        let result = store.copy_out("gone.pdf", &temp_dir.path().join("x.pdf"));
        assert!(matches!(result, Err(HalfsiesError::Storage(_))));
    }
}
