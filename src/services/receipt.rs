//! Receipt uploads and their link to expenses
//!
//! An expense carries at most one receipt. Linking a new receipt to an
//! expense leaves the previous one stored but unattached.

use std::path::Path;

use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::receipt::content_type_for;
use crate::models::{ExpenseId, Receipt, ReceiptId, UserId};
use crate::storage::Storage;

use super::pick_unique;

pub struct ReceiptService<'a> {
    storage: &'a Storage,
}

impl<'a> ReceiptService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Copy a file into the receipt store, optionally attaching it
    pub fn upload(
        &self,
        source: &Path,
        expense_id: Option<ExpenseId>,
        uploaded_by: UserId,
    ) -> HalfsiesResult<Receipt> {
        let metadata = std::fs::metadata(source).map_err(|_| {
            HalfsiesError::Validation(format!("Cannot read file {}", source.display()))
        })?;
        if !metadata.is_file() {
            return Err(HalfsiesError::Validation(format!(
                "{} is not a file",
                source.display()
            )));
        }

        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let content_type = content_type_for(&extension).ok_or_else(|| {
            HalfsiesError::Validation(format!(
                "Unsupported receipt type '{}': use jpg, jpeg, png, gif, webp, heic or pdf",
                extension
            ))
        })?;

        let size = metadata.len();
        let max = self.storage.settings().max_receipt_bytes;
        if size == 0 {
            return Err(HalfsiesError::Validation("Receipt file is empty".into()));
        }
        if size > max {
            return Err(HalfsiesError::Validation(format!(
                "Receipt is {} bytes; the limit is {} bytes",
                size, max
            )));
        }
        if let Some(expense_id) = expense_id {
            if !self.storage.expenses.contains(expense_id)? {
                return Err(HalfsiesError::expense_not_found(expense_id.to_string()));
            }
        }

        let original_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("receipt.{}", extension));
        let receipt = Receipt::new(original_name, &extension, content_type, size, uploaded_by);
        self.storage.blobs.store(source, &receipt.stored_name)?;

        self.storage.receipts.upsert(receipt.clone())?;
        self.storage.receipts.save()?;
        self.storage.log_create(
            EntityType::Receipt,
            receipt.id.to_string(),
            Some(receipt.original_name.clone()),
            &receipt,
        )?;
        info!(receipt = %receipt.id, size, "stored receipt");

        match expense_id {
            Some(expense_id) => self.attach(receipt.id, expense_id),
            None => Ok(receipt),
        }
    }

    pub fn get(&self, id: ReceiptId) -> HalfsiesResult<Option<Receipt>> {
        self.storage.receipts.get(id)
    }

    pub fn find(&self, identifier: &str) -> HalfsiesResult<Option<Receipt>> {
        pick_unique(
            self.storage.receipts.find_by_identifier(identifier)?,
            "Receipt",
            identifier,
        )
    }

    fn require(&self, id: ReceiptId) -> HalfsiesResult<Receipt> {
        self.get(id)?
            .ok_or_else(|| HalfsiesError::receipt_not_found(id.to_string()))
    }

    /// Receipts, newest first
    pub fn list(&self, unattached_only: bool) -> HalfsiesResult<Vec<Receipt>> {
        let mut receipts = self
            .storage
            .receipts
            .filter(|r| !unattached_only || !r.is_attached())?;
        receipts.reverse();
        Ok(receipts)
    }

    /// Link a receipt to an expense, replacing any receipt it had
    pub fn attach(&self, id: ReceiptId, expense_id: ExpenseId) -> HalfsiesResult<Receipt> {
        let mut receipt = self.require(id)?;
        let mut expense = self
            .storage
            .expenses
            .get(expense_id)?
            .ok_or_else(|| HalfsiesError::expense_not_found(expense_id.to_string()))?;

        // Unlink the receipt from a previous expense
        if let Some(previous) = receipt.expense_id.filter(|e| *e != expense_id) {
            self.storage.expenses.update_where(
                |e| e.id == previous && e.receipt_id == Some(id),
                |e| {
                    e.receipt_id = None;
                    e.touch();
                },
            )?;
        }
        // Unlink the expense's previous receipt
        if let Some(old) = expense.receipt_id.filter(|r| *r != id) {
            self.storage
                .receipts
                .update_where(|r| r.id == old, |r| r.expense_id = None)?;
            debug!(receipt = %old, "detached replaced receipt");
        }

        let before = receipt.clone();
        receipt.expense_id = Some(expense_id);
        expense.receipt_id = Some(id);
        expense.touch();

        self.storage.receipts.upsert(receipt.clone())?;
        self.storage.expenses.upsert(expense)?;
        self.storage.receipts.save()?;
        self.storage.expenses.save()?;
        self.storage.log_update(
            EntityType::Receipt,
            receipt.id.to_string(),
            Some(receipt.original_name.clone()),
            &before,
            &receipt,
        )?;
        Ok(receipt)
    }

    /// Remove a receipt's link to its expense
    pub fn detach(&self, id: ReceiptId) -> HalfsiesResult<Receipt> {
        let mut receipt = self.require(id)?;
        let Some(expense_id) = receipt.expense_id else {
            return Ok(receipt);
        };

        let before = receipt.clone();
        receipt.expense_id = None;
        self.storage.expenses.update_where(
            |e| e.id == expense_id && e.receipt_id == Some(id),
            |e| {
                e.receipt_id = None;
                e.touch();
            },
        )?;

        self.storage.receipts.upsert(receipt.clone())?;
        self.storage.receipts.save()?;
        self.storage.expenses.save()?;
        self.storage.log_update(
            EntityType::Receipt,
            receipt.id.to_string(),
            Some(receipt.original_name.clone()),
            &before,
            &receipt,
        )?;
        Ok(receipt)
    }

    /// Copy a stored receipt to `destination`
    ///
    /// A directory destination receives the file under its original name.
    pub fn download(&self, id: ReceiptId, destination: &Path) -> HalfsiesResult<std::path::PathBuf> {
        let receipt = self.require(id)?;
        let target = if destination.is_dir() {
            destination.join(&receipt.original_name)
        } else {
            destination.to_path_buf()
        };
        self.storage.blobs.copy_out(&receipt.stored_name, &target)?;
        Ok(target)
    }

    /// Delete a receipt, its file and its expense link
    pub fn delete(&self, id: ReceiptId) -> HalfsiesResult<Receipt> {
        let receipt = self.require(id)?;

        self.storage.expenses.update_where(
            |e| e.receipt_id == Some(id),
            |e| {
                e.receipt_id = None;
                e.touch();
            },
        )?;
        self.storage.blobs.remove(&receipt.stored_name)?;
        self.storage.receipts.delete(id)?;

        self.storage.expenses.save()?;
        self.storage.receipts.save()?;
        self.storage.log_delete(
            EntityType::Receipt,
            receipt.id.to_string(),
            Some(receipt.original_name.clone()),
            &receipt,
        )?;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::services::test_support::{category_id, date, household};
    use crate::services::{CreateExpenseInput, ExpenseService};
    use std::fs;
    use tempfile::TempDir;

    fn expense(storage: &Storage, payer: UserId) -> ExpenseId {
        ExpenseService::new(storage)
            .create(
                CreateExpenseInput::new(
                    "Hardware",
                    Money::from_cents(4599),
                    date(2025, 7, 1),
                    category_id(storage, "Household"),
                    payer,
                ),
                payer,
            )
            .unwrap()
            .id
    }

    fn file(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_upload_validates_type_and_size() {
        let (storage, alex, _sam, _temp) = household();
        let files = TempDir::new().unwrap();
        let service = ReceiptService::new(&storage);

        let exe = file(&files, "virus.exe", b"MZ");
        assert!(service.upload(&exe, None, alex.id).unwrap_err().is_validation());

        let empty = file(&files, "empty.png", b"");
        assert!(service.upload(&empty, None, alex.id).unwrap_err().is_validation());

        let missing = files.path().join("missing.pdf");
        assert!(service.upload(&missing, None, alex.id).unwrap_err().is_validation());

        let scan = file(&files, "Scan.JPG", b"jpeg data");
        let receipt = service.upload(&scan, None, alex.id).unwrap();
        assert_eq!(receipt.content_type, "image/jpeg");
        assert_eq!(receipt.size_bytes, 9);
        assert!(storage.blobs.exists(&receipt.stored_name));
    }

    #[test]
    fn test_upload_replaces_previous_link() {
        let (storage, alex, _sam, _temp) = household();
        let files = TempDir::new().unwrap();
        let service = ReceiptService::new(&storage);
        let expense_id = expense(&storage, alex.id);

        let first = service
            .upload(&file(&files, "a.png", b"one"), Some(expense_id), alex.id)
            .unwrap();
        let second = service
            .upload(&file(&files, "b.pdf", b"two"), Some(expense_id), alex.id)
            .unwrap();

        let expense = storage.expenses.get(expense_id).unwrap().unwrap();
        assert_eq!(expense.receipt_id, Some(second.id));
        assert!(!service.get(first.id).unwrap().unwrap().is_attached());
        assert_eq!(service.list(true).unwrap().len(), 1);
        assert_eq!(service.list(false).unwrap().len(), 2);
    }

    #[test]
    fn test_detach_download_and_delete() {
        let (storage, alex, _sam, _temp) = household();
        let files = TempDir::new().unwrap();
        let service = ReceiptService::new(&storage);
        let expense_id = expense(&storage, alex.id);
        let receipt = service
            .upload(&file(&files, "r.pdf", b"%PDF-1.7"), Some(expense_id), alex.id)
            .unwrap();

        let out_dir = TempDir::new().unwrap();
        let written = service.download(receipt.id, out_dir.path()).unwrap();
        assert_eq!(fs::read(written).unwrap(), b"%PDF-1.7");

        service.detach(receipt.id).unwrap();
        assert!(storage.expenses.get(expense_id).unwrap().unwrap().receipt_id.is_none());

        service.attach(receipt.id, expense_id).unwrap();
        service.delete(receipt.id).unwrap();
        assert!(storage.expenses.get(expense_id).unwrap().unwrap().receipt_id.is_none());
        assert!(!storage.blobs.exists(&receipt.stored_name));
    }

    #[test]
    fn test_deleting_expense_removes_receipt_files() {
        let (storage, alex, _sam, _temp) = household();
        let files = TempDir::new().unwrap();
        let expense_id = expense(&storage, alex.id);
        let receipt = ReceiptService::new(&storage)
            .upload(&file(&files, "r.png", b"png"), Some(expense_id), alex.id)
            .unwrap();

        ExpenseService::new(&storage).delete(expense_id).unwrap();
        assert!(storage.receipts.is_empty().unwrap());
        assert!(!storage.blobs.exists(&receipt.stored_name));
    }
}
