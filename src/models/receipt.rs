//! Receipt metadata
//!
//! The file itself lives in the receipts directory under `stored_name`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ExpenseId, ReceiptId, UserId};

/// Extensions accepted for upload and their content types
pub const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("pdf", "application/pdf"),
];

/// Content type for a file extension, if the extension is accepted
pub fn content_type_for(extension: &str) -> Option<&'static str> {
    let extension = extension.to_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    #[serde(default)]
    pub expense_id: Option<ExpenseId>,
    /// File name as uploaded
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// File name inside the receipts directory
    pub stored_name: String,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(
        original_name: impl Into<String>,
        extension: &str,
        content_type: impl Into<String>,
        size_bytes: u64,
        uploaded_by: UserId,
    ) -> Self {
        let id = ReceiptId::new();
        Self {
            stored_name: format!("{}.{}", id.as_uuid(), extension.to_lowercase()),
            id,
            expense_id: None,
            original_name: original_name.into(),
            content_type: content_type.into(),
            size_bytes,
            uploaded_by,
            uploaded_at: Utc::now(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.expense_id.is_some()
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.original_name, self.size_bytes)
    }
}
