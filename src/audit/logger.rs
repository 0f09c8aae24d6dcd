//! Append-only JSONL writer and reader for `audit.log`

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{HalfsiesError, HalfsiesResult};

use super::entry::{AuditEntry, EntityType};

pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one entry and flush it
    pub fn log(&self, entry: &AuditEntry) -> HalfsiesResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| HalfsiesError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| HalfsiesError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| HalfsiesError::Io(format!("Failed to write audit entry: {}", e)))?;
        file.flush()
            .map_err(|e| HalfsiesError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// All entries, oldest first
    pub fn read_all(&self) -> HalfsiesResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| HalfsiesError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                HalfsiesError::Io(format!("Failed to read audit log line {}: {}", index + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                HalfsiesError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    index + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// The most recent `count` entries, optionally limited to one entity type
    pub fn read_recent(
        &self,
        count: usize,
        entity_type: Option<EntityType>,
    ) -> HalfsiesResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        if let Some(kind) = entity_type {
            entries.retain(|entry| entry.entity_type == kind);
        }
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    fn entry(kind: EntityType, n: usize) -> AuditEntry {
        AuditEntry::create(kind, format!("id-{}", n), None, &json!({"n": n}))
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let (logger, _temp) = logger();
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_appends_in_order() {
        let (logger, _temp) = logger();
        for n in 0..3 {
            logger.log(&entry(EntityType::Expense, n)).unwrap();
        }

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].entity_id, "id-0");
        assert_eq!(entries[2].entity_id, "id-2");
    }

    #[test]
    fn test_read_recent_filters_by_type() {
        let (logger, _temp) = logger();
        logger.log(&entry(EntityType::Expense, 0)).unwrap();
        logger.log(&entry(EntityType::Settlement, 1)).unwrap();
        logger.log(&entry(EntityType::Expense, 2)).unwrap();
        logger.log(&entry(EntityType::Expense, 3)).unwrap();

        let recent = logger.read_recent(2, Some(EntityType::Expense)).unwrap();
        let ids: Vec<_> = recent.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["id-2", "id-3"]);

        assert_eq!(logger.read_recent(10, None).unwrap().len(), 4);
    }

    #[test]
    fn test_corrupt_line_reports_line_number() {
        let (logger, _temp) = logger();
        logger.log(&entry(EntityType::User, 0)).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(logger.path())
            .and_then(|mut f| writeln!(f, "not json"))
            .unwrap();

        let err = logger.read_all().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
