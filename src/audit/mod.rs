//! Change log for halfsies
//!
//! Every create, update and delete performed through the services is appended
//! to `audit.log` as one JSON object per line, with before/after snapshots and
//! a short summary of changed fields. Password hashes never reach the log.
//!
//! ```rust,ignore
//! use halfsies::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(EntityType::Expense, id.to_string(), Some(desc), &expense))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::summarize_changes;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
