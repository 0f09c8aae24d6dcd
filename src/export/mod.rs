//! Data export
//!
//! - CSV: expenses and settlements for spreadsheets
//! - JSON / YAML: the whole database, for backup or inspection

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::{export_expenses_csv, export_settlements_csv};
pub use json::{export_full_json, read_json_export, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, read_yaml_export};
