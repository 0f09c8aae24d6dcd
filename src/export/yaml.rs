//! Full database export to YAML

use std::io::Write;

use crate::error::{HalfsiesError, HalfsiesResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

/// Write the full export as YAML behind a short comment header
pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> HalfsiesResult<()> {
    let export = FullExport::from_storage(storage)?;

    writeln!(writer, "# Halfsies full export")?;
    writeln!(writer, "# Generated: {}", export.exported_at)?;
    writeln!(writer, "# App version: {}", export.app_version)?;
    writeln!(writer)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| HalfsiesError::Export(e.to_string()))
}

/// Parse and validate a YAML export
pub fn read_yaml_export(yaml: &str) -> HalfsiesResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml).map_err(|e| HalfsiesError::Export(e.to_string()))?;
    export.validate().map_err(HalfsiesError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::household;
    use crate::services::LocationService;

    #[test]
    fn test_yaml_export_reads_back() {
        let (storage, _alex, _sam, _temp) = household();
        LocationService::new(&storage)
            .create("Farmers market", Some("Dock St".into()))
            .unwrap();

        let mut out = Vec::new();
        export_full_yaml(&storage, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# Halfsies full export"));
        assert!(text.contains("Farmers market"));

        let export = read_yaml_export(&text).unwrap();
        assert_eq!(export.metadata.location_count, 1);
        assert_eq!(export.users.len(), 2);
    }
}
