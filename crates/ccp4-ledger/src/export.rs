use std::fs;
use std::path::Path;

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use ccp4_core::to_canonical_json_bytes;

use crate::schema::Ledger;

/// Writes every ledger row as canonical JSON.
pub fn export_json(ledger: &Ledger, out_path: &Path) -> Result<(), Ccp4Error> {
    let records = ledger.records()?;
    let bytes = to_canonical_json_bytes(&records)?;
    fs::write(out_path, bytes).map_err(|err| {
        Ccp4Error::Ledger(
            ErrorInfo::new("ccp4_ledger.export", err.to_string())
                .with_context("path", out_path.display().to_string()),
        )
    })
}

/// Writes every ledger row as CSV with a header line.
pub fn export_csv(ledger: &Ledger, out_path: &Path) -> Result<(), Ccp4Error> {
    let mut wtr = csv::Writer::from_path(out_path).map_err(|err| {
        Ccp4Error::Ledger(
            ErrorInfo::new("ccp4_ledger.export", err.to_string())
                .with_context("path", out_path.display().to_string()),
        )
    })?;
    wtr.write_record(["id", "modelId", "fileName", "labelName", "kind", "imported"])
        .map_err(|err| Ccp4Error::Ledger(ErrorInfo::new("ccp4_ledger.export", err.to_string())))?;
    for record in ledger.records()? {
        wtr.write_record([
            record.id.to_string(),
            record.model_id.to_string(),
            record.file_name.clone(),
            record.label_name.clone(),
            record.kind.code().to_string(),
            (record.imported as i64).to_string(),
        ])
        .map_err(|err| Ccp4Error::Ledger(ErrorInfo::new("ccp4_ledger.export", err.to_string())))?;
    }
    wtr.flush()
        .map_err(|err| Ccp4Error::Ledger(ErrorInfo::new("ccp4_ledger.export", err.to_string())))
}
