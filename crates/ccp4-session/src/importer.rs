use std::path::PathBuf;

use ccp4_core::errors::Ccp4Error;
use ccp4_core::{ArtifactKind, HostOutput, VolumeRef};
use ccp4_ledger::Ledger;
use tracing::info;

/// What the importer needs to know about the session's inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportContext {
    /// Every input structure; each new structure is sourced from all of them.
    pub structures: Vec<PathBuf>,
    /// Input volumes paired, in order, with their normalized copies.
    pub volumes: Vec<(VolumeRef, PathBuf)>,
}

/// Key under which the `index`-th (from 1) volume output is registered.
pub fn volume_key(index: usize) -> String {
    format!("output3DMap_{index:04}")
}

/// Turns pending ledger rows into host outputs and flags them imported.
///
/// Structures come out one per pending row. Volumes come out one per input
/// volume, and only when at least one volume row was pending. A ledger
/// without its table yields nothing, as does a second call with no new rows.
pub fn import_pending(ledger: &Ledger, ctx: &ImportContext) -> Result<Vec<HostOutput>, Ccp4Error> {
    if !ledger.table_exists()? {
        return Ok(Vec::new());
    }

    let mut outputs: Vec<HostOutput> = ledger
        .pending_imports(ArtifactKind::AtomicStructure)?
        .into_iter()
        .map(|pending| HostOutput::AtomStruct {
            label: pending.label_name,
            file_name: PathBuf::from(pending.file_name),
            sources: ctx.structures.clone(),
        })
        .collect();
    ledger.mark_imported(ArtifactKind::AtomicStructure)?;

    if ledger.count_pending(ArtifactKind::VolumeMap)? > 0 {
        ledger.mark_imported(ArtifactKind::VolumeMap)?;
        outputs.extend(ctx.volumes.iter().enumerate().map(|(index, (input, normalized))| {
            HostOutput::Volume {
                key: volume_key(index + 1),
                file_name: normalized.clone(),
                sampling_rate: input.sampling_rate,
                origin: input.origin,
                source: input.file_name.clone(),
            }
        }));
    }

    info!(count = outputs.len(), "imported ledger outputs");
    Ok(outputs)
}
