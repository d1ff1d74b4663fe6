use ccp4_core::errors::Ccp4Error;
use ccp4_core::ArtifactKind;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{ledger_error, ArtifactRecord, Ledger};

/// A row waiting to be registered in the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingImport {
    pub file_name: String,
    pub label_name: String,
}

impl Ledger {
    /// Current file of every model of `kind`, by ascending model id.
    ///
    /// Each call runs a fresh query, so the result is an independent snapshot.
    pub fn most_recent_per_model(&self, kind: ArtifactKind) -> Result<Vec<String>, Ccp4Error> {
        let sql = format!(
            "SELECT t.fileName
             FROM {table} AS t JOIN {view} AS v ON t.id = v.id
             WHERE t.kind = ?
             ORDER BY t.modelId",
            table = self.table(),
            view = self.view(),
        );
        let mut stmt = self
            .conn()
            .prepare(&sql)
            .map_err(|err| ledger_error("ccp4_ledger.most_recent", err))?;
        let rows = stmt
            .query_map(params![kind.code()], |row| row.get::<_, String>(0))
            .map_err(|err| ledger_error("ccp4_ledger.most_recent", err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| ledger_error("ccp4_ledger.most_recent", err))
    }

    /// Rows of `kind` not yet registered in the host, in insertion order.
    pub fn pending_imports(&self, kind: ArtifactKind) -> Result<Vec<PendingImport>, Ccp4Error> {
        let sql = format!(
            "SELECT fileName, labelName FROM {} WHERE imported = 0 AND kind = ? ORDER BY id",
            self.table()
        );
        let mut stmt = self
            .conn()
            .prepare(&sql)
            .map_err(|err| ledger_error("ccp4_ledger.pending", err))?;
        let rows = stmt
            .query_map(params![kind.code()], |row| {
                Ok(PendingImport {
                    file_name: row.get(0)?,
                    label_name: row.get(1)?,
                })
            })
            .map_err(|err| ledger_error("ccp4_ledger.pending", err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| ledger_error("ccp4_ledger.pending", err))
    }

    pub fn count_pending(&self, kind: ArtifactKind) -> Result<usize, Ccp4Error> {
        let sql = format!(
            "SELECT count(*) FROM {} WHERE imported = 0 AND kind = ?",
            self.table()
        );
        let count: i64 = self
            .conn()
            .query_row(&sql, params![kind.code()], |row| row.get(0))
            .map_err(|err| ledger_error("ccp4_ledger.count_pending", err))?;
        Ok(count as usize)
    }

    /// Flags every pending row of `kind` as imported; returns how many flipped.
    pub fn mark_imported(&self, kind: ArtifactKind) -> Result<usize, Ccp4Error> {
        let sql = format!(
            "UPDATE {} SET imported = 1 WHERE imported = 0 AND kind = ?",
            self.table()
        );
        let changed = self
            .conn()
            .execute(&sql, params![kind.code()])
            .map_err(|err| ledger_error("ccp4_ledger.mark_imported", err))?;
        debug!(?kind, changed, "ledger rows marked imported");
        Ok(changed)
    }

    /// Rows already registered in the host, in insertion order.
    pub fn imported_records(&self) -> Result<Vec<ArtifactRecord>, Ccp4Error> {
        self.load_records(&format!(
            "SELECT id, modelId, fileName, labelName, kind, imported FROM {} WHERE imported = 1 ORDER BY id",
            self.table()
        ))
    }
}
