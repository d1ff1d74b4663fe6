use std::path::{Path, PathBuf};

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use ccp4_core::ArtifactKind;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Table name used when the caller does not pick one.
pub const DEFAULT_TABLE: &str = "artifacts";

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: i64,
    pub model_id: i64,
    pub file_name: String,
    pub label_name: String,
    pub kind: ArtifactKind,
    pub imported: bool,
}

/// A row to append with [`Ledger::record_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtifact {
    pub model_id: i64,
    pub file_name: String,
    pub label_name: String,
    pub kind: ArtifactKind,
    pub imported: bool,
}

pub(crate) fn ledger_error(code: &str, err: impl ToString) -> Ccp4Error {
    Ccp4Error::Ledger(ErrorInfo::new(code, err.to_string()))
}

/// Per-run artifact ledger: an append-only table plus a latest-per-model view.
///
/// The external interactive tool writes to the same file through its
/// extension script, so the column names are a shared contract.
#[derive(Debug)]
pub struct Ledger {
    conn: Connection,
    table: String,
    path: Option<PathBuf>,
}

impl Ledger {
    /// Opens (creating if needed) the ledger file at `path`.
    pub fn open(path: &Path, table: &str) -> Result<Self, Ccp4Error> {
        validate_table_name(table)?;
        let conn = Connection::open(path).map_err(|err| {
            Ccp4Error::Ledger(
                ErrorInfo::new("ccp4_ledger.open", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Ok(Self {
            conn,
            table: table.to_string(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a ledger held in memory; used by tests and dry runs.
    pub fn open_in_memory(table: &str) -> Result<Self, Ccp4Error> {
        validate_table_name(table)?;
        let conn = Connection::open_in_memory()
            .map_err(|err| ledger_error("ccp4_ledger.open", err))?;
        Ok(Self {
            conn,
            table: table.to_string(),
            path: None,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name of the derived latest-per-model view.
    pub fn view(&self) -> String {
        format!("{}_lastid", self.table)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Creates the table and view if absent. Safe to call on every run.
    pub fn ensure_schema(&self) -> Result<(), Ccp4Error> {
        let sql = format!(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS {table}(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                modelId INTEGER,
                fileName TEXT,
                labelName TEXT,
                kind INTEGER,
                imported INTEGER DEFAULT 1
            );
            CREATE VIEW IF NOT EXISTS {view} AS
                SELECT modelId, max(id) AS id
                FROM {table}
                GROUP BY modelId;
            COMMIT;",
            table = self.table,
            view = self.view(),
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|err| ledger_error("ccp4_ledger.schema", err))?;
        debug!(table = %self.table, "ledger schema ready");
        Ok(())
    }

    /// Whether the artifact table has been created yet.
    pub fn table_exists(&self) -> Result<bool, Ccp4Error> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                params![self.table],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| ledger_error("ccp4_ledger.table_exists", err))?;
        Ok(found.is_some())
    }

    /// Appends one row and returns its id. Existing rows are never touched.
    pub fn record_artifact(
        &self,
        model_id: i64,
        file_name: &str,
        label_name: &str,
        kind: ArtifactKind,
        imported: bool,
    ) -> Result<i64, Ccp4Error> {
        let sql = format!(
            "INSERT INTO {}(modelId, fileName, labelName, kind, imported) VALUES (?, ?, ?, ?, ?)",
            self.table
        );
        self.conn
            .execute(
                &sql,
                params![model_id, file_name, label_name, kind.code(), imported as i64],
            )
            .map_err(|err| {
                Ccp4Error::Ledger(
                    ErrorInfo::new("ccp4_ledger.record_artifact", err.to_string())
                        .with_context("file", file_name),
                )
            })?;
        let id = self.conn.last_insert_rowid();
        debug!(id, model_id, file_name, ?kind, imported, "ledger row recorded");
        Ok(id)
    }

    /// Appends all rows in one transaction and returns their ids.
    ///
    /// Either every row is written or none is.
    pub fn record_batch(&self, rows: &[NewArtifact]) -> Result<Vec<i64>, Ccp4Error> {
        let sql = format!(
            "INSERT INTO {}(modelId, fileName, labelName, kind, imported) VALUES (?, ?, ?, ?, ?)",
            self.table
        );
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|err| ledger_error("ccp4_ledger.record_batch", err))?;
        let mut ids = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|err| ledger_error("ccp4_ledger.record_batch", err))?;
            for row in rows {
                stmt.execute(params![
                    row.model_id,
                    row.file_name,
                    row.label_name,
                    row.kind.code(),
                    row.imported as i64
                ])
                .map_err(|err| {
                    Ccp4Error::Ledger(
                        ErrorInfo::new("ccp4_ledger.record_batch", err.to_string())
                            .with_context("file", row.file_name.as_str()),
                    )
                })?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()
            .map_err(|err| ledger_error("ccp4_ledger.record_batch", err))?;
        debug!(rows = ids.len(), table = %self.table, "ledger batch recorded");
        Ok(ids)
    }

    /// Every row in insertion order.
    pub fn records(&self) -> Result<Vec<ArtifactRecord>, Ccp4Error> {
        self.load_records(&format!(
            "SELECT id, modelId, fileName, labelName, kind, imported FROM {} ORDER BY id",
            self.table
        ))
    }

    pub(crate) fn load_records(&self, sql: &str) -> Result<Vec<ArtifactRecord>, Ccp4Error> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|err| ledger_error("ccp4_ledger.query", err))?;
        let rows = stmt
            .query_map([], |row| {
                let kind: i64 = row.get(4)?;
                let imported: i64 = row.get(5)?;
                Ok(ArtifactRecord {
                    id: row.get(0)?,
                    model_id: row.get(1)?,
                    file_name: row.get(2)?,
                    label_name: row.get(3)?,
                    kind: ArtifactKind::from_code(kind).ok_or_else(|| {
                        rusqlite::Error::IntegralValueOutOfRange(4, kind)
                    })?,
                    imported: imported != 0,
                })
            })
            .map_err(|err| ledger_error("ccp4_ledger.query", err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| ledger_error("ccp4_ledger.query", err))
    }
}

fn validate_table_name(table: &str) -> Result<(), Ccp4Error> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !table.starts_with(|ch: char| ch.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(Ccp4Error::Ledger(
            ErrorInfo::new("ccp4_ledger.table_name", "invalid ledger table name")
                .with_context("table", table)
                .with_hint("use ASCII letters, digits and underscores"),
        ))
    }
}
