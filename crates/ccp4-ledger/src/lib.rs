//! Output ledger shared by the interactive tool and the host-side importer.

pub mod export;
pub mod query;
pub mod schema;

pub use export::{export_csv, export_json};
pub use query::PendingImport;
pub use schema::{ArtifactRecord, Ledger, NewArtifact, DEFAULT_TABLE};
