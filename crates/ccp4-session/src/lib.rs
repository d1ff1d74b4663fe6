//! Sessions that drive coot and refmac5 on behalf of the host.

pub mod coot;
pub mod importer;
pub mod refmac;
pub mod state;
pub mod viewer;

pub use coot::{CootJob, CootSession, LEDGER_FILE};
pub use importer::{import_pending, volume_key, ImportContext};
pub use refmac::{RefmacJob, RefmacSession, RefmacSummary};
pub use state::{Phase, SessionState, STATE_FILE};
pub use viewer::{show_coot_session, write_scene};
