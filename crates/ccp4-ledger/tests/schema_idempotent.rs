use ccp4_core::ArtifactKind;
use ccp4_ledger::{Ledger, DEFAULT_TABLE};
use tempfile::tempdir;

#[test]
fn ensure_schema_twice_keeps_rows() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.sqlite");
    let ledger = Ledger::open(&path, DEFAULT_TABLE).expect("open");
    assert!(!ledger.table_exists().expect("exists"));
    ledger.ensure_schema().expect("schema");
    ledger
        .record_artifact(0, "model.pdb", "model", ArtifactKind::AtomicStructure, true)
        .expect("record");
    ledger.ensure_schema().expect("schema again");
    assert!(ledger.table_exists().expect("exists"));
    assert_eq!(ledger.records().expect("records").len(), 1);
}

#[test]
fn reopened_file_sees_earlier_session() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.sqlite");
    {
        let ledger = Ledger::open(&path, DEFAULT_TABLE).expect("open");
        ledger.ensure_schema().expect("schema");
        ledger
            .record_artifact(3, "extra/map.mrc", "map", ArtifactKind::VolumeMap, false)
            .expect("record");
    }
    let ledger = Ledger::open(&path, DEFAULT_TABLE).expect("reopen");
    ledger.ensure_schema().expect("schema");
    let pending = ledger.pending_imports(ArtifactKind::VolumeMap).expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].label_name, "map");
}

#[test]
fn ids_increase_in_insertion_order() {
    let ledger = Ledger::open_in_memory(DEFAULT_TABLE).expect("open");
    ledger.ensure_schema().expect("schema");
    let a = ledger
        .record_artifact(1, "a.pdb", "a", ArtifactKind::AtomicStructure, false)
        .expect("a");
    let b = ledger
        .record_artifact(0, "b.pdb", "b", ArtifactKind::AtomicStructure, false)
        .expect("b");
    assert!(b > a);
    let ids: Vec<i64> = ledger.records().expect("records").iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn rejects_unsafe_table_names() {
    let err = Ledger::open_in_memory("pdb; DROP TABLE x").expect_err("invalid");
    assert_eq!(err.info().code, "ccp4_ledger.table_name");
    assert!(Ledger::open_in_memory("9lives").is_err());
}
