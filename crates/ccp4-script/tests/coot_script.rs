use std::fs;
use std::path::Path;

use ccp4_core::ArtifactKind;
use ccp4_ledger::Ledger;
use ccp4_script::coot::{CootScriptContext, SCRIPT_NAME};
use ccp4_script::support::COOT_INI_DEFAULT;
use ccp4_script::{render_extension_script, write_extension_script};
use proptest::prelude::*;
use tempfile::tempdir;

fn context() -> CootScriptContext {
    CootScriptContext::in_dir(
        Path::new("/runs/7/extra"),
        Path::new("/runs/7/extra/coot_ledger.sqlite"),
        "artifacts",
        7,
    )
}

fn names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("/data/{prefix}{i}")).collect()
}

fn count_containing(script: &str, prefix: &str, needle: &str) -> usize {
    script
        .lines()
        .filter(|line| line.starts_with(prefix) && line.contains(needle))
        .count()
}

fn count(script: &str, needle: &str) -> usize {
    script.lines().filter(|line| line.starts_with(needle)).count()
}

#[test]
fn header_binds_session_values() {
    let script = render_extension_script(&context(), &[], &[], "").expect("render");
    assert!(script.contains("mydict['imol'] = 0\n"));
    assert!(script.contains("databasePath = '/runs/7/extra/coot_ledger.sqlite'"));
    assert!(script.contains("table_name = 'artifacts'"));
    assert!(script.contains("stopPath = '/runs/7/extra/STOPPROTOCOL'"));
    assert!(script.contains("cootPath = '/runs/7/extra/coot.ini'"));
    assert!(script.contains("TYPE_3DMAP = 0\n"));
    assert!(script.contains("TYPE_ATOMSTRUCT = 1\n"));
    assert!(script.contains("runId = 7\n"));
    assert!(!script.contains("{{"));
}

#[test]
fn body_installs_every_binding() {
    let script = render_extension_script(&context(), &[], &[], "").expect("render");
    for key in ["x", "X", "z", "Z", "U", "w", "E", "e"] {
        let binding = format!(", \"{key}\", lambda:");
        assert_eq!(
            count_containing(&script, "add_key_binding(", &binding),
            1,
            "binding {key}"
        );
    }
    assert!(script.contains("coot_menubar_menu(\"Scipion\")"));
    assert!(script.contains("(modelId, fileName, labelName, kind, imported)"));
}

#[test]
fn one_structure_one_volume() {
    let script = render_extension_script(
        &context(),
        &["/data/model.pdb".to_string()],
        &["/runs/7/extra/map.mrc".to_string()],
        "",
    )
    .expect("render");
    assert_eq!(count(&script, "set_mol_active("), 1);
    assert_eq!(count(&script, "set_map_colour("), 1);
    assert!(script.contains("read_pdb('/data/model.pdb')\nset_mol_active(0, 1)\n"));
    assert!(script.contains("set_map_colour(1, *map_colour)"));
}

#[test]
fn load_order_is_structures_then_maps() {
    let script = render_extension_script(&context(), &names("s", 2), &names("v", 2), "")
        .expect("render");
    let s1 = script.find("read_pdb('/data/s1')").expect("s1");
    let act = script.find("set_mol_active(0, 1)").expect("activation");
    let v0 = script.find("handle_read_ccp4_map('/data/v0', 0)").expect("v0");
    let colour = script.find("set_map_colour(3, *map_colour)").expect("colour");
    assert!(s1 < act && act < v0 && v0 < colour);
}

#[test]
fn no_structures_no_activation_no_volumes_no_colour() {
    let script = render_extension_script(&context(), &[], &names("v", 1), "").expect("render");
    assert_eq!(count(&script, "set_mol_active("), 0);
    assert!(script.contains("set_map_colour(0, *map_colour)"));

    let script = render_extension_script(&context(), &names("s", 3), &[], "").expect("render");
    assert_eq!(count(&script, "set_mol_active("), 1);
    assert_eq!(count(&script, "set_map_colour("), 0);
}

#[test]
fn trailer_comes_last() {
    let trailer = "scipion_write()\ncoot_real_exit(0)";
    let script = render_extension_script(&context(), &names("s", 1), &names("v", 1), trailer)
        .expect("render");
    assert!(script.ends_with("# extra commands\nscipion_write()\ncoot_real_exit(0)\n"));
}

#[test]
fn writes_script_from_ledger_and_support_files() {
    let dir = tempdir().expect("tempdir");
    let extra = dir.path();
    let ledger_path = extra.join("coot_ledger.sqlite");
    let ledger = Ledger::open(&ledger_path, "artifacts").expect("ledger");
    ledger.ensure_schema().expect("schema");
    ledger
        .record_artifact(0, "/in/model.pdb", "model", ArtifactKind::AtomicStructure, true)
        .expect("row");
    ledger
        .record_artifact(1, "/in/ref.pdb", "ref", ArtifactKind::AtomicStructure, true)
        .expect("row");
    ledger
        .record_artifact(2, "/x/map.mrc", "map", ArtifactKind::VolumeMap, false)
        .expect("row");
    ledger
        .record_artifact(0, "/x/model_v2.pdb", "model_v2", ArtifactKind::AtomicStructure, false)
        .expect("row");

    let ctx = CootScriptContext::in_dir(extra, &ledger_path, "artifacts", 3);
    fs::write(&ctx.editor, "# user edited\n").expect("editor");
    let script_path = extra.join(SCRIPT_NAME);
    write_extension_script(&script_path, &ctx, &ledger, "").expect("write");

    let script = fs::read_to_string(&script_path).expect("read");
    let model = script.find("read_pdb('/x/model_v2.pdb')").expect("latest model 0");
    let reference = script.find("read_pdb('/in/ref.pdb')").expect("model 1");
    assert!(model < reference);
    assert!(!script.contains("read_pdb('/in/model.pdb')"));
    assert!(script.contains("set_map_colour(2, *map_colour)"));

    assert_eq!(fs::read_to_string(&ctx.coot_ini).expect("ini"), COOT_INI_DEFAULT);
    assert_eq!(fs::read_to_string(&ctx.editor).expect("editor"), "# user edited\n");
}

proptest! {
    #[test]
    fn exactly_one_activation_and_one_colour(n_structs in 1usize..8, n_vols in 1usize..8) {
        let script = render_extension_script(
            &context(),
            &names("s", n_structs),
            &names("v", n_vols),
            "",
        ).expect("render");
        prop_assert_eq!(count(&script, "set_mol_active("), 1);
        prop_assert_eq!(count(&script, "set_map_colour("), 1);
        let colour = format!("set_map_colour({}, *map_colour)", n_structs + n_vols - 1);
        prop_assert!(script.contains(&colour));
        prop_assert_eq!(count(&script, "read_pdb("), n_structs);
        prop_assert_eq!(count(&script, "handle_read_ccp4_map("), n_vols);
    }
}
