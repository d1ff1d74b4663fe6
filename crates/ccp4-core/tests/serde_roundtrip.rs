use std::path::PathBuf;

use ccp4_core::{
    from_json_slice, to_canonical_json_bytes, ArtifactKind, AtomStructRef, HostOutput, RunDir,
    VolumeRef,
};

#[test]
fn host_outputs_round_trip_json() {
    let outputs = vec![
        HostOutput::AtomStruct {
            label: "coot_000007_Imol_0000_version_0001".into(),
            file_name: PathBuf::from("extra/coot_000007_Imol_0000_version_0001.pdb"),
            sources: vec![PathBuf::from("inputs/5ni1.pdb")],
        },
        HostOutput::Volume {
            key: "output3DMap_0001".into(),
            file_name: PathBuf::from("extra/emd_3488.mrc"),
            sampling_rate: 1.05,
            origin: [-10.0, 0.0, 4.5],
            source: PathBuf::from("inputs/emd_3488.map"),
        },
    ];
    let bytes = to_canonical_json_bytes(&outputs).expect("serialize");
    let decoded: Vec<HostOutput> = from_json_slice(&bytes).expect("deserialize");
    assert_eq!(decoded, outputs);
    assert_eq!(decoded[1].name(), "output3DMap_0001");
}

#[test]
fn atom_struct_with_volume_round_trip() {
    let structure = AtomStructRef {
        file_name: PathBuf::from("model.cif"),
        volume: Some(VolumeRef {
            file_name: PathBuf::from("map.mrc"),
            sampling_rate: 2.0,
            origin: [1.0, 1.0, 1.0],
            dim: 64,
        }),
    };
    let json = serde_json::to_string(&structure).expect("serialize");
    let decoded: AtomStructRef = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, structure);
}

#[test]
fn artifact_kind_codes_are_stable() {
    assert_eq!(ArtifactKind::VolumeMap.code(), 0);
    assert_eq!(ArtifactKind::AtomicStructure.code(), 1);
    assert_eq!(ArtifactKind::from_code(1), Some(ArtifactKind::AtomicStructure));
    assert_eq!(ArtifactKind::from_code(7), None);
}

#[test]
fn run_dir_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = RunDir::new(dir.path(), 42);
    run.ensure().expect("ensure");
    assert!(run.extra_dir().is_dir());
    assert!(run.tmp_dir().is_dir());
    assert_eq!(run.extra("coot.ini"), dir.path().join("extra").join("coot.ini"));
}

#[test]
fn volume_ref_reads_from_yaml() {
    let yaml = b"file_name: /data/emd_3488.map\nsampling_rate: 1.05\norigin: [1.0, 2.0, 3.0]\n";
    let volume: VolumeRef = ccp4_core::from_yaml_slice(yaml).expect("yaml");
    assert_eq!(volume.file_name, PathBuf::from("/data/emd_3488.map"));
    assert_eq!(volume.origin, [1.0, 2.0, 3.0]);
    assert_eq!(volume.dim, 0);
    let text = ccp4_core::to_yaml_string(&volume).expect("to yaml");
    assert!(text.contains("sampling_rate: 1.05"));
}
