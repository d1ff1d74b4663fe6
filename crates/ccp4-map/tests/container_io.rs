use std::fs;

use ccp4_map::{convert_map, DensityMap, MapHeader, Mode, HEADER_LEN};
use tempfile::tempdir;

fn ramp(dims: [usize; 3]) -> Vec<f32> {
    (0..dims.iter().product::<usize>()).map(|i| i as f32).collect()
}

#[test]
fn float_map_survives_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ramp.mrc");
    let map = DensityMap::from_data([2, 3, 4], 1.25, ramp([2, 3, 4])).expect("map");
    map.write(&path).expect("write");

    let bytes = fs::read(&path).expect("read bytes");
    assert_eq!(bytes.len(), HEADER_LEN + 24 * 4);

    let back = DensityMap::read(&path).expect("read");
    assert_eq!(back.data, map.data);
    assert_eq!(back.header.dims, [2, 3, 4]);
    assert_eq!(back.header.mode, Mode::Float32);
    assert_eq!(back.header.dmax, 23.0);
    assert_eq!(back.header.cell_dimensions(), [2.5, 3.75, 5.0]);
    assert_eq!(back.header.grid_sampling(), [2, 3, 4]);
}

#[test]
fn integer_modes_decode_to_float() {
    let mut header = MapHeader::new([2, 1, 1], 1.0);
    header.mode = Mode::Int16;
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&(-3i16).to_le_bytes());
    bytes.extend_from_slice(&7i16.to_le_bytes());
    let map = DensityMap::decode(&bytes).expect("decode");
    assert_eq!(map.data, vec![-3.0, 7.0]);

    header.mode = Mode::Int8;
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&[0xff, 0x05]);
    let map = DensityMap::decode(&bytes).expect("decode");
    assert_eq!(map.data, vec![-1.0, 5.0]);

    header.mode = Mode::UInt16;
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&60000u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    let map = DensityMap::decode(&bytes).expect("decode");
    assert_eq!(map.data, vec![60000.0, 1.0]);
}

#[test]
fn truncated_block_is_rejected() {
    let header = MapHeader::new([4, 4, 4], 1.0);
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 16]);
    let err = DensityMap::decode(&bytes).expect_err("truncated");
    assert_eq!(err.info().code, "ccp4_map.truncated");
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.mrc");
    let err = DensityMap::read(&path).expect_err("missing");
    assert_eq!(err.info().code, "ccp4_map.read");
    assert_eq!(err.info().context["path"], path.display().to_string());
}

#[test]
fn stats_match_hand_computation() {
    let map = DensityMap::from_data([4, 1, 1], 1.0, vec![1.0, 2.0, 3.0, 4.0]).expect("map");
    let stats = map.stats();
    assert!((stats.mean - 2.5).abs() < 1e-12);
    assert!((stats.std - 1.25f64.sqrt()).abs() < 1e-12);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 4.0);
}

#[test]
fn normalize_divides_by_maximum() {
    let mut map = DensityMap::from_data([4, 1, 1], 1.0, vec![-2.0, 0.0, 2.0, 8.0]).expect("map");
    assert!(map.normalize());
    assert_eq!(map.data, vec![-0.25, 0.0, 0.25, 1.0]);
}

#[test]
fn zero_maximum_is_left_alone() {
    let mut map = DensityMap::from_data([2, 1, 1], 1.0, vec![-1.0, 0.0]).expect("map");
    assert!(!map.normalize());
    assert_eq!(map.data, vec![-1.0, 0.0]);
}

#[test]
fn convert_stamps_sampling_and_origin() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("in.mrc");
    let output = dir.path().join("out.mrc");
    DensityMap::from_data([2, 2, 2], 1.0, ramp([2, 2, 2]))
        .expect("map")
        .write(&input)
        .expect("write");

    let stats = convert_map(&input, &output, 2.0, [4.0, 6.0, -2.0], true).expect("convert");
    assert_eq!(stats.max, 7.0);

    let out = DensityMap::read(&output).expect("read");
    assert_eq!(out.header.cell_dimensions(), [4.0, 4.0, 4.0]);
    assert_eq!(out.header.start, [2, 3, -1]);
    assert_eq!(out.header.origin, [4.0, 6.0, -2.0]);
    assert!((out.header.sampling_rate() - 2.0).abs() < 1e-9);
    assert!((out.data[7] - 1.0).abs() < 1e-6);
}

#[test]
fn convert_without_normalization_keeps_values() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("in.mrc");
    let output = dir.path().join("out.mrc");
    DensityMap::from_data([2, 1, 1], 1.0, vec![3.0, 5.0])
        .expect("map")
        .write(&input)
        .expect("write");
    convert_map(&input, &output, 1.0, [0.0; 3], false).expect("convert");
    assert_eq!(DensityMap::read(&output).expect("read").data, vec![3.0, 5.0]);
}

#[test]
fn header_only_read_matches_full_read() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("box.mrc");
    let mut map = DensityMap::zeros([8, 8, 6], 1.0).expect("zeros");
    map.stamp(1.5, [3.0, 0.0, 0.0]);
    map.write(&path).expect("write");
    let header = MapHeader::read(&path).expect("header");
    assert_eq!(header.cell_dimensions(), [12.0, 12.0, 9.0]);
    assert_eq!(header.grid_sampling(), [8, 8, 6]);
    assert_eq!(header.start, [2, 0, 0]);
}

#[test]
fn oversized_header_is_rejected_not_allocated() {
    let bytes = MapHeader::new([1 << 30; 3], 1.0).to_bytes();
    let err = DensityMap::decode(&bytes).expect_err("oversized");
    assert_eq!(err.info().code, "ccp4_map.too_large");
}
