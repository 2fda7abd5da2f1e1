use assert_cmd::Command;
use ndarray::Array3;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use volume_filters::{Volume, VolumeLoader, VolumeWriter};

fn plateau_fixture(dir: &Path) -> PathBuf {
    let volume = Volume::from_data(Array3::from_shape_fn((4, 10, 10), |(z, _, _)| {
        if z < 2 { 50 } else { 200 }
    }));
    let path = dir.join("plateaus.nii");
    VolumeWriter::save(&volume, &path).expect("write fixture");
    path
}

#[test]
fn otsu_without_input_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("otsu-threshold")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
    assert!(!dir.path().join("Output_Images").exists());
}

#[test]
fn otsu_prints_threshold_and_writes_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = plateau_fixture(dir.path());

    Command::cargo_bin("otsu-threshold")
        .unwrap()
        .current_dir(dir.path())
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Threshold = 124"));

    let mask = VolumeLoader::load(dir.path().join("Output_Images/otsu_threshold_image.nii"))
        .expect("default output");
    assert_eq!(mask.data()[[0, 0, 0]], 0);
    assert_eq!(mask.data()[[3, 0, 0]], 255);
}

#[test]
fn otsu_honours_output_values_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let input = plateau_fixture(dir.path());
    let output = dir.path().join("mask.nii.gz");
    let preview = dir.path().join("mask.png");

    Command::cargo_bin("otsu-threshold")
        .unwrap()
        .arg(&input)
        .args(["--inside-value", "1", "--outside-value", "2"])
        .arg("--output")
        .arg(&output)
        .arg("--preview")
        .arg(&preview)
        .assert()
        .success();

    let mask = VolumeLoader::load(&output).unwrap();
    assert!(mask.data().iter().all(|&v| v == 1 || v == 2));
    assert!(preview.exists());
}

#[test]
fn otsu_missing_input_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("otsu-threshold")
        .unwrap()
        .current_dir(dir.path())
        .arg("does-not-exist.nii")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does-not-exist.nii"));
}

#[test]
fn otsu_ignore_errors_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("otsu-threshold")
        .unwrap()
        .current_dir(dir.path())
        .arg("does-not-exist.nii")
        .arg("--ignore-errors")
        .assert()
        .success()
        .stderr(predicate::str::contains("does-not-exist.nii"));
}

#[test]
fn affine_requires_all_nine_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.nii");
    Command::cargo_bin("affine-transform")
        .unwrap()
        .arg("missing-input.nii")
        .arg(&output)
        .args(["0", "0", "0", "1", "0", "0"])
        .assert()
        .failure()
        .code(2);
    assert!(!output.exists());
}

#[test]
fn affine_rejects_extra_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.nii");
    Command::cargo_bin("affine-transform")
        .unwrap()
        .arg("missing-input.nii")
        .arg(&output)
        .args(["0", "0", "0", "1", "0", "0", "0", "0"])
        .assert()
        .failure()
        .code(2);
    assert!(!output.exists());
}

#[test]
fn affine_rejects_out_of_range_sinc_radius() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.nii");
    for radius in ["0", "17", "18446744073709551615"] {
        Command::cargo_bin("affine-transform")
            .unwrap()
            .arg("missing-input.nii")
            .arg(&output)
            .args(["0", "0", "0", "1", "0.3", "0", "0"])
            .args(["--sinc-radius", radius])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("--sinc-radius"));
    }
    assert!(!output.exists());
}

#[test]
fn affine_translates_with_negative_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = Array3::zeros((4, 4, 4));
    data[[2, 2, 2]] = 150;
    let input = dir.path().join("voxel.nii");
    VolumeWriter::save(&Volume::from_data(data), &input).unwrap();
    let output = dir.path().join("shifted.nii");

    Command::cargo_bin("affine-transform")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .args(["0", "0", "0", "1", "-1", "0", "0"])
        .assert()
        .success();

    let shifted = VolumeLoader::load(&output).unwrap();
    assert_eq!(shifted.data()[[2, 2, 1]], 150);
    assert_eq!(shifted.data()[[2, 2, 2]], 0);
}

#[test]
fn affine_reports_unreadable_input() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.nii");
    Command::cargo_bin("affine-transform")
        .unwrap()
        .arg(dir.path().join("nope.nii"))
        .arg(&output)
        .args(["0.5", "0", "0", "1", "0", "0", "0"])
        .args(["--policy", "sequential", "--interpolation", "trilinear"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nope.nii"));
    assert!(!output.exists());
}
