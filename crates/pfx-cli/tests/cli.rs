//! End-to-end runs of the `pfx` binary.

use pfx_core::Image;
use pfx_io::{farbfeld, irdump};
use std::process::Command;
use tempfile::tempdir;

fn pfx() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pfx"))
}

#[test]
fn test_filter_invert_red_square() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("red.ff");
    let output = dir.path().join("out.ff");
    farbfeld::write(&input, &Image::filled(4, 4, [255, 0, 0, 255])).unwrap();

    let status = pfx()
        .arg("filter")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--op", "invert"])
        .status()
        .unwrap();
    assert!(status.success());

    let out = farbfeld::read(&output).unwrap();
    assert!(out.pixels().iter().all(|p| *p == [0, 255, 255, 255]));
}

#[test]
fn test_filter_chain_changes_geometry() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.irdump");
    let output = dir.path().join("out.irdump");
    irdump::write(&input, &Image::new(10, 6)).unwrap();

    let status = pfx()
        .arg("filter")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--op", "crop=0,0,8,4", "--op", "rot90", "--op", "blur=1x2"])
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(irdump::read(&output).unwrap().dimensions(), (4, 8));
}

#[test]
fn test_convert_between_formats() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("a.ff");
    let output = dir.path().join("a.irdump");
    let img = Image::filled(5, 3, [1, 2, 3, 4]);
    farbfeld::write(&input, &img).unwrap();

    let status = pfx()
        .arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(irdump::read(&output).unwrap(), img);
}

#[test]
fn test_info_prints_size() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("a.ff");
    farbfeld::write(&input, &Image::filled(7, 2, [10, 20, 30, 40])).unwrap();

    let out = pfx().arg("info").arg(&input).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("7x2"));
    assert!(text.contains("10.00 20.00 30.00 40.00"));
}

#[test]
fn test_bad_op_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("a.ff");
    farbfeld::write(&input, &Image::new(2, 2)).unwrap();

    let out = pfx()
        .arg("filter")
        .arg(&input)
        .args(["-o", "unused.ff", "--op", "explode"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn test_crop_out_of_bounds_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("a.ff");
    let output = dir.path().join("b.ff");
    farbfeld::write(&input, &Image::new(2, 2)).unwrap();

    let out = pfx()
        .arg("filter")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--op", "crop=0,0,3,3"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(!output.exists());
}
