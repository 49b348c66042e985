//! End-to-end tests that drive the `blpk` binary as a subprocess, the way a
//! user would from a shell.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn blpk() -> Command {
    Command::new(env!("CARGO_BIN_EXE_blpk"))
}

#[test]
fn compress_then_decompress_round_trips() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("payload.bin");
    fs::write(&input, b"some bytes to round trip through the cli ".repeat(500)).unwrap();

    let output = dir.path().join("payload.bin.blp");
    let status = blpk()
        .args(["compress", input.to_str().unwrap(), "--chunk-size", "4KiB"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(output.exists());

    let restored = dir.path().join("restored.bin");
    let status = blpk()
        .args([
            "decompress",
            output.to_str().unwrap(),
            restored.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(fs::read(&restored).unwrap(), fs::read(&input).unwrap());
}

#[test]
fn compress_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, b"hello").unwrap();
    let output = dir.path().join("out.blp");
    fs::write(&output, b"already here").unwrap();

    let status = blpk()
        .args(["compress", input.to_str().unwrap(), output.to_str().unwrap()])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let status = blpk()
        .args([
            "compress",
            "--force",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn decompress_rejects_missing_blp_extension_unless_disabled() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, b"abc").unwrap();
    let container = dir.path().join("container.bin"); // deliberately not .blp
    let status = blpk()
        .args(["compress", input.to_str().unwrap(), container.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());

    let restored = dir.path().join("restored.bin");
    let status = blpk()
        .args([
            "decompress",
            container.to_str().unwrap(),
            restored.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let status = blpk()
        .args([
            "decompress",
            "-e",
            container.to_str().unwrap(),
            restored.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn append_extends_an_existing_container() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, b"0123456789".repeat(200)).unwrap();
    let container = dir.path().join("data.bin.blp");
    let status = blpk()
        .args(["compress", input.to_str().unwrap(), "--chunk-size", "512"])
        .current_dir(dir.path())
        .status()
        .unwrap();
    assert!(status.success());
    assert!(container.exists());

    let more = dir.path().join("more.bin");
    fs::write(&more, b"abcdefghij".repeat(50)).unwrap();
    let status = blpk()
        .args(["append", container.to_str().unwrap(), more.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());

    let restored = dir.path().join("restored.bin");
    let status = blpk()
        .args([
            "decompress",
            container.to_str().unwrap(),
            restored.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert!(status.success());

    let mut expected = fs::read(&input).unwrap();
    expected.extend_from_slice(&fs::read(&more).unwrap());
    assert_eq!(fs::read(&restored).unwrap(), expected);
}

#[test]
fn info_reports_headers_for_a_compressed_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, b"xyz".repeat(1000)).unwrap();
    let container = dir.path().join("data.bin.blp");
    let status = blpk()
        .args(["compress", input.to_str().unwrap()])
        .current_dir(dir.path())
        .status()
        .unwrap();
    assert!(status.success());

    let output = blpk().args(["info", container.to_str().unwrap()]).output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("nchunks:"));
    assert!(text.contains("format_version:"));
}

#[test]
fn compress_rejects_unknown_codec() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, b"hello").unwrap();
    let output = blpk()
        .args([
            "compress",
            input.to_str().unwrap(),
            dir.path().join("out.blp").to_str().unwrap(),
            "--codec",
            "brotli",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("blpk: error:"));
}
