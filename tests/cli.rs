//! Drives the raiden binary the way a user would

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tempfile::tempdir;

fn raiden(args: &[&str]) -> Output {
    raiden_with_log(args, "warn")
}

fn raiden_with_log(args: &[&str], log: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_raiden"))
        .args(args)
        .env("RAIDEN_LOG", log)
        .output()
        .expect("failed to run raiden")
}

fn run(command: &str, source: &Path, disks: usize) -> Output {
    raiden(&[command, source.to_str().unwrap(), &disks.to_string()])
}

fn shard(source: &Path, index: usize) -> PathBuf {
    PathBuf::from(format!("{}_{}", source.display(), index))
}

fn move_aside(path: &Path) -> PathBuf {
    let aside = PathBuf::from(format!("{}~", path.display()));
    std::fs::rename(path, &aside).unwrap();
    aside
}

#[test]
fn test_split_merge_with_each_disk_moved_aside() {
    for disks in [3, 5, 10] {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let mut data = vec![0u8; 1024];
        StdRng::seed_from_u64(disks as u64).fill_bytes(&mut data);
        std::fs::write(&source, &data).unwrap();

        let output = run("split", &source, disks);
        assert!(output.status.success(), "split failed: {:?}", output);
        for index in 0..disks {
            assert!(shard(&source, index).is_file());
        }

        let restored = dir.path().join("res__source");
        let output = run("merge", &source, disks);
        assert!(output.status.success(), "merge failed: {:?}", output);
        assert_eq!(std::fs::read(&restored).unwrap(), data);

        for index in 0..disks {
            let path = shard(&source, index);
            let aside = move_aside(&path);

            let output = run("merge", &source, disks);
            std::fs::rename(&aside, &path).unwrap();

            assert!(output.status.success(), "merge without disk {} failed: {:?}", index, output);
            assert_eq!(std::fs::read(&restored).unwrap(), data, "disks={} missing={}", disks, index);
        }
    }
}

#[test]
fn test_two_missing_disks_exit_code() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    std::fs::write(&source, b"not enough disks left").unwrap();

    assert!(run("split", &source, 4).status.success());
    std::fs::remove_file(shard(&source, 0)).unwrap();
    std::fs::remove_file(shard(&source, 3)).unwrap();

    let output = run("merge", &source, 4);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Too many missing disks"));
    assert!(!dir.path().join("res__source").exists());
}

#[test]
fn test_invalid_disk_counts() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    std::fs::write(&source, b"data").unwrap();
    let path = source.to_str().unwrap();

    let output = raiden(&["split", path, "1"]);
    assert_eq!(output.status.code(), Some(2));

    let output = raiden(&["split", path, "three"]);
    assert_eq!(output.status.code(), Some(2));

    assert!(!shard(&source, 0).exists());
}

#[test]
fn test_split_missing_source() {
    let dir = tempdir().unwrap();
    let output = run("split", &dir.path().join("nope"), 3);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_error_reported_with_logging_off() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("nope");
    let output = raiden_with_log(&["split", source.to_str().unwrap(), "3"], "off");
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr: {:?}", stderr);
    assert_eq!(stderr.lines().count(), 1);
}

#[test]
fn test_unknown_subcommand() {
    let output = raiden(&["verify", "file", "3"]);
    assert!(!output.status.success());
}
