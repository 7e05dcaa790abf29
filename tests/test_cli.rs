
use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn steam_root(dir: &Path) -> String {
    let root = dir.join("Steam");
    write_steam_root(
        &root,
        &sample_container(41),
        &library_folders_vdf(&[("/mnt/games", &[100])]),
    );
    root.to_string_lossy().into_owned()
}

fn appinfo_dump() -> Command {
    Command::new(assert_cmd::cargo_bin!("appinfo_dump"))
}

#[test]
fn it_dumps_soundtracks_as_jsonl() {
    let d = tempdir().unwrap();
    let root = steam_root(d.path());

    let mut cmd = appinfo_dump();
    cmd.args(["--no-genres", "-o", "jsonl", &root]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["name"], "First OST");
    assert_eq!(lines[0]["install_dir"], "/mnt/games/steamapps/music/First OST");
    assert_eq!(lines[1]["name"], "Second OST");
}

#[test]
fn it_dumps_all_apps_with_explicit_paths() {
    let d = tempdir().unwrap();
    let appinfo = d.path().join("appinfo.vdf");
    fs::write(&appinfo, sample_container(39)).unwrap();

    let mut cmd = appinfo_dump();
    cmd.args(["--apps", "-o", "jsonl", "--appinfo", appinfo.to_str().unwrap()]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"A Game\""))
        .stdout(predicate::str::contains("\"First OST\""));
}

#[test]
fn it_dumps_raw_key_values() {
    let d = tempdir().unwrap();
    let root = steam_root(d.path());

    let mut cmd = appinfo_dump();
    cmd.args(["--no-genres", "-o", "vdf", &root]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("\"appinfo\""))
        .stdout(predicate::str::contains("\"originalname\"\t\t\"Opening\""));
}

#[test]
fn it_respects_directory_output() {
    let d = tempdir().unwrap();
    let f = d.as_ref().join("test.out");
    let root = steam_root(d.path());

    let mut cmd = appinfo_dump();
    cmd.args(["--no-genres", "-f", &f.to_string_lossy(), &root]);

    assert!(
        cmd.output().unwrap().stdout.is_empty(),
        "Expected output to be printed to file, but was printed to stdout"
    );

    let mut expected = vec![];

    File::open(&f).unwrap().read_to_end(&mut expected).unwrap();
    assert!(
        !expected.is_empty(),
        "Expected output to be printed to file"
    )
}

#[test]
fn test_it_refuses_to_overwrite_directory() {
    let d = tempdir().unwrap();
    let root = steam_root(d.path());

    let mut cmd = appinfo_dump();
    cmd.args(["--no-genres", "-f", &d.path().to_string_lossy(), &root]);

    cmd.assert().failure().code(1);
}

#[test]
fn test_it_overwrites_file_anyways_if_passed_flag() {
    let d = tempdir().unwrap();
    let f = d.as_ref().join("test.out");
    let root = steam_root(d.path());

    let mut file = File::create(&f).unwrap();
    file.write_all(b"I'm a file!").unwrap();

    let mut cmd = appinfo_dump();
    cmd.args([
        "--no-genres",
        "-f",
        &f.to_string_lossy(),
        "--no-confirm-overwrite",
        &root,
    ]);

    cmd.assert().success();

    let mut expected = String::new();

    File::open(&f).unwrap().read_to_string(&mut expected).unwrap();
    assert!(expected.contains("First OST"), "Expected output to be printed to file")
}

#[test]
fn test_it_fails_on_a_missing_container() {
    let d = tempdir().unwrap();

    let mut cmd = appinfo_dump();
    cmd.args([
        "--no-genres",
        "--appinfo",
        &d.path().join("nope.vdf").to_string_lossy(),
    ]);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to open"));
}
