use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const FIXED_COMMIT_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with one root commit holding `1.txt`, `a/2.txt` and `a/b/3.txt`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_stow_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_stow_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    stow_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_stow_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("stow").expect("Failed to find stow binary");
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("STOW_COMMIT_DATE");
    cmd.env_remove("STOW_DEFAULT_BRANCH");
    cmd.current_dir(dir);
    cmd.args(args);
    cmd
}

pub fn stow_commit(dir: &Path, message: &str) -> Command {
    run_stow_command(dir, &["commit", "-m", message])
}

/// Commit with a pinned timestamp so digests are reproducible
pub fn stow_commit_at(dir: &Path, message: &str, date: &str) -> Command {
    let mut cmd = stow_commit(dir, message);
    cmd.env("STOW_COMMIT_DATE", date);
    cmd
}

pub fn stow_merge(dir: &Path, branch: &str) -> Command {
    run_stow_command(dir, &["merge", branch])
}

/// Write one file, stage everything and commit
pub fn commit_file(dir: &Path, path: &str, content: &str, message: &str) {
    write_file(FileSpec::new(dir.join(path), content.to_string()));
    run_stow_command(dir, &["add", path]).assert().success();
    stow_commit(dir, message).assert().success();
}

/// Tip digest of a branch, read straight from its ref file
pub fn branch_tip(dir: &Path, branch: &str) -> String {
    let ref_path = dir.join(".stow").join("refs").join("heads").join(branch);

    std::fs::read_to_string(&ref_path)
        .unwrap_or_else(|e| panic!("Failed to read ref {:?}: {}", ref_path, e))
        .trim()
        .to_string()
}

pub fn object_count(dir: &Path) -> usize {
    std::fs::read_dir(dir.join(".stow").join("objects"))
        .expect("Failed to list objects")
        .count()
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success();

    String::from_utf8(output.get_output().stdout.clone()).expect("stdout is not UTF-8")
}
