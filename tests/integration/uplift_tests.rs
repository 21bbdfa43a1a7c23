#![cfg(unix)]

use dupelink::duplicates::DuplicateFinder;
use dupelink::output::ScriptOutput;
use dupelink::uplift::find_softlink_dirs;
use std::fs;
use std::os::unix::fs::symlink;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_uplift_after_remediation() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("orig/album")).unwrap();
    fs::create_dir_all(root.join("z_copy/album")).unwrap();
    for name in ["one.jpg", "two.jpg"] {
        fs::write(root.join("orig/album").join(name), name.repeat(50)).unwrap();
        fs::write(root.join("z_copy/album").join(name), name.repeat(50)).unwrap();
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&root)
        .unwrap();
    assert_eq!(groups.len(), 2);

    let script_path = root.join("fix.sh");
    let mut script = Vec::new();
    ScriptOutput::new(&groups, &summary).write_to(&mut script).unwrap();
    fs::write(&script_path, script).unwrap();
    let status = Command::new("sh").arg(&script_path).status().unwrap();
    assert!(status.success());

    let found = find_softlink_dirs(&root.join("z_copy"), true);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].dir, root.join("z_copy"));
    assert_eq!(found[0].target, root.join("orig"));
}

#[test]
fn test_uplift_command_collapses_directory() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("orig")).unwrap();
    fs::create_dir_all(root.join("mirror")).unwrap();
    fs::write(root.join("orig/a"), "a").unwrap();
    fs::write(root.join("orig/b"), "b").unwrap();
    symlink(root.join("orig/a"), root.join("mirror/a")).unwrap();
    symlink(root.join("orig/b"), root.join("mirror/b")).unwrap();

    let found = find_softlink_dirs(&root.join("mirror"), false);
    assert_eq!(found.len(), 1);
    let command = found[0].to_command().unwrap();

    let status = Command::new("sh").arg("-c").arg(&command).status().unwrap();
    assert!(status.success());

    let meta = fs::symlink_metadata(root.join("mirror")).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(fs::read_link(root.join("mirror")).unwrap(), root.join("orig"));
    assert_eq!(fs::read_to_string(root.join("mirror/a")).unwrap(), "a");
}

#[test]
fn test_mixed_directory_not_collapsed() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("orig")).unwrap();
    fs::create_dir_all(root.join("mixed")).unwrap();
    fs::write(root.join("orig/a"), "a").unwrap();
    symlink(root.join("orig/a"), root.join("mixed/a")).unwrap();
    fs::write(root.join("mixed/local"), "stays").unwrap();

    assert!(find_softlink_dirs(&root.join("mixed"), true).is_empty());
}
