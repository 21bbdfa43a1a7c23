use dupelink::duplicates::DuplicateFinder;
use dupelink::output::script::link_target;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let root1 = dir1.path().canonicalize().unwrap();
    let root2 = dir2.path().canonicalize().unwrap();
    fs::write(root1.join("a.txt"), "across roots").unwrap();
    fs::write(root2.join("b.txt"), "across roots").unwrap();
    fs::write(root2.join("c.txt"), "only here").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[root1.clone(), root2.clone()])
        .unwrap();

    assert_eq!(summary.roots, vec![root1.clone(), root2.clone()]);
    assert_eq!(summary.total_files, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files[0].path, root1.join("a.txt"));
    assert_eq!(groups[0].files[0].root, 0);
    assert_eq!(groups[0].files[1].root, 1);
}

#[test]
fn test_first_root_supplies_original_without_patterns() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    fs::write(dir1.path().join("z.txt"), "order").unwrap();
    fs::write(dir2.path().join("a.txt"), "order").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir2.path().to_path_buf(), dir1.path().to_path_buf()])
        .unwrap();

    assert!(groups[0].original().unwrap().path.ends_with("a.txt"));
}

#[test]
fn test_same_root_twice_scans_once() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "pair").unwrap();
    fs::write(dir.path().join("b"), "pair").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_nested_root_files_indexed_once() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir(root.join("inner")).unwrap();
    fs::write(root.join("inner/a"), "nested").unwrap();
    fs::write(root.join("b"), "nested").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[root.clone(), root.join("inner")])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_root_given_with_relative_components() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/a"), "dots").unwrap();
    fs::write(root.join("sub/b"), "dots").unwrap();

    let dotted: PathBuf = root.join("sub").join("..").join("sub");
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&dotted)
        .unwrap();

    assert_eq!(summary.roots, vec![root.join("sub")]);
    assert!(groups[0].files.iter().all(|f| f.path.starts_with(root.join("sub"))));
}

#[test]
fn test_link_targets_follow_root_membership() {
    let roots = vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")];

    assert_eq!(
        link_target(Path::new("/srv/a/x/f"), Path::new("/srv/a/y/f"), &roots),
        PathBuf::from("../x/f")
    );
    assert_eq!(
        link_target(Path::new("/srv/a/x/f"), Path::new("/srv/b/f"), &roots),
        PathBuf::from("/srv/a/x/f")
    );
}
