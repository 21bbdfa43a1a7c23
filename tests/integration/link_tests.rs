use dupelink::duplicates::{DuplicateFinder, FinderConfig};
use dupelink::scanner::hardlink::HardlinkTracker;
use dupelink::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

fn finder_with(walker: WalkerConfig) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_walker_config(walker))
}

#[test]
fn test_hardlinks_not_reported_by_default() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, "identical content").unwrap();
    if let Err(e) = fs::hard_link(&original, dir.path().join("hardlink.txt")) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    if HardlinkTracker::is_supported() {
        assert!(groups.is_empty());
        assert_eq!(summary.total_files, 1);
    } else {
        assert_eq!(groups.len(), 1);
    }
}

#[test]
fn test_hardlinks_reported_when_enabled() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, "identical content").unwrap();
    if fs::hard_link(&original, dir.path().join("hardlink.txt")).is_err() {
        return;
    }

    let (groups, summary) = finder_with(WalkerConfig::default().with_report_hardlinks(true))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.total_files, 2);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlink_to_indexed_file_is_not_a_duplicate() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("real.txt"), "linked content").unwrap();
        symlink(root.join("real.txt"), root.join("alias.txt")).unwrap();

        let (groups, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(&root)
            .unwrap();

        assert!(groups.is_empty());
        assert_eq!(summary.total_files, 1);
    }

    #[test]
    fn test_followed_link_reports_resolved_path() {
        let outside = tempdir().unwrap();
        let outside_root = outside.path().canonicalize().unwrap();
        fs::write(outside_root.join("target.txt"), "shared bytes").unwrap();

        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("copy.txt"), "shared bytes").unwrap();
        symlink(outside_root.join("target.txt"), root.join("link.txt")).unwrap();

        let (groups, _) = DuplicateFinder::with_defaults()
            .find_duplicates(&root)
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert!(groups[0].contains(&outside_root.join("target.txt")));
        assert!(groups[0].contains(&root.join("copy.txt")));
        assert!(!groups[0].contains(&root.join("link.txt")));
    }

    #[test]
    fn test_links_skipped_when_not_following() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("target.txt"), "shared bytes").unwrap();

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("copy.txt"), "shared bytes").unwrap();
        symlink(outside.path().join("target.txt"), dir.path().join("link.txt")).unwrap();
        symlink(outside.path(), dir.path().join("linked_dir")).unwrap();

        let (groups, summary) = finder_with(WalkerConfig::default().with_follow_symlinks(false))
            .find_duplicates(dir.path())
            .unwrap();

        assert!(groups.is_empty());
        assert_eq!(summary.total_files, 1);
    }

    #[test]
    fn test_circular_symlink_terminates() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "loop data").unwrap();
        fs::write(root.join("sub/b.txt"), "loop data").unwrap();
        symlink(&root, root.join("sub/back")).unwrap();

        let (groups, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(&root)
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(summary.total_files, 2);
    }

    #[test]
    fn test_dangling_symlink_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "pair").unwrap();
        fs::write(dir.path().join("b.txt"), "pair").unwrap();
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let (groups, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert!(!summary.has_errors());
    }

    #[test]
    fn test_symlinked_directory_walked_once() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("data")).unwrap();
        fs::write(root.join("data/x.bin"), [3u8; 64]).unwrap();
        fs::write(root.join("data/y.bin"), [3u8; 64]).unwrap();
        symlink(root.join("data"), root.join("mirror")).unwrap();

        let (groups, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(&root)
            .unwrap();

        assert_eq!(summary.total_files, 2);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
