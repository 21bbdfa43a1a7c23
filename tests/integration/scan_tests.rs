use dupelink::duplicates::{DuplicateFinder, FinderConfig, VerifyStrategy};
use dupelink::output::ListingOutput;
use dupelink::scanner::WalkerConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn canonical_root(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "content a").unwrap();
    fs::write(dir.path().join("b.txt"), "content b").unwrap();
    fs::write(dir.path().join("c.txt"), "content cc").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_size, 1);
}

#[test]
fn test_hello_hello_world_listing() {
    let dir = tempdir().unwrap();
    let root = canonical_root(&dir);
    fs::write(root.join("a.txt"), "hello").unwrap();
    fs::write(root.join("b.txt"), "hello").unwrap();
    fs::write(root.join("c.txt"), "world").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&root).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 5);

    let mut out = Vec::new();
    ListingOutput::new(&groups).write_to(&mut out).unwrap();
    let expected = format!(
        "{}\n{}\n====\n",
        root.join("a.txt").display(),
        root.join("b.txt").display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_files_differing_in_last_byte() {
    let dir = tempdir().unwrap();
    let mut content = vec![7u8; 10_000];
    fs::write(dir.path().join("one.bin"), &content).unwrap();
    *content.last_mut().unwrap() = 8;
    fs::write(dir.path().join("two.bin"), &content).unwrap();

    for strategy in [VerifyStrategy::Chunked, VerifyStrategy::Hash] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_verify(strategy));
        let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert!(groups.is_empty(), "{strategy} reported a false duplicate");
        assert_eq!(summary.eliminated_by_prehash, 0);
        assert_eq!(summary.eliminated_by_verify, 2);
    }
}

#[test]
fn test_prefix_difference_eliminated_early() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), [1u8; 2048]).unwrap();
    fs::write(dir.path().join("b.bin"), [2u8; 2048]).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_prehash, 2);
}

#[test]
fn test_empty_files_never_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), "").unwrap();
    fs::write(dir.path().join("e2"), "").unwrap();

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_min_size(0));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_min_size_filters_small_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("s1"), "tiny").unwrap();
    fs::write(dir.path().join("s2"), "tiny").unwrap();
    fs::write(dir.path().join("l1"), "x".repeat(200)).unwrap();
    fs::write(dir.path().join("l2"), "x".repeat(200)).unwrap();

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_min_size(100));
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 200);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let root = canonical_root(&dir);
    fs::create_dir_all(root.join("sub/deeper")).unwrap();
    fs::write(root.join("top.txt"), "nested duplicate").unwrap();
    fs::write(root.join("sub/deeper/low.txt"), "nested duplicate").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&root)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].contains(&root.join("top.txt")));
    assert!(groups[0].contains(&root.join("sub/deeper/low.txt")));
}

#[test]
fn test_flat_scan_ignores_subdirectories() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("sub/b.txt"), "same").unwrap();

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_recursive(false));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_three_way_split_in_one_size_group() {
    let dir = tempdir().unwrap();
    for (name, byte) in [("a", b'x'), ("b", b'y'), ("c", b'x'), ("d", b'y'), ("e", b'z')] {
        fs::write(dir.path().join(name), [byte; 5000]).unwrap();
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.len() == 2));
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_groups_sorted_largest_first() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("small1"), "ab").unwrap();
    fs::write(dir.path().join("small2"), "ab").unwrap();
    fs::write(dir.path().join("big1"), "abcdefgh").unwrap();
    fs::write(dir.path().join("big2"), "abcdefgh").unwrap();
    fs::write(dir.path().join("mid1"), "abcd").unwrap();
    fs::write(dir.path().join("mid2"), "abcd").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let sizes: Vec<u64> = groups.iter().map(|g| g.size).collect();
    assert_eq!(sizes, vec![8, 4, 2]);
}

#[test]
fn test_repeated_runs_are_stable() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        fs::write(dir.path().join(format!("f{i}")), format!("group {}", i % 2)).unwrap();
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(3));
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}
