use dupelink::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupelink::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn scan(root: &Path, walker: WalkerConfig) -> Vec<dupelink::duplicates::DuplicateGroup> {
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    finder.find_duplicates(root).unwrap().0
}

fn populate(root: &Path) {
    fs::create_dir_all(root.join("build/out")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
    fs::write(root.join("build/out/main.rs"), "fn main() {}").unwrap();
    fs::write(root.join("notes.tmp"), "scratch").unwrap();
    fs::write(root.join("src/notes.tmp"), "scratch").unwrap();
}

#[test]
fn test_exclude_glob_matches_at_any_depth() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let groups = scan(
        dir.path(),
        WalkerConfig::default().with_exclude_patterns(vec!["*.tmp".to_string()]),
    );

    assert_eq!(groups.len(), 1);
    assert!(groups[0]
        .files
        .iter()
        .all(|f| f.path.extension().is_some_and(|e| e == "rs")));
}

#[test]
fn test_exclude_directory_prunes_subtree() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let groups = scan(
        dir.path(),
        WalkerConfig::default().with_exclude_patterns(vec!["build/".to_string()]),
    );

    assert_eq!(groups.len(), 1);
    assert!(groups[0]
        .files
        .iter()
        .all(|f| f.path.extension().is_some_and(|e| e == "tmp")));
}

#[test]
fn test_directory_pattern_does_not_match_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("build"), "file named build").unwrap();
    fs::write(dir.path().join("other"), "file named build").unwrap();

    let groups = scan(
        dir.path(),
        WalkerConfig::default().with_exclude_patterns(vec!["build/".to_string()]),
    );

    assert_eq!(groups.len(), 1);
}

#[test]
fn test_include_limits_candidates() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let groups = scan(
        dir.path(),
        WalkerConfig::default().with_include_patterns(vec!["*.rs".to_string()]),
    );

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(groups[0].files.iter().all(|f| f.path.ends_with("main.rs")));
}

#[test]
fn test_include_directory_covers_contents() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("keep/deep")).unwrap();
    fs::write(dir.path().join("keep/deep/a"), "kept").unwrap();
    fs::write(dir.path().join("keep/b"), "kept").unwrap();
    fs::write(dir.path().join("c"), "kept").unwrap();

    let groups = scan(
        dir.path(),
        WalkerConfig::default().with_include_patterns(vec!["keep/".to_string()]),
    );

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_exclude_wins_over_include() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let groups = scan(
        dir.path(),
        WalkerConfig::default()
            .with_include_patterns(vec!["*.rs".to_string()])
            .with_exclude_patterns(vec!["build/".to_string()]),
    );

    assert!(groups.is_empty());
}

#[test]
fn test_malformed_pattern_is_structural_error() {
    let dir = tempdir().unwrap();
    let config = FinderConfig::default().with_walker_config(
        WalkerConfig::default().with_exclude_patterns(vec!["a[".to_string()]),
    );

    let result = DuplicateFinder::new(config).find_duplicates(dir.path());

    assert!(matches!(result, Err(FinderError::InvalidPattern(_))));
}
