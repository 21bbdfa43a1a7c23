use dupelink::config::Config;
use dupelink::duplicates::{DuplicateFinder, LengthPreference, VerifyStrategy};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.io_threads, 4);
    assert_eq!(config.length_preference, LengthPreference::None);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("DUPELINK_MAX_DEPTH", "32");
    std::env::set_var("DUPELINK_LENGTH_PREFERENCE", "longest");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("DUPELINK_").split("__"))
        .extract()
        .unwrap();

    assert_eq!(config.max_depth, 32);
    assert_eq!(config.length_preference, LengthPreference::Longest);

    std::env::remove_var("DUPELINK_MAX_DEPTH");
    std::env::remove_var("DUPELINK_LENGTH_PREFERENCE");
}

#[test]
fn test_config_load_from_toml_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
recursive = false
min_size = 2048
include = ["*.jpg", "*.png"]
original_patterns = ["^/srv/photos/"]
verify = "hash"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert!(!config.recursive);
    assert_eq!(config.min_size, 2048);
    assert_eq!(config.include, vec!["*.jpg", "*.png"]);
    assert_eq!(config.original_patterns, vec!["^/srv/photos/"]);
    assert_eq!(config.verify, VerifyStrategy::Hash);
    assert!(config.follow_symlinks);
}

#[test]
fn test_config_invalid_toml_is_error() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "min_size = [not toml").unwrap();

    // Figment should return error on invalid TOML format
    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract();

    assert!(result.is_err());
    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_wrong_type_is_error() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "verify = \"bytewise\"\n").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_configured_exclude_applies_to_scan() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("cache")).unwrap();
    fs::write(dir.path().join("a"), "configured").unwrap();
    fs::write(dir.path().join("cache/a"), "configured").unwrap();

    let config = Config {
        exclude: vec!["cache/".to_string()],
        ..Config::default()
    };
    let finder = DuplicateFinder::new(config.to_finder_config().unwrap());
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}
