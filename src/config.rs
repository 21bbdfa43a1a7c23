//! Layered scan configuration.
//!
//! Settings are resolved from, lowest priority first:
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. a TOML file, either `--config PATH` or `config.toml` in the platform
//!    config directory (a missing default file is skipped);
//! 3. `DUPELINK_*` environment variables, e.g. `DUPELINK_MIN_SIZE=4096`;
//! 4. command-line flags ([`Config::apply_scan_args`]).
//!
//! ```toml
//! min_size = 4096
//! exclude = [".git/", "*.tmp"]
//! original_patterns = ["^/srv/archive/"]
//! length_preference = "shortest"
//! ```

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::ScanArgs;
use crate::duplicates::{
    FinderConfig, FinderError, LengthPreference, OriginalScorer, VerifyStrategy,
};
use crate::scanner::{WalkerConfig, DEFAULT_MAX_DEPTH};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPELINK_";

/// Persistable defaults for every scan option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Smallest file size considered, in bytes.
    pub min_size: u64,
    /// Gitignore-style include patterns.
    pub include: Vec<String>,
    /// Gitignore-style exclude patterns.
    pub exclude: Vec<String>,
    /// Regexes for paths that look like originals.
    pub original_patterns: Vec<String>,
    /// Regexes for paths that look like copies.
    pub not_original_patterns: Vec<String>,
    /// Path-length preference for choosing originals.
    pub length_preference: LengthPreference,
    /// Exact verification strategy.
    pub verify: VerifyStrategy,
    /// Report every path of a hardlinked file.
    pub report_hardlinks: bool,
    /// Threads used for reading file content.
    pub io_threads: usize,
    /// Directory nesting bound.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: true,
            min_size: 1,
            include: Vec::new(),
            exclude: Vec::new(),
            original_patterns: Vec::new(),
            not_original_patterns: Vec::new(),
            length_preference: LengthPreference::default(),
            verify: VerifyStrategy::default(),
            report_hardlinks: false,
            io_threads: 4,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Platform default location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupelink").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the provider stack without extracting it.
    ///
    /// # Errors
    ///
    /// Fails if an explicitly requested file does not exist.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Using config file {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Fails on a missing explicit file, malformed TOML, or a value of the
    /// wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?
            .extract()
            .context("Invalid configuration")?;
        log::trace!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Apply command-line flags on top of the loaded settings.
    ///
    /// Scalar flags replace configured values; pattern flags are appended.
    #[must_use]
    pub fn apply_scan_args(mut self, args: &ScanArgs) -> Self {
        if args.flat {
            self.recursive = false;
        }
        if args.no_follow_symlinks {
            self.follow_symlinks = false;
        }
        if args.report_hardlinks {
            self.report_hardlinks = true;
        }
        if let Some(min_size) = args.min_size {
            self.min_size = min_size;
        }
        if let Some(pref) = args.prefer {
            self.length_preference = pref;
        }
        if let Some(verify) = args.verify {
            self.verify = verify;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(depth) = args.max_depth {
            self.max_depth = depth;
        }
        self.include.extend(args.include_patterns.iter().cloned());
        self.exclude.extend(args.exclude_patterns.iter().cloned());
        self.original_patterns
            .extend(args.original_patterns.iter().cloned());
        self.not_original_patterns
            .extend(args.not_original_patterns.iter().cloned());
        self
    }

    /// Walker settings for these options.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_recursive(self.recursive)
            .with_follow_symlinks(self.follow_symlinks)
            .with_min_size(self.min_size)
            .with_include_patterns(self.include.clone())
            .with_exclude_patterns(self.exclude.clone())
            .with_report_hardlinks(self.report_hardlinks)
            .with_max_depth(self.max_depth)
    }

    /// Resolve into a finder configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidScorePattern`] for a malformed regex.
    pub fn to_finder_config(&self) -> Result<FinderConfig, FinderError> {
        let scorer = OriginalScorer::new(
            &self.original_patterns,
            &self.not_original_patterns,
            self.length_preference,
        )?;
        Ok(FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_walker_config(self.walker_config())
            .with_verify(self.verify)
            .with_scorer(scorer))
    }
}
