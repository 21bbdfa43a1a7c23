//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: enumerate files under every root into a size index
//! 2. **Phase 1 - Size grouping**: keep sizes shared by 2+ files
//! 3. **Phase 2 - Prefix hash**: split groups by the digest of their first 1 KiB
//! 4. **Phase 3 - Verification**: confirm byte-for-byte equality
//! 5. **Ordering**: put the presumed original first in each group
//!
//! The resolved [`FinderConfig`] is passed in explicitly; a finder holds no
//! state between runs and can be invoked repeatedly.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_io_threads(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder
//!     .find_duplicates_in_paths(&[PathBuf::from("/some/path")])
//!     .unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{
    group_by_size, phase2_prehash, phase3_verify, DuplicateGroup, OriginalScorer,
    ScorePatternError, VerifyStrategy,
};
use crate::progress::ProgressCallback;
use crate::scanner::{Hasher, PatternError, ScanError, SizeIndex, Walker, WalkerConfig};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing and verification.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Exact verification strategy.
    pub verify: VerifyStrategy,
    /// Original-first ordering applied to every confirmed group.
    pub scorer: OriginalScorer,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("verify", &self.verify)
            .field("scorer", &self.scorer)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            verify: VerifyStrategy::default(),
            scorer: OriginalScorer::default(),
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the verification strategy.
    #[must_use]
    pub fn with_verify(mut self, strategy: VerifyStrategy) -> Self {
        self.verify = strategy;
        self
    }

    /// Set the scorer used to pick originals.
    #[must_use]
    pub fn with_scorer(mut self, scorer: OriginalScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Canonical roots that were scanned
    pub roots: Vec<PathBuf>,
    /// Total number of files indexed
    pub total_files: usize,
    /// Total size of all indexed files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of files eliminated by prefix hash
    pub eliminated_by_prehash: usize,
    /// Number of files eliminated by exact verification
    pub eliminated_by_verify: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by replacing copies with links
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Errors encountered during the scan; none of them stopped it
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize::b(self.total_size).to_string()
    }

    /// Whether any file could not be read.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An include or exclude pattern could not be compiled.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    /// An original/not-original pattern could not be compiled.
    #[error(transparent)]
    InvalidScorePattern(#[from] ScorePatternError),

    /// A root could not be read.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The I/O thread pool could not be created.
    #[error("Failed to create I/O thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under a single directory.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates_in_paths`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        self.find_duplicates_in_paths(&[path.to_path_buf()])
    }

    /// Find all duplicate files under one or more directories.
    ///
    /// Groups are returned original-first, largest size first, then by
    /// original path.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - a root does not exist, is not a directory, or cannot be listed
    /// - an include or exclude pattern is malformed
    /// - the I/O thread pool cannot be created
    ///
    /// Per-file failures never abort the scan; they are collected in
    /// [`ScanSummary::scan_errors`].
    pub fn find_duplicates_in_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if paths.is_empty() {
            log::warn!("No paths provided for scanning");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        let roots = resolve_roots(paths)?;
        log::info!(
            "Starting scan of {} root(s): {:?}",
            roots.len(),
            roots.iter().map(|p| p.display()).collect::<Vec<_>>()
        );

        let mut walker = Walker::new(roots.clone(), self.config.walker_config.clone())?;
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
            callback.on_phase_start("walking", 0);
        }
        let (index, walk_stats) = walker.walk();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        summary.roots = roots;
        summary.scan_errors = walk_stats.errors;

        let groups = self.find_duplicates_in_index(index, &mut summary)?;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete in {:.2?}: {} duplicate groups, {} duplicate files, {} reclaimable ({} errors)",
            summary.scan_duration,
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_errors.len()
        );

        Ok((groups, summary))
    }

    /// Run phases 1 to 3 and ordering over an existing size index.
    ///
    /// Counts and errors are accumulated into `summary`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the I/O pool cannot be created.
    pub fn find_duplicates_in_index(
        &self,
        index: SizeIndex,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        summary.total_files = index.total_files();
        summary.total_size = index.total_size();
        log::info!(
            "Found {} files ({} total)",
            summary.total_files,
            summary.total_size_display()
        );

        log::info!("Phase 1: Grouping by size...");
        let (size_groups, size_stats) = group_by_size(index);
        summary.eliminated_by_size = size_stats.eliminated_unique;
        if size_groups.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;
        let progress = self.config.progress_callback.as_ref();

        let (prehash_groups, prehash_stats) =
            phase2_prehash(size_groups, &self.hasher, &pool, progress);
        summary.eliminated_by_prehash =
            prehash_stats.input_files - prehash_stats.potential_duplicates;
        summary
            .scan_errors
            .extend(prehash_stats.errors.into_iter().map(ScanError::from));
        if prehash_groups.is_empty() {
            log::info!("No potential duplicates found after prefix hashing");
            return Ok(Vec::new());
        }

        let (mut groups, verify_stats) =
            phase3_verify(prehash_groups, self.config.verify, &self.hasher, &pool, progress);
        summary.eliminated_by_verify = verify_stats.input_files - verify_stats.duplicate_files;
        summary
            .scan_errors
            .extend(verify_stats.errors.into_iter().map(ScanError::from));

        self.config.scorer.order_all(&mut groups);
        groups.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then_with(|| {
                    let a = a.original().map(|f| &f.path);
                    let b = b.original().map(|f| &f.path);
                    a.cmp(&b)
                })
        });

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();

        Ok(groups)
    }
}

/// Canonicalize and validate every root.
fn resolve_roots(paths: &[PathBuf]) -> Result<Vec<PathBuf>, FinderError> {
    paths
        .iter()
        .map(|path| {
            let canonical = std::fs::canonicalize(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FinderError::PathNotFound(path.clone())
                } else {
                    FinderError::IoWithPath {
                        path: path.clone(),
                        source: e,
                    }
                }
            })?;
            if !canonical.is_dir() {
                return Err(FinderError::NotADirectory(path.clone()));
            }
            std::fs::read_dir(&canonical).map_err(|e| FinderError::IoWithPath {
                path: path.clone(),
                source: e,
            })?;
            Ok(canonical)
        })
        .collect()
}
