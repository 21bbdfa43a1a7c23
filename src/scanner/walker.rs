//! Directory walker and size index.
//!
//! # Overview
//!
//! [`Walker`] enumerates candidate files under one or more roots and buckets
//! them by exact byte length into a [`SizeIndex`]. Traversal is single-threaded
//! and depth-first via [`walkdir`], with entries sorted by file name so that a
//! run is reproducible.
//!
//! # Traversal rules
//!
//! - Symlinks are skipped outright unless `follow_symlinks` is set; followed
//!   links that dangle or lead back into an ancestor are skipped.
//! - Every directory is canonicalized and recorded in a visited set. Reaching
//!   the same physical directory again (second root, symlink, bind mount) is a
//!   no-op.
//! - Exclude patterns prune files and whole directories before any other work.
//!   Include patterns only restrict which files are indexed.
//! - Files below `min_size` are dropped. Each resolved path is indexed once,
//!   and unless `report_hardlinks` is set, so is each inode.
//! - Per-entry failures are logged and collected in [`WalkStats::errors`];
//!   they never stop the walk.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("/home/user/Downloads").canonicalize().unwrap()];
//! let walker = Walker::new(roots, WalkerConfig::default()).unwrap();
//! let (index, stats) = walker.walk();
//! for (size, files) in index.buckets_largest_first() {
//!     println!("{size} bytes: {} files", files.len());
//! }
//! println!("{} errors", stats.errors.len());
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::hardlink::HardlinkTracker;
use super::{FileEntry, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Files bucketed by exact byte length.
///
/// Every entry appears in exactly one bucket and the bucket key equals the
/// entry's size. The set of visited directories is kept alongside but is not
/// a size class.
#[derive(Debug, Default)]
pub struct SizeIndex {
    buckets: BTreeMap<u64, Vec<FileEntry>>,
    visited_dirs: HashSet<PathBuf>,
}

impl SizeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from already-discovered entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Add a file to the bucket matching its size.
    pub fn insert(&mut self, entry: FileEntry) {
        self.buckets.entry(entry.size).or_default().push(entry);
    }

    /// Record a canonical directory path. Returns `false` if it was already visited.
    pub fn mark_visited(&mut self, dir: PathBuf) -> bool {
        self.visited_dirs.insert(dir)
    }

    /// Whether a canonical directory path has been visited.
    #[must_use]
    pub fn is_visited(&self, dir: &Path) -> bool {
        self.visited_dirs.contains(dir)
    }

    /// Number of distinct directories visited.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited_dirs.len()
    }

    /// Files with exactly `size` bytes.
    #[must_use]
    pub fn bucket(&self, size: u64) -> Option<&[FileEntry]> {
        self.buckets.get(&size).map(Vec::as_slice)
    }

    /// Number of distinct sizes.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of indexed files.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Total bytes across all indexed files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.buckets
            .iter()
            .map(|(size, files)| size * files.len() as u64)
            .sum()
    }

    /// Iterate buckets from the largest size down.
    pub fn buckets_largest_first(&self) -> impl Iterator<Item = (u64, &[FileEntry])> {
        self.buckets
            .iter()
            .rev()
            .map(|(size, files)| (*size, files.as_slice()))
    }

    /// Consume the index, yielding owned buckets from the largest size down.
    pub fn into_buckets_largest_first(self) -> impl Iterator<Item = (u64, Vec<FileEntry>)> {
        self.buckets.into_iter().rev()
    }
}

/// Statistics from a walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Files added to the index
    pub files_indexed: usize,
    /// Distinct directories scanned
    pub dirs_visited: usize,
    /// Directories reached again through another route
    pub dirs_revisited: usize,
    /// Symlinks skipped (not followed, or dangling)
    pub symlinks_skipped: usize,
    /// Symlinks that led back into an ancestor directory
    pub cycles_skipped: usize,
    /// Files and directories pruned by exclude patterns
    pub excluded: usize,
    /// Files not matching any include pattern
    pub not_included: usize,
    /// Files smaller than the size floor
    pub below_min_size: usize,
    /// Paths already indexed through another route
    pub already_indexed: usize,
    /// Additional paths of an inode already indexed
    pub hardlinks_skipped: usize,
    /// Per-entry errors; none of them stopped the walk
    pub errors: Vec<ScanError>,
}

/// Invalid include or exclude pattern.
#[derive(thiserror::Error, Debug)]
#[error("Invalid pattern '{pattern}': {message}")]
pub struct PatternError {
    /// The offending pattern
    pub pattern: String,
    /// Why it was rejected
    pub message: String,
}

/// Compiled include/exclude matchers for one root.
#[derive(Debug)]
struct RootFilters {
    exclude: Option<Gitignore>,
    include: Option<Gitignore>,
}

impl RootFilters {
    fn build(root: &Path, config: &WalkerConfig) -> Result<Self, PatternError> {
        Ok(Self {
            exclude: build_matcher(root, &config.exclude_patterns)?,
            include: build_matcher(root, &config.include_patterns)?,
        })
    }

    fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|gi| gi.matched(relative, is_dir).is_ignore())
    }

    fn is_included(&self, relative: &Path) -> bool {
        match &self.include {
            None => true,
            Some(gi) => gi
                .matched_path_or_any_parents(relative, false)
                .is_ignore(),
        }
    }
}

fn build_matcher(root: &Path, patterns: &[String]) -> Result<Option<Gitignore>, PatternError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| PatternError {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
    }
    let matcher = builder.build().map_err(|e| PatternError {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })?;
    Ok(Some(matcher))
}

/// Mutable bookkeeping for one walk across all roots.
#[derive(Default)]
struct WalkState {
    index: SizeIndex,
    stats: WalkStats,
    /// Nominal directory path -> canonical path, for resolving file paths
    dir_aliases: HashMap<PathBuf, PathBuf>,
    seen_files: HashSet<PathBuf>,
    hardlinks: HardlinkTracker,
}

/// Depth-first file discovery across several roots.
pub struct Walker {
    roots: Vec<PathBuf>,
    filters: Vec<RootFilters>,
    config: WalkerConfig,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a walker over canonical root directories.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if an include or exclude pattern is malformed.
    pub fn new(roots: Vec<PathBuf>, mut config: WalkerConfig) -> Result<Self, PatternError> {
        if config.min_size == 0 {
            log::warn!("Minimum size 0 would report empty files; using 1 byte instead");
            config.min_size = 1;
        }
        let filters = roots
            .iter()
            .map(|root| RootFilters::build(root, &config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            roots,
            filters,
            config,
            progress_callback: None,
        })
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Roots this walker scans.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk every root and return the size index with walk statistics.
    #[must_use]
    pub fn walk(&self) -> (SizeIndex, WalkStats) {
        let mut state = WalkState::default();

        for (root_idx, root) in self.roots.iter().enumerate() {
            log::info!("Scanning directory \"{}\"", root.display());
            self.walk_root(root_idx, root, &mut state);
        }

        state.stats.dirs_visited = state.index.visited_count();
        log::info!(
            "Walk complete: {} files in {} sizes across {} directories ({} errors)",
            state.stats.files_indexed,
            state.index.bucket_count(),
            state.stats.dirs_visited,
            state.stats.errors.len()
        );
        (state.index, state.stats)
    }

    fn walk_root(&self, root_idx: usize, root: &Path, state: &mut WalkState) {
        let filters = &self.filters[root_idx];
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut entries = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter();

        while let Some(result) = entries.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    self.handle_walk_error(root, e, state);
                    continue;
                }
            };

            let depth = entry.depth();
            if depth > 0 && entry.path_is_symlink() && !self.config.follow_symlinks {
                log::trace!("Skipping symlink: {}", entry.path().display());
                state.stats.symlinks_skipped += 1;
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());

            if entry.file_type().is_dir() {
                if depth > 0 && !self.config.recursive {
                    continue;
                }
                if depth > 0 && filters.is_excluded(relative, true) {
                    log::trace!("Excluding directory: {}", entry.path().display());
                    state.stats.excluded += 1;
                    entries.skip_current_dir();
                    continue;
                }
                if !self.enter_directory(&entry, state) {
                    entries.skip_current_dir();
                }
                continue;
            }

            // Sockets, FIFOs and devices are never candidates
            if !entry.file_type().is_file() {
                continue;
            }

            if filters.is_excluded(relative, false) {
                log::trace!("Excluding file: {}", entry.path().display());
                state.stats.excluded += 1;
                continue;
            }
            if !filters.is_included(relative) {
                log::trace!("Not included: {}", entry.path().display());
                state.stats.not_included += 1;
                continue;
            }

            self.index_file(root_idx, &entry, state);
        }
    }

    /// Record a directory as visited. Returns `false` if its contents must be skipped.
    fn enter_directory(&self, entry: &DirEntry, state: &mut WalkState) -> bool {
        let path = entry.path();

        if entry.depth() >= self.config.max_depth {
            let err = ScanError::DepthExceeded {
                path: path.to_path_buf(),
                depth: self.config.max_depth,
            };
            log::warn!("{}; abandoning subtree", err);
            state.stats.errors.push(err);
            return false;
        }

        let canonical = match std::fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(e) => {
                self.record_io_error(path, e, state);
                return false;
            }
        };

        if !state.index.mark_visited(canonical.clone()) {
            log::debug!(
                "Already visited {} (via {}), skipping",
                canonical.display(),
                path.display()
            );
            state.stats.dirs_revisited += 1;
            return false;
        }

        log::debug!("Stepping into directory \"{}\"", path.display());
        state.dir_aliases.insert(path.to_path_buf(), canonical);
        true
    }

    fn index_file(&self, root_idx: usize, entry: &DirEntry, state: &mut WalkState) {
        let path = entry.path();

        // Follows the link when follow_symlinks is set
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                self.record_io_error(path, io, state);
                return;
            }
        };

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!("Skipping file below size floor ({} bytes): {}", size, path.display());
            state.stats.below_min_size += 1;
            return;
        }

        let resolved = match self.resolve_file_path(entry, state) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.record_io_error(path, e, state);
                return;
            }
        };

        if !state.seen_files.insert(resolved.clone()) {
            log::debug!(
                "Already indexed {} (via {}), skipping",
                resolved.display(),
                path.display()
            );
            state.stats.already_indexed += 1;
            return;
        }

        if !self.config.report_hardlinks && state.hardlinks.is_hardlink(&metadata) {
            log::debug!("Skipping hardlink: {}", path.display());
            state.stats.hardlinks_skipped += 1;
            return;
        }

        state.stats.files_indexed += 1;
        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(state.stats.files_indexed, path.to_string_lossy().as_ref());
        }

        state.index.insert(FileEntry {
            path: resolved,
            size,
            root: root_idx,
            is_symlink: entry.path_is_symlink(),
        });
    }

    /// Absolute, symlink-free path of a file entry.
    fn resolve_file_path(&self, entry: &DirEntry, state: &WalkState) -> std::io::Result<PathBuf> {
        let path = entry.path();
        if !entry.path_is_symlink() {
            let canonical_parent = path.parent().and_then(|p| state.dir_aliases.get(p));
            if let (Some(parent), Some(name)) = (canonical_parent, path.file_name()) {
                return Ok(parent.join(name));
            }
        }
        std::fs::canonicalize(path)
    }

    fn handle_walk_error(&self, root: &Path, error: walkdir::Error, state: &mut WalkState) {
        let path = error
            .path()
            .map_or_else(|| root.to_path_buf(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            log::warn!(
                "Symlink cycle: {} leads back to {}, skipping",
                path.display(),
                ancestor.display()
            );
            state.stats.cycles_skipped += 1;
            return;
        }

        let is_dangling = error
            .io_error()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
            && std::fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink());
        if is_dangling {
            log::debug!("Skipping dangling symlink: {}", path.display());
            state.stats.symlinks_skipped += 1;
            return;
        }

        let io = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
        self.record_io_error(&path, io, state);
    }

    fn record_io_error(&self, path: &Path, error: std::io::Error, state: &mut WalkState) {
        let err = ScanError::from_io(path.to_path_buf(), error);
        match err {
            ScanError::NotFound(_) => {
                log::warn!("File vanished during scan: {}", path.display());
            }
            _ => log::warn!("{}", err),
        }
        state.stats.errors.push(err);
    }
}
