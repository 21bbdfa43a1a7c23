//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Depth-first directory walking with cycle protection
//! - Prefix and whole-file hashing with BLAKE3
//! - Hardlink detection
//! - Path helpers used when rendering remediation scripts
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal, filtering and size bucketing
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//! - [`hardlink`]: Inode tracking
//! - [`path_utils`]: Relative paths, root lookup and normalization
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let root = PathBuf::from(".").canonicalize().unwrap();
//! let walker = Walker::new(vec![root], config).unwrap();
//! let (index, stats) = walker.walk();
//! println!("{} files indexed, {} errors", index.total_files(), stats.errors.len());
//! ```

pub mod hardlink;
pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{hash_to_hex, Hash, Hasher, PREHASH_SIZE};
pub use walker::{PatternError, SizeIndex, WalkStats, Walker};

/// Default bound on directory nesting before a subtree is abandoned.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// Metadata for a discovered file.
///
/// `path` is absolute and symlink-resolved, and doubles as the file's
/// identity: the walker never indexes the same resolved path twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute, symlink-resolved path to the file
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Index of the configured root this file was discovered under
    pub root: usize,
    /// Whether the file was reached through a symbolic link
    pub is_symlink: bool,
}

impl FileEntry {
    /// Create a new FileEntry discovered under the first root.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            root: 0,
            is_symlink: false,
        }
    }

    /// Set the index of the root this entry was discovered under.
    #[must_use]
    pub fn with_root(mut self, root: usize) -> Self {
        self.root = root;
        self
    }
}

/// Configuration for directory walking.
///
/// Controls filtering, symlink handling, and other walk behavior.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Descend into subdirectories of each root.
    pub recursive: bool,

    /// Follow symbolic links. When false, links are neither traversed nor sized.
    pub follow_symlinks: bool,

    /// Minimum file size to include (in bytes). Never below 1.
    pub min_size: u64,

    /// Gitignore-style patterns a file must match (any of) to be indexed.
    /// Empty means every file is eligible.
    pub include_patterns: Vec<String>,

    /// Gitignore-style patterns that prune files and directories.
    pub exclude_patterns: Vec<String>,

    /// Index every path of a hardlinked inode instead of only the first.
    pub report_hardlinks: bool,

    /// Directory depth at which a subtree is abandoned with a warning.
    pub max_depth: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: true,
            min_size: 1,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            report_hardlinks: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl WalkerConfig {
    /// Set the minimum file size. A floor of 0 is raised to 1.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        if min_size == 0 {
            log::warn!("Minimum size 0 would report empty files; using 1 byte instead");
        }
        self.min_size = min_size.max(1);
        self
    }

    /// Set whether subdirectories are scanned.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the include patterns.
    #[must_use]
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    /// Set the exclude patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Set whether hardlinks are reported as duplicates.
    #[must_use]
    pub fn with_report_hardlinks(mut self, report: bool) -> Self {
        self.report_hardlinks = report;
        self
    }

    /// Set the maximum directory depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }
}

/// Errors that can occur while scanning a single entry.
///
/// None of these abort a scan; they are logged and collected.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry vanished between listing and access.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The directory nesting bound was reached.
    #[error("Maximum directory depth {depth} reached at {path}")]
    DepthExceeded {
        /// Directory whose subtree was abandoned
        path: PathBuf,
        /// The configured bound
        depth: usize,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading file content failed during verification.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}

/// Errors that can occur while reading file content.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}
