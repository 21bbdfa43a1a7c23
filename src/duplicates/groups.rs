//! Candidate and confirmed duplicate groups.
//!
//! # Overview
//!
//! A [`CandidateGroup`] holds files believed identical at the current stage of
//! the pipeline. Groups only ever shrink or split; a group that falls below two
//! members is dropped. A [`DuplicateGroup`] is a group whose members have been
//! verified byte-for-byte identical, ordered with the presumed original first.
//!
//! ## Size Grouping (Phase 1)
//!
//! [`group_by_size`] turns a [`SizeIndex`] into candidate groups, discarding
//! unique sizes and emitting the largest sizes first.
//!
//! # Example
//!
//! ```
//! use dupelink::scanner::{FileEntry, SizeIndex};
//! use dupelink::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let index = SizeIndex::from_entries(vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ]);
//!
//! let (groups, stats) = group_by_size(index);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::path::{Path, PathBuf};

use crate::scanner::{FileEntry, SizeIndex};

/// Files of one size that may still be duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileEntry>,
}

impl CandidateGroup {
    /// Create a candidate group.
    #[must_use]
    pub fn new(size: u64, files: Vec<FileEntry>) -> Self {
        debug_assert!(
            files.iter().all(|f| f.size == size),
            "every member must have size {size}"
        );
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group can still contain duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }

    /// Potential space savings (all copies minus one).
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.size * self.files.len().saturating_sub(1) as u64
    }
}

/// Verified set of byte-identical files.
///
/// `files[0]` is the presumed original once the scorer has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// File size in bytes
    pub size: u64,
    /// Identical files, original first
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(size: u64, files: Vec<FileEntry>) -> Self {
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The presumed original.
    #[must_use]
    pub fn original(&self) -> Option<&FileEntry> {
        self.files.first()
    }

    /// Every member except the original.
    #[must_use]
    pub fn copies(&self) -> &[FileEntry] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space freed by replacing every copy with a link.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Whether `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

impl From<CandidateGroup> for DuplicateGroup {
    fn from(group: CandidateGroup) -> Self {
        Self::new(group.size, group.files)
    }
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of size groups with 2+ files (potential duplicate groups)
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (Phase 1 of duplicate detection).
///
/// Returns candidate groups of 2+ files, largest size first. No file I/O is
/// performed.
#[must_use]
pub fn group_by_size(index: SizeIndex) -> (Vec<CandidateGroup>, GroupingStats) {
    let mut stats = GroupingStats {
        total_files: index.total_files(),
        total_size: index.total_size(),
        unique_sizes: index.bucket_count(),
        ..Default::default()
    };

    let mut groups = Vec::new();
    for (size, files) in index.into_buckets_largest_first() {
        if files.len() < 2 {
            stats.eliminated_unique += files.len();
            if let Some(file) = files.first() {
                log::trace!("Eliminated unique size {}: {}", size, file.path.display());
            }
            continue;
        }
        log::debug!("Size group {} bytes: {} potential duplicates", size, files.len());
        stats.potential_duplicates += files.len();
        stats.duplicate_groups += 1;
        groups.push(CandidateGroup::new(size, files));
    }

    log::info!(
        "Phase 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (groups, stats)
}
