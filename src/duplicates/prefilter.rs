//! Prefix-hash filter (Phase 2).
//!
//! Splits each same-size candidate group by the BLAKE3 digest of its members'
//! leading bytes. Equal digests only keep files together for the next phase;
//! they never confirm duplication. Singleton sub-groups and unreadable files
//! are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::CandidateGroup;
use crate::progress::ProgressCallback;
use crate::scanner::{Hash, HashError, Hasher};

/// Statistics from prefix-hash phase.
#[derive(Debug, Default)]
pub struct PrehashStats {
    /// Total files that entered Phase 2
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (I/O errors)
    pub failed_files: usize,
    /// Files whose prefix matched no other member
    pub unique_prehashes: usize,
    /// Number of files that could still be duplicates
    pub potential_duplicates: usize,
    /// Number of sub-groups with 2+ files
    pub duplicate_groups: usize,
    /// Errors encountered during prehash
    pub errors: Vec<HashError>,
}

impl PrehashStats {
    /// Percentage of files eliminated by prehash comparison.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.potential_duplicates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }

    fn merge(&mut self, other: Self) {
        self.input_files += other.input_files;
        self.hashed_files += other.hashed_files;
        self.failed_files += other.failed_files;
        self.unique_prehashes += other.unique_prehashes;
        self.potential_duplicates += other.potential_duplicates;
        self.duplicate_groups += other.duplicate_groups;
        self.errors.extend(other.errors);
    }
}

/// Partition one candidate group by prefix digest.
///
/// Sub-groups keep the members' relative order and appear in order of their
/// first member.
#[must_use]
pub fn split_by_prehash(group: CandidateGroup, hasher: &Hasher) -> (Vec<CandidateGroup>, PrehashStats) {
    let mut stats = PrehashStats {
        input_files: group.len(),
        ..Default::default()
    };
    if !group.has_duplicates() {
        stats.unique_prehashes = group.len();
        return (Vec::new(), stats);
    }

    let size = group.size;
    let mut partitions: Vec<Vec<_>> = Vec::new();
    let mut lookup: HashMap<Hash, usize> = HashMap::new();

    for file in group.files {
        match hasher.prehash(&file.path) {
            Ok(hash) => {
                stats.hashed_files += 1;
                match lookup.get(&hash) {
                    Some(&idx) => partitions[idx].push(file),
                    None => {
                        lookup.insert(hash, partitions.len());
                        partitions.push(vec![file]);
                    }
                }
            }
            Err(e) => {
                log::warn!("Failed to prehash {}: {}", file.path.display(), e);
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    let mut groups = Vec::new();
    for files in partitions {
        if files.len() < 2 {
            stats.unique_prehashes += files.len();
            if let Some(file) = files.first() {
                log::trace!("Eliminated unique prehash: {}", file.path.display());
            }
            continue;
        }
        stats.potential_duplicates += files.len();
        stats.duplicate_groups += 1;
        groups.push(CandidateGroup::new(size, files));
    }

    (groups, stats)
}

/// Run the prefix-hash filter over every candidate group on `pool`.
///
/// Output keeps the input group order.
#[must_use]
pub fn phase2_prehash(
    groups: Vec<CandidateGroup>,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> (Vec<CandidateGroup>, PrehashStats) {
    let input_files: usize = groups.iter().map(CandidateGroup::len).sum();
    if groups.is_empty() {
        log::debug!("Phase 2: No files to process");
        return (Vec::new(), PrehashStats::default());
    }

    if let Some(callback) = progress {
        callback.on_phase_start("prehash", input_files);
    }
    log::info!(
        "Phase 2: Computing prehashes for {} files in {} groups",
        input_files,
        groups.len()
    );

    let done = AtomicUsize::new(0);
    let results: Vec<(Vec<CandidateGroup>, PrehashStats)> = pool.install(|| {
        groups
            .into_par_iter()
            .map(|group| {
                let count = group.len();
                log::debug!("Testing {} files of size {}", count, group.size);
                let result = split_by_prehash(group, hasher);
                let current = done.fetch_add(count, Ordering::Relaxed) + count;
                if let Some(callback) = progress {
                    callback.on_progress(current, "");
                }
                result
            })
            .collect()
    });

    let mut stats = PrehashStats::default();
    let mut survivors = Vec::new();
    for (groups, group_stats) in results {
        survivors.extend(groups);
        stats.merge(group_stats);
    }
    debug_assert_eq!(stats.input_files, input_files);

    if let Some(callback) = progress {
        callback.on_phase_end("prehash");
    }
    log::info!(
        "Phase 2 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.input_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (survivors, stats)
}
