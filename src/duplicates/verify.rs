//! Exact verification (Phase 3).
//!
//! # Overview
//!
//! Every group that survives the prefix filter is checked byte-for-byte. Two
//! strategies are available:
//!
//! - [`VerifyStrategy::Chunked`] reads all members in lockstep, `CHUNK_SIZE`
//!   bytes per round, and splits the group as soon as members diverge. Files
//!   that differ early are never read to the end.
//! - [`VerifyStrategy::Hash`] streams each member through BLAKE3 and groups by
//!   digest.
//!
//! The chunked verifier keeps one open handle per active member. Groups are
//! verified concurrently, so [`MAX_OPEN_FILES`] is split evenly across the
//! pool's threads and any group larger than its share is verified by hash
//! instead.
//!
//! # Chunked algorithm
//!
//! The verifier keeps an explicit worklist of active groups. Each round reads
//! one chunk from every member of a group and partitions the members by the
//! bytes read:
//!
//! - a partition of one is a unique file and is dropped;
//! - a partition of 2+ members that hit end-of-file is a confirmed duplicate set;
//! - any other partition goes back on the worklist.
//!
//! Every active member advances by a full chunk per round, so the loop is
//! bounded by the group's file size. Handles are closed when their member is
//! dropped, whether it finished, diverged or failed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{CandidateGroup, DuplicateGroup};
use crate::progress::ProgressCallback;
use crate::scanner::{FileEntry, Hash, HashError, Hasher};

/// Bytes compared per round by the chunked verifier.
pub const CHUNK_SIZE: usize = 4096;

/// Handles the chunked verifier may hold open across all concurrent groups.
pub const MAX_OPEN_FILES: usize = 256;

/// Largest group one of `threads` concurrent workers may verify in lockstep.
#[must_use]
pub fn open_budget(threads: usize) -> usize {
    MAX_OPEN_FILES / threads.max(1)
}

/// How candidate groups are confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStrategy {
    /// Lockstep chunk comparison with early fan-out
    #[default]
    Chunked,
    /// Whole-file BLAKE3 digest
    Hash,
}

impl std::fmt::Display for VerifyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunked => write!(f, "chunked"),
            Self::Hash => write!(f, "hash"),
        }
    }
}

/// Statistics from the verification phase.
#[derive(Debug, Default)]
pub struct VerifyStats {
    /// Total files that entered Phase 3
    pub input_files: usize,
    /// Files that failed to open or read
    pub failed_files: usize,
    /// Files that matched no other member
    pub unique_files: usize,
    /// Files that changed size since they were indexed
    pub changed_files: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Files in confirmed groups
    pub duplicate_files: usize,
    /// Groups verified by hash because they exceeded the open-file budget
    pub hash_fallbacks: usize,
    /// Errors encountered during verification
    pub errors: Vec<HashError>,
}

impl VerifyStats {
    fn merge(&mut self, other: Self) {
        self.input_files += other.input_files;
        self.failed_files += other.failed_files;
        self.unique_files += other.unique_files;
        self.changed_files += other.changed_files;
        self.duplicate_groups += other.duplicate_groups;
        self.duplicate_files += other.duplicate_files;
        self.hash_fallbacks += other.hash_fallbacks;
        self.errors.extend(other.errors);
    }

    fn record_failure(&mut self, error: HashError) {
        log::warn!("Dropping file from comparison: {}", error);
        self.failed_files += 1;
        self.errors.push(error);
    }

    fn emit(&mut self, size: u64, files: Vec<FileEntry>, out: &mut Vec<DuplicateGroup>) {
        self.duplicate_groups += 1;
        self.duplicate_files += files.len();
        out.push(DuplicateGroup::new(size, files));
    }
}

/// Verify one candidate group with the selected strategy.
///
/// A chunked group with more than `open_budget` members is verified by hash.
#[must_use]
pub fn verify_group(
    group: CandidateGroup,
    strategy: VerifyStrategy,
    hasher: &Hasher,
    open_budget: usize,
) -> (Vec<DuplicateGroup>, VerifyStats) {
    match strategy {
        VerifyStrategy::Chunked if group.len() > open_budget => {
            log::debug!(
                "Group of {} files exceeds open-file budget of {}, verifying by hash",
                group.len(),
                open_budget
            );
            let (groups, mut stats) = verify_by_hash(group, hasher);
            stats.hash_fallbacks += 1;
            (groups, stats)
        }
        VerifyStrategy::Chunked => verify_chunked(group, CHUNK_SIZE),
        VerifyStrategy::Hash => verify_by_hash(group, hasher),
    }
}

/// An active member of a chunked comparison.
struct Member {
    entry: FileEntry,
    file: File,
}

/// Verify by lockstep chunk comparison.
///
/// Returned groups keep the members' input order.
#[must_use]
pub fn verify_chunked(group: CandidateGroup, chunk_size: usize) -> (Vec<DuplicateGroup>, VerifyStats) {
    let mut stats = VerifyStats {
        input_files: group.len(),
        ..Default::default()
    };
    let mut confirmed = Vec::new();
    if !group.has_duplicates() {
        stats.unique_files = group.len();
        return (confirmed, stats);
    }

    let size = group.size;
    let chunk_size = chunk_size.max(1);
    let mut members = Vec::with_capacity(group.len());
    for entry in group.files {
        match File::open(&entry.path) {
            Ok(file) => members.push(Member { entry, file }),
            Err(e) => stats.record_failure(HashError::from_io(entry.path, e)),
        }
    }

    // (bytes consumed so far, members equal up to that offset)
    let mut worklist: Vec<(u64, Vec<Member>)> = vec![(0, members)];
    let mut buffer = vec![0u8; chunk_size];

    while let Some((offset, active)) = worklist.pop() {
        if active.len() < 2 {
            stats.unique_files += active.len();
            continue;
        }

        // Partition index by chunk content, in first-appearance order
        let mut lookup: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut partitions: Vec<(usize, Vec<Member>)> = Vec::new();

        for mut member in active {
            let n = match read_chunk(&mut member.file, &mut buffer) {
                Ok(n) => n,
                Err(e) => {
                    stats.record_failure(HashError::from_io(member.entry.path, e));
                    continue;
                }
            };
            let chunk = &buffer[..n];
            match lookup.get(chunk) {
                Some(&idx) => partitions[idx].1.push(member),
                None => {
                    lookup.insert(chunk.to_vec(), partitions.len());
                    partitions.push((n, vec![member]));
                }
            }
        }

        for (n, members) in partitions {
            if members.len() < 2 {
                stats.unique_files += members.len();
                continue;
            }
            let consumed = offset + n as u64;
            if consumed > size || (n == 0 && consumed != size) {
                for member in members {
                    log::warn!(
                        "File changed size during scan, skipping: {}",
                        member.entry.path.display()
                    );
                    stats.changed_files += 1;
                }
                continue;
            }
            if n == 0 {
                let files = members.into_iter().map(|m| m.entry).collect();
                stats.emit(size, files, &mut confirmed);
            } else {
                worklist.push((consumed, members));
            }
        }
    }

    // The stack pops the most recent partition first; restore input order
    confirmed.reverse();
    (confirmed, stats)
}

/// Fill `buffer` from `file`, stopping early only at end-of-file.
fn read_chunk(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Verify by whole-file BLAKE3 digest.
#[must_use]
pub fn verify_by_hash(group: CandidateGroup, hasher: &Hasher) -> (Vec<DuplicateGroup>, VerifyStats) {
    let mut stats = VerifyStats {
        input_files: group.len(),
        ..Default::default()
    };
    let mut confirmed = Vec::new();
    if !group.has_duplicates() {
        stats.unique_files = group.len();
        return (confirmed, stats);
    }

    let size = group.size;
    let mut lookup: HashMap<Hash, usize> = HashMap::new();
    let mut partitions: Vec<Vec<FileEntry>> = Vec::new();

    for entry in group.files {
        match hasher.full_hash(&entry.path) {
            Ok(hash) => match lookup.get(&hash) {
                Some(&idx) => partitions[idx].push(entry),
                None => {
                    lookup.insert(hash, partitions.len());
                    partitions.push(vec![entry]);
                }
            },
            Err(e) => stats.record_failure(e),
        }
    }

    for files in partitions {
        if files.len() < 2 {
            stats.unique_files += files.len();
        } else {
            stats.emit(size, files, &mut confirmed);
        }
    }

    (confirmed, stats)
}

/// Verify every candidate group on `pool`, one group per task.
///
/// At most [`MAX_OPEN_FILES`] handles are open at once across the pool.
#[must_use]
pub fn phase3_verify(
    groups: Vec<CandidateGroup>,
    strategy: VerifyStrategy,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> (Vec<DuplicateGroup>, VerifyStats) {
    if groups.is_empty() {
        log::debug!("Phase 3: No groups to verify");
        return (Vec::new(), VerifyStats::default());
    }

    let input_files: usize = groups.iter().map(CandidateGroup::len).sum();
    if let Some(callback) = progress {
        callback.on_phase_start("verify", input_files);
    }
    log::info!(
        "Phase 3: Verifying {} files in {} groups ({})",
        input_files,
        groups.len(),
        strategy
    );

    let budget = open_budget(pool.current_num_threads());
    let done = AtomicUsize::new(0);
    let results: Vec<(Vec<DuplicateGroup>, VerifyStats)> = pool.install(|| {
        groups
            .into_par_iter()
            .map(|group| {
                let count = group.len();
                let bytes = group.size * count as u64;
                let result = verify_group(group, strategy, hasher, budget);
                let current = done.fetch_add(count, Ordering::Relaxed) + count;
                if let Some(callback) = progress {
                    callback.on_item_completed(bytes);
                    callback.on_progress(current, "");
                }
                result
            })
            .collect()
    });

    let mut stats = VerifyStats::default();
    let mut confirmed = Vec::new();
    for (groups, group_stats) in results {
        confirmed.extend(groups);
        stats.merge(group_stats);
    }

    if let Some(callback) = progress {
        callback.on_phase_end("verify");
    }
    log::info!(
        "Phase 3 complete: {} files → {} duplicates in {} groups",
        stats.input_files,
        stats.duplicate_files,
        stats.duplicate_groups
    );

    (confirmed, stats)
}
