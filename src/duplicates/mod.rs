//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Prefix-hash filtering (Phase 2)
//! - Exact verification by chunk comparison or full hash (Phase 3)
//! - Original-first ordering of confirmed groups

pub mod finder;
pub mod groups;
pub mod prefilter;
pub mod scoring;
pub mod verify;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_size, CandidateGroup, DuplicateGroup, GroupingStats};
pub use prefilter::{phase2_prehash, split_by_prehash, PrehashStats};
pub use scoring::{LengthPreference, OriginalScorer, Polarity, ScorePattern, ScorePatternError};
pub use verify::{
    open_budget, phase3_verify, verify_by_hash, verify_chunked, verify_group, VerifyStats,
    VerifyStrategy, CHUNK_SIZE, MAX_OPEN_FILES,
};
