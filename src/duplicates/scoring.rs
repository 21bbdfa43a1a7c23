//! Original selection.
//!
//! [`OriginalScorer`] orders each [`DuplicateGroup`] so that the presumed
//! original comes first. Ordering runs in two stable passes:
//!
//! 1. an optional path-length pass (segment count, then byte length);
//! 2. a score pass where each "not original" pattern a path matches adds one
//!    and each "original" pattern subtracts one. Lower scores sort first.
//!
//! Ties in the score pass keep the length ordering. With no patterns and no
//! length preference the verifier's order is left untouched.
//!
//! # Example
//!
//! ```
//! use dupelink::duplicates::{DuplicateGroup, LengthPreference, OriginalScorer};
//! use dupelink::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let scorer = OriginalScorer::new(
//!     &["/canonical/".to_string()],
//!     &["/tmp/".to_string()],
//!     LengthPreference::None,
//! )
//! .unwrap();
//!
//! let mut group = DuplicateGroup::new(5, vec![
//!     FileEntry::new(PathBuf::from("/tmp/a.txt"), 5),
//!     FileEntry::new(PathBuf::from("/canonical/a.txt"), 5),
//! ]);
//! scorer.order(&mut group);
//! assert_eq!(group.files[0].path, PathBuf::from("/canonical/a.txt"));
//! ```

use std::cmp::Reverse;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::DuplicateGroup;
use crate::scanner::path_utils::{normalized_display, path_length_key};

/// Path-length tie-break applied before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LengthPreference {
    /// Keep the verifier's order
    #[default]
    None,
    /// Fewest segments, then fewest bytes, first
    Shortest,
    /// Most segments, then most bytes, first
    Longest,
}

/// Whether a pattern marks a path as original or as a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Matching paths look like originals
    Original,
    /// Matching paths look like copies
    NotOriginal,
}

impl Polarity {
    /// Contribution of one match to a path's score.
    #[must_use]
    pub fn weight(self) -> i32 {
        match self {
            Self::Original => -1,
            Self::NotOriginal => 1,
        }
    }
}

/// A compiled scoring pattern.
#[derive(Debug, Clone)]
pub struct ScorePattern {
    regex: Regex,
    polarity: Polarity,
}

impl ScorePattern {
    /// Compile `pattern` as a regular expression.
    ///
    /// # Errors
    ///
    /// Returns [`ScorePatternError`] if the expression is invalid.
    pub fn new(pattern: &str, polarity: Polarity) -> Result<Self, ScorePatternError> {
        let regex = Regex::new(pattern).map_err(|source| ScorePatternError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex, polarity })
    }

    /// Score contribution for an already-normalized path string.
    fn contribution(&self, path: &str) -> i32 {
        if self.regex.is_match(path) {
            self.polarity.weight()
        } else {
            0
        }
    }
}

/// Invalid scoring pattern.
#[derive(thiserror::Error, Debug)]
#[error("Invalid scoring pattern '{pattern}': {source}")]
pub struct ScorePatternError {
    /// The offending pattern
    pub pattern: String,
    /// Regex compilation error
    #[source]
    pub source: regex::Error,
}

/// Orders duplicate groups original-first.
#[derive(Debug, Clone, Default)]
pub struct OriginalScorer {
    patterns: Vec<ScorePattern>,
    length_preference: LengthPreference,
}

impl OriginalScorer {
    /// Compile original and not-original patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ScorePatternError`] for the first invalid pattern.
    pub fn new(
        original: &[String],
        not_original: &[String],
        length_preference: LengthPreference,
    ) -> Result<Self, ScorePatternError> {
        let patterns = original
            .iter()
            .map(|p| ScorePattern::new(p, Polarity::Original))
            .chain(
                not_original
                    .iter()
                    .map(|p| ScorePattern::new(p, Polarity::NotOriginal)),
            )
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            length_preference,
        })
    }

    /// The configured length preference.
    #[must_use]
    pub fn length_preference(&self) -> LengthPreference {
        self.length_preference
    }

    /// Whether ordering leaves groups untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.patterns.is_empty() && self.length_preference == LengthPreference::None
    }

    /// Score a path; lower looks more original.
    #[must_use]
    pub fn score(&self, path: &Path) -> i32 {
        if self.patterns.is_empty() {
            return 0;
        }
        let normalized = normalized_display(path);
        self.patterns
            .iter()
            .map(|p| p.contribution(&normalized))
            .sum()
    }

    /// Reorder `group` so the presumed original is first.
    pub fn order(&self, group: &mut DuplicateGroup) {
        match self.length_preference {
            LengthPreference::None => {}
            LengthPreference::Shortest => group.files.sort_by_key(|f| path_length_key(&f.path)),
            LengthPreference::Longest => {
                group.files.sort_by_key(|f| Reverse(path_length_key(&f.path)));
            }
        }
        if !self.patterns.is_empty() {
            group.files.sort_by_cached_key(|f| self.score(&f.path));
        }
        if let Some(original) = group.original() {
            log::trace!("Original is {}", original.path.display());
        }
    }

    /// Reorder every group.
    pub fn order_all(&self, groups: &mut [DuplicateGroup]) {
        if self.is_noop() {
            return;
        }
        for group in groups {
            self.order(group);
        }
    }
}
