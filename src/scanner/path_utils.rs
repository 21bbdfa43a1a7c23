//! Path utilities shared by the scorer and the script writer.
//!
//! # Unicode normalization
//!
//! macOS stores file names in NFD (decomposed) form while most other systems
//! use NFC. Scoring patterns are matched against the NFC form so that
//! `café` matches regardless of how the file system spelled it.
//!
//! ```
//! use dupelink::scanner::path_utils::normalize_path_str;
//!
//! let nfc = "café.txt";
//! let nfd = "cafe\u{0301}.txt";
//! assert_eq!(normalize_path_str(nfc), normalize_path_str(nfd));
//! ```
//!
//! # Root-aware relative paths
//!
//! [`relative_path`] computes the path from a directory to a target using
//! `..` components, and [`innermost_root`] tells which configured root a path
//! lives under, so callers can refuse relative links that would cross roots.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::{is_nfc, UnicodeNormalization};

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// NFC form of `path` as a string, borrowing when already normalized.
///
/// Non-UTF-8 bytes are replaced lossily; the result is for matching only.
#[must_use]
pub fn normalized_display(path: &Path) -> Cow<'_, str> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) if is_nfc(s) => Cow::Borrowed(s),
        other => Cow::Owned(normalize_path_str(&other)),
    }
}

/// Compute the path of `target` relative to the directory `from_dir`.
///
/// Both paths are expected to be absolute and free of `.`/`..` components
/// (as produced by canonicalization).
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use dupelink::scanner::path_utils::relative_path;
///
/// let rel = relative_path(Path::new("/data/b/c"), Path::new("/data/a/x.txt"));
/// assert_eq!(rel, PathBuf::from("../../a/x.txt"));
/// ```
#[must_use]
pub fn relative_path(from_dir: &Path, target: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &to[common..] {
        result.push(component.as_os_str());
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Index of the deepest root in `roots` that contains `path`.
///
/// Nested roots are resolved to the innermost one, so a path under
/// `/data/photos` belongs to that root rather than to `/data`.
pub fn innermost_root(path: &Path, roots: &[PathBuf]) -> Option<usize> {
    roots
        .iter()
        .enumerate()
        .filter(|(_, root)| path.starts_with(root))
        .max_by_key(|(_, root)| root.components().count())
        .map(|(idx, _)| idx)
}

/// Sort key describing how "long" a path is: segment count, then byte length.
#[must_use]
pub fn path_length_key(path: &Path) -> (usize, usize) {
    (path.components().count(), path.as_os_str().len())
}
