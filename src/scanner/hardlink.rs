//! Hardlink detection.
//!
//! Hardlinks are multiple directory entries pointing to the same inode. Whether
//! they count as duplicates is a policy decision ([`WalkerConfig::report_hardlinks`]);
//! when they do not, the walker consults a [`HardlinkTracker`] and indexes only
//! the first path seen for each inode.
//!
//! On Unix the key is `(device, inode)`. Other platforms have no key, so every
//! file is treated as a first occurrence.
//!
//! [`WalkerConfig::report_hardlinks`]: super::WalkerConfig::report_hardlinks

use std::collections::HashSet;
use std::fs::Metadata;

/// Tracks seen inodes to detect hardlinks.
///
/// Not thread-safe; the walker owns one per run.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `metadata`'s inode and report whether it was already seen.
    ///
    /// Always `false` on platforms without inode keys.
    pub fn is_hardlink(&mut self, metadata: &Metadata) -> bool {
        match InodeKey::from_metadata(metadata) {
            Some(key) => !self.seen.insert(key),
            None => false,
        }
    }

    /// Number of distinct inodes recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether hardlink detection works on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
