//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing BLAKE3 digests
//! of file contents. [`Hasher::prehash`] digests only the leading
//! [`PREHASH_SIZE`] bytes and is used to narrow candidate groups;
//! [`Hasher::full_hash`] streams the whole file.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::HashError;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Number of leading bytes digested by [`Hasher::prehash`].
pub const PREHASH_SIZE: usize = 1024;

/// Read buffer size for streaming full hashes.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    prehash_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher using the default prefix length.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prehash_size: PREHASH_SIZE,
        }
    }

    /// Create a hasher with a custom prefix length.
    #[must_use]
    pub fn with_prehash_size(prehash_size: usize) -> Self {
        Self {
            prehash_size: prehash_size.max(1),
        }
    }

    /// Prefix length in bytes used by [`Hasher::prehash`].
    #[must_use]
    pub fn prehash_size(&self) -> usize {
        self.prehash_size
    }

    /// Hash the first `prehash_size` bytes of a file.
    ///
    /// Files shorter than the prefix are hashed in full.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn prehash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = open(path)?;
        let mut buffer = Vec::with_capacity(self.prehash_size);
        file.take(self.prehash_size as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        Ok(*blake3::hash(&buffer).as_bytes())
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = open(path)?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
        loop {
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            }
        }
        Ok(*hasher.finalize().as_bytes())
    }
}

fn open(path: &Path) -> Result<File, HashError> {
    File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
