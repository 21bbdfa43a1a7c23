//! Collapse directories of parallel symlinks into one directory symlink.
//!
//! After duplicates are replaced with links, a directory often ends up holding
//! nothing but links into a sibling tree: `copy/a -> orig/a`, `copy/b -> orig/b`.
//! Such a directory can itself become a single link `copy -> orig`.
//!
//! A directory collapses when every entry is either
//!
//! * a symlink whose resolved target has the same file name as the link, or
//! * (when recursive) a subdirectory that collapses to a same-named target,
//!
//! and all of those targets share exactly one parent directory. Only the
//! outermost collapsing directory is reported. Symlinked directories are
//! never descended.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::quote_path;

/// A directory that can be replaced with a link to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplift {
    /// Directory to remove
    pub dir: PathBuf,
    /// Directory the replacement link points at
    pub target: PathBuf,
}

impl Uplift {
    /// Shell command performing the replacement, or `None` if a path is not
    /// valid UTF-8.
    #[must_use]
    pub fn to_command(&self) -> Option<String> {
        let dir = quote_path(&self.dir)?;
        let target = quote_path(&self.target)?;
        Some(format!("rm -r {dir}; ln -s {target} {dir}"))
    }
}

struct DirScan {
    /// Set when the directory collapses
    target: Option<PathBuf>,
    /// Collapsing descendants, reported only if this directory does not collapse
    nested: Vec<Uplift>,
}

/// Find collapsible directories at or below `path`.
#[must_use]
pub fn find_softlink_dirs(path: &Path, recursive: bool) -> Vec<Uplift> {
    log::info!("Scanning directory \"{}\"", path.display());
    let scan = scan_dir(path, recursive);
    match scan.target {
        Some(target) => vec![Uplift {
            dir: path.to_path_buf(),
            target,
        }],
        None => scan.nested,
    }
}

fn scan_dir(path: &Path, recursive: bool) -> DirScan {
    log::debug!("Stepping into directory \"{}\"", path.display());
    let mut scan = DirScan {
        target: None,
        nested: Vec::new(),
    };

    let mut entries = match fs::read_dir(path).and_then(|rd| rd.collect::<Result<Vec<_>, _>>()) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read directory {}: {}", path.display(), e);
            return scan;
        }
    };
    entries.sort_by_key(fs::DirEntry::file_name);

    let mut parents = BTreeSet::new();
    let mut collapsible = true;

    for entry in entries {
        let entry_path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                log::warn!("Cannot stat {}: {}", entry_path.display(), e);
                collapsible = false;
                continue;
            }
        };

        if file_type.is_symlink() {
            match fs::canonicalize(&entry_path) {
                Ok(target) if target.file_name() == Some(entry.file_name().as_os_str()) => {
                    if let Some(parent) = target.parent() {
                        parents.insert(parent.to_path_buf());
                    }
                }
                Ok(target) => {
                    log::trace!(
                        "Link name differs from target: {} -> {}",
                        entry_path.display(),
                        target.display()
                    );
                    collapsible = false;
                }
                Err(e) => {
                    log::debug!("Cannot resolve link {}: {}", entry_path.display(), e);
                    collapsible = false;
                }
            }
        } else if recursive && file_type.is_dir() {
            let sub = scan_dir(&entry_path, recursive);
            match sub.target {
                Some(target) => {
                    if target.file_name() == Some(entry.file_name().as_os_str()) {
                        if let Some(parent) = target.parent() {
                            parents.insert(parent.to_path_buf());
                        }
                    } else {
                        collapsible = false;
                    }
                    scan.nested.push(Uplift {
                        dir: entry_path,
                        target,
                    });
                }
                None => {
                    collapsible = false;
                    scan.nested.extend(sub.nested);
                }
            }
        } else {
            collapsible = false;
        }
    }

    if collapsible && parents.len() == 1 {
        scan.target = parents.into_iter().next();
        scan.nested.clear();
    }
    scan
}
