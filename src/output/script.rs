//! Remediation script generation.
//!
//! Renders duplicate groups as a POSIX shell script that deletes every copy
//! and recreates it as a symbolic link to the group's original.
//!
//! # Safety model
//!
//! The script only ever removes paths listed in a group, and each group is
//! guarded at execution time:
//!
//! * nothing happens unless the original still exists;
//! * a member is deleted only if `-ef` says it is not the original itself;
//! * a link is created only where nothing exists any more.
//!
//! Re-running the scan after the script finds the links resolve to their
//! originals, so a second script is empty. Deletion and link creation are not
//! atomic: an interrupted run can leave a copy deleted without its link.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dupelink::output::ScriptOutput;
//!
//! let output = ScriptOutput::new(&groups, &summary);
//! output.write_to(&mut std::io::stdout()).unwrap();
//! ```

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::quote_path;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::scanner::path_utils::{innermost_root, relative_path};

/// Formatter for shell script output.
pub struct ScriptOutput<'a> {
    /// Duplicate groups to include in the script, original first
    pub groups: &'a [DuplicateGroup],
    /// Scan summary for statistics and comments
    pub summary: &'a ScanSummary,
}

impl<'a> ScriptOutput<'a> {
    /// Create a new script output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write the generated script to a writer.
    ///
    /// Groups containing a path that is not valid UTF-8 are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "#!/bin/sh")?;
        writeln!(writer, "# dupelink remediation script")?;
        writeln!(
            writer,
            "# Generated on: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "#")?;
        writeln!(
            writer,
            "# WARNING: This script DELETES files and replaces them with symlinks."
        )?;
        writeln!(writer, "# Please review carefully before executing.")?;
        writeln!(writer, "#")?;
        writeln!(writer, "# Duplicate groups: {}", self.summary.duplicate_groups)?;
        writeln!(writer, "# Duplicate files: {}", self.summary.duplicate_files)?;
        writeln!(
            writer,
            "# Reclaimable space: {}",
            bytesize::ByteSize::b(self.summary.reclaimable_space)
        )?;

        for group in self.groups {
            match self.render_group(group) {
                Some(block) => {
                    writeln!(writer)?;
                    writer.write_all(block.as_bytes())?;
                }
                None => {
                    let original = group
                        .original()
                        .map_or_else(|| Cow::Borrowed("<empty>"), |f| f.path.to_string_lossy());
                    log::warn!(
                        "Skipping group of {} with a path that is not valid UTF-8",
                        original
                    );
                }
            }
        }
        writer.flush()
    }

    /// Shell commands for one group, or `None` if a path cannot be rendered.
    fn render_group(&self, group: &DuplicateGroup) -> Option<String> {
        let original = group.original()?;
        if group.copies().is_empty() {
            return None;
        }
        let original_token = quote_path(&original.path)?;

        let mut members = Vec::with_capacity(group.len());
        for file in &group.files {
            members.push(quote_path(&file.path)?);
        }

        let mut links = Vec::with_capacity(group.copies().len());
        for copy in group.copies() {
            let target = self.link_target(&original.path, &copy.path);
            let target = quote_path(&target)?.into_owned();
            let copy = quote_path(&copy.path)?;
            links.push((target, copy));
        }

        let mut block = String::new();
        block.push_str(&format!("# Original is {original_token}\n"));
        block.push_str(&format!("if [ -e {original_token} ]; then\n"));
        block.push_str(&format!("    for f in {}; do\n", members.join(" ")));
        block.push_str(&format!(
            "        if [ ! \"$f\" -ef {original_token} ]; then rm -f -- \"$f\"; fi\n"
        ));
        block.push_str("    done\n");
        for (target, copy) in links {
            block.push_str(&format!(
                "    [ -e {copy} ] || [ -L {copy} ] || ln -s -- {target} {copy}\n"
            ));
        }
        block.push_str("fi\n");
        Some(block)
    }

    /// Link target for `copy`: relative when both files live under the same
    /// innermost root, absolute otherwise.
    fn link_target(&self, original: &Path, copy: &Path) -> PathBuf {
        link_target(original, copy, &self.summary.roots)
    }
}

/// Compute the symlink target that makes `copy` point at `original`.
///
/// Relative paths are used only when `original` and `copy` share their
/// innermost configured root.
#[must_use]
pub fn link_target(original: &Path, copy: &Path, roots: &[PathBuf]) -> PathBuf {
    let original_root = innermost_root(original, roots);
    let copy_root = innermost_root(copy, roots);
    match (original_root, copy.parent()) {
        (Some(root), Some(copy_dir)) if copy_root == Some(root) => {
            relative_path(copy_dir, original)
        }
        _ => original.to_path_buf(),
    }
}
