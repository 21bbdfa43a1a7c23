//! Plain listing of duplicate groups.

use std::io::Write;
use std::path::Path;

use crate::duplicates::DuplicateGroup;

/// Line written after every group.
pub const GROUP_SEPARATOR: &str = "====";

/// Formatter for listing output.
pub struct ListingOutput<'a> {
    /// Duplicate groups to list, original first
    pub groups: &'a [DuplicateGroup],
}

impl<'a> ListingOutput<'a> {
    /// Create a new listing formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write every group, one path per line, each followed by [`GROUP_SEPARATOR`].
    ///
    /// Paths that are not valid UTF-8 are written lossily with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for group in self.groups {
            for file in &group.files {
                write_path(writer, &file.path)?;
            }
            writeln!(writer, "{GROUP_SEPARATOR}")?;
        }
        writer.flush()
    }
}

/// Write one path line. Returns `true` if the path had to be written lossily.
fn write_path<W: Write>(writer: &mut W, path: &Path) -> std::io::Result<bool> {
    let lossy = path.to_str().is_none();
    if lossy {
        log::warn!(
            "Path is not valid UTF-8, listing it lossily: {}",
            path.display()
        );
    }
    writeln!(writer, "{}", path.display())?;
    Ok(lossy)
}
