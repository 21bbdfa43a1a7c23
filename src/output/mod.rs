//! Output formatters for duplicate scan results.
//!
//! This module provides the two primary output formats:
//! - [`ListingOutput`]: one path per line, each group terminated by `====`
//! - [`ScriptOutput`]: a POSIX shell script replacing copies with symlinks
//!
//! Both write only to the given writer; diagnostics go through `log`.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::duplicates::DuplicateFinder;
//! use dupelink::output::ListingOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! ListingOutput::new(&groups)
//!     .write_to(&mut std::io::stdout().lock())
//!     .unwrap();
//! ```

pub mod listing;
pub mod script;

use std::borrow::Cow;
use std::path::Path;

// Re-export main types
pub use listing::{ListingOutput, GROUP_SEPARATOR};
pub use script::ScriptOutput;

/// Quote `s` for a POSIX shell.
///
/// Strings made only of characters the shell never interprets are returned
/// as-is. Anything else is wrapped in single quotes, with embedded single
/// quotes written as `'\''`.
///
/// ```
/// use dupelink::output::shell_quote;
///
/// assert_eq!(shell_quote("/srv/data/a.txt"), "/srv/data/a.txt");
/// assert_eq!(shell_quote("/srv/it's here"), "'/srv/it'\\''s here'");
/// ```
#[must_use]
pub fn shell_quote(s: &str) -> Cow<'_, str> {
    if !s.is_empty() && s.chars().all(is_shell_safe) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("'{}'", s.replace('\'', "'\\''")))
    }
}

/// Quote a path for a POSIX shell, or `None` if it is not valid UTF-8.
#[must_use]
pub fn quote_path(path: &Path) -> Option<Cow<'_, str>> {
    path.to_str().map(shell_quote)
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}
