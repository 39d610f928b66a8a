//! Subject path validation and joining.

use std::error::Error;
use std::fmt;

/// Separator between subject path segments.
pub const SEPARATOR: char = '.';

/// Error type for subject path validation.
///
/// Path violations are programming errors discoverable before any
/// traffic flows, so route declaration treats them as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path is an empty string.
    Empty,
    /// The path starts with the separator.
    LeadingSeparator,
    /// The path ends with the separator.
    TrailingSeparator,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "path must not be empty"),
            PathError::LeadingSeparator => write!(f, "path must not start with '{}'", SEPARATOR),
            PathError::TrailingSeparator => write!(f, "path must not end with '{}'", SEPARATOR),
        }
    }
}

impl Error for PathError {}

/// Validate a path segment.
pub fn check_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if path.starts_with(SEPARATOR) {
        return Err(PathError::LeadingSeparator);
    }
    if path.ends_with(SEPARATOR) {
        return Err(PathError::TrailingSeparator);
    }
    Ok(())
}

/// Validate `path` and join it onto `base`.
pub fn merge_path(base: &str, path: &str) -> Result<String, PathError> {
    check_path(path)?;

    if base.is_empty() {
        Ok(path.to_string())
    } else {
        Ok(format!("{}{}{}", base, SEPARATOR, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths_pass() {
        assert!(check_path("root").is_ok());
        assert!(check_path("root.a.b").is_ok());
    }

    #[test]
    fn invalid_paths_fail() {
        assert_eq!(check_path(""), Err(PathError::Empty));
        assert_eq!(check_path(".a.b"), Err(PathError::LeadingSeparator));
        assert_eq!(check_path("a.b."), Err(PathError::TrailingSeparator));
    }

    #[test]
    fn merge_joins_with_the_separator() {
        assert_eq!(merge_path("", "root").unwrap(), "root");
        assert_eq!(merge_path("root.a", "b.c").unwrap(), "root.a.b.c");
    }

    #[test]
    fn merge_rejects_invalid_segments() {
        assert!(merge_path("root", "").is_err());
        assert!(merge_path("root", ".a").is_err());
        assert!(merge_path("root", "a.").is_err());
    }
}
