//! Shared helpers for CLI output

use std::path::{Path, PathBuf};

/// Format a byte size as a human-readable string
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// First `len` characters of a hex digest
#[must_use]
pub fn short_digest(digest: &str, len: usize) -> &str {
    digest.get(..len).unwrap_or(digest)
}

/// Path relative to the project directory when it lives inside it
pub fn display_relative(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(14), "14 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(short_digest("abcdef0123", 6), "abcdef");
        assert_eq!(short_digest("abc", 16), "abc");
    }

    #[test]
    fn test_display_relative() {
        let base = Path::new("/work/project");
        assert_eq!(
            display_relative(Path::new("/work/project/compack-build/recipes/recipe.yaml"), base),
            PathBuf::from("compack-build/recipes/recipe.yaml")
        );
        assert_eq!(
            display_relative(Path::new("/elsewhere/file"), base),
            PathBuf::from("/elsewhere/file")
        );
    }
}
