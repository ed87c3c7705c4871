//! Bundle path rules.
//!
//! Bundle entries are addressed by relative, `/`-separated paths.
//! Sources validate before touching the OS, so the same string is
//! accepted or rejected on every platform.

use crate::error::{FsError, FsResult};

/// Checks `path` against the bundle path rules.
///
/// Rejected: empty paths, absolute paths, `.`/`..` components, empty
/// components, backslashes, drive separators and NUL bytes.
pub fn validate(path: &str) -> FsResult<()> {
    if path.is_empty() {
        return Err(FsError::invalid(path, "empty"));
    }
    if path.starts_with('/') {
        return Err(FsError::invalid(path, "absolute"));
    }
    if path.contains('\\') {
        return Err(FsError::invalid(path, "backslash separator"));
    }
    if path.contains(':') {
        return Err(FsError::invalid(path, "drive separator"));
    }
    if path.contains('\0') {
        return Err(FsError::invalid(path, "NUL byte"));
    }

    for comp in path.split('/') {
        if comp.is_empty() {
            return Err(FsError::invalid(path, "empty component"));
        }
        if comp == "." || comp == ".." {
            return Err(FsError::invalid(path, "dot component"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(path: &str) -> &'static str {
        match validate(path) {
            Err(FsError::InvalidPath { reason, .. }) => reason,
            other => panic!("expected InvalidPath for '{}', got {:?}", path, other),
        }
    }

    #[test]
    fn accepts_relative_unix_paths() {
        assert!(validate("a").is_ok());
        assert!(validate("a.txt").is_ok());
        assert!(validate("shaders/sky.sc").is_ok());
        assert!(validate("maps/level1/terrain.map").is_ok());
        assert!(validate("packages/boot.package").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(reason(""), "empty");
    }

    #[test]
    fn rejects_absolute() {
        assert_eq!(reason("/etc/passwd"), "absolute");
        assert_eq!(reason("/a"), "absolute");
    }

    #[test]
    fn rejects_dot_components() {
        assert_eq!(reason("."), "dot component");
        assert_eq!(reason(".."), "dot component");
        assert_eq!(reason("a/../b"), "dot component");
        assert_eq!(reason("./a"), "dot component");
        assert_eq!(reason("a/.."), "dot component");
    }

    #[test]
    fn rejects_empty_components() {
        assert_eq!(reason("a//b"), "empty component");
        assert_eq!(reason("a/"), "empty component");
    }

    #[test]
    fn rejects_foreign_separators() {
        assert_eq!(reason("a\\b"), "backslash separator");
        assert_eq!(reason("c:/game.cfg"), "drive separator");
    }

    #[test]
    fn rejects_nul() {
        assert_eq!(reason("a\u{0}b"), "NUL byte");
    }

    #[test]
    fn dotfiles_are_plain_names() {
        // a leading dot is a name, not a traversal
        assert!(validate(".config").is_ok());
        assert!(validate("dir/.hidden").is_ok());
    }
}
