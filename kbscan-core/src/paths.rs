//! Path normalization helpers shared by the resolver, state store and
//! orchestrator.

use std::path::{Path, PathBuf};

/// Canonical state/dedup key for a path.
///
/// Resolves symlinks and relative components where possible; falls back
/// to the absolute lexical form for paths that no longer exist. On
/// Windows the key is case-folded so that case-only differences do not
/// count as distinct files.
pub fn canonical_key(path: &Path) -> String {
    let abs = path.canonicalize().unwrap_or_else(|_| absolute_lexical(path));
    let key = abs.to_string_lossy().into_owned();
    if cfg!(windows) {
        key.to_lowercase()
    } else {
        key
    }
}

/// Like `canonical_key` but never resolves symlinks. Used where the
/// link file itself, not its target, is the identity (shortcut chain
/// cycle detection).
pub fn lexical_key(path: &Path) -> String {
    let key = absolute_lexical(path).to_string_lossy().into_owned();
    if cfg!(windows) {
        key.to_lowercase()
    } else {
        key
    }
}

fn absolute_lexical(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// True when `target` lives under at least one of `roots`.
///
/// Both sides are compared canonically, so a symlink whose target
/// escapes the root set is detected even if the link itself is inside.
pub fn is_within_any(target: &Path, roots: &[PathBuf]) -> bool {
    let canonical = target
        .canonicalize()
        .unwrap_or_else(|_| absolute_lexical(target));
    roots.iter().any(|root| canonical.starts_with(root))
}

/// Relative path from the nearest containing root, or the path itself
/// when no root contains it (shortcut targets outside the roots).
pub fn relative_to_nearest_root(path: &Path, roots: &[PathBuf]) -> String {
    for root in roots {
        if let Ok(rel) = path.strip_prefix(root) {
            return rel.to_string_lossy().into_owned();
        }
    }
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_key_resolves_relative_components() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();

        let dotted = dir.path().join(".").join("a.txt");
        assert_eq!(canonical_key(&dotted), canonical_key(&file));
    }

    #[cfg(unix)]
    #[test]
    fn test_lexical_key_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.txt");
        std::fs::write(&real, "x").unwrap();
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(canonical_key(&link), canonical_key(&real));
        assert_ne!(lexical_key(&link), lexical_key(&real));
    }

    #[test]
    fn test_is_within_any() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let inside = root.join("sub/doc.txt");
        std::fs::create_dir_all(inside.parent().unwrap()).unwrap();
        std::fs::write(&inside, "x").unwrap();

        assert!(is_within_any(&inside, &[root.clone()]));
        assert!(!is_within_any(Path::new("/"), &[root]));
    }

    #[test]
    fn test_relative_to_nearest_root() {
        let roots = vec![PathBuf::from("/srv/share")];
        assert_eq!(
            relative_to_nearest_root(Path::new("/srv/share/sys/doc.txt"), &roots),
            "sys/doc.txt"
        );
        assert_eq!(
            relative_to_nearest_root(Path::new("/elsewhere/doc.txt"), &roots),
            "/elsewhere/doc.txt"
        );
    }
}
