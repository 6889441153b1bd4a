//! Path normalization and containment checks.
//!
//! Every path handed out by the resolver is proven to live under one of the
//! configured base directories with [`is_path_under`], which resolves
//! symlinks on both sides. A link planted inside the worktrees tree that
//! points elsewhere therefore fails the check, where a string-prefix test
//! would pass it.

use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
};

use crate::error::{Error, Result};

/// How many rounds of percent-decoding [`contains_path_traversal`] applies.
const MAX_DECODE_ROUNDS: usize = 3;

/// Lexically clean a path: drop `.` segments and fold `..` into its parent.
///
/// `..` directly under the root stays at the root; leading `..` segments of a
/// relative path are kept. An empty result becomes `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                },
                Some(Component::RootDir | Component::Prefix(_)) => {},
                Some(Component::ParentDir | Component::CurDir) | None => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Make `path` absolute against the process working directory and clean it.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(std::env::current_dir()?.join(path))
    };
    Ok(clean_path(&joined))
}

/// Resolve symlinks in an absolute, cleaned path.
///
/// When the full path cannot be resolved (missing, broken link, permission
/// denied) the longest resolvable ancestor is resolved instead and the rest
/// is re-appended verbatim. Falls back to the input if nothing resolves.
fn resolve_symlinks(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    for ancestor in path.ancestors().skip(1) {
        if let Ok(resolved) = ancestor.canonicalize()
            && let Ok(rest) = path.strip_prefix(ancestor)
        {
            return resolved.join(rest);
        }
    }
    path.to_path_buf()
}

/// Normalize a path to an absolute, symlink-resolved form.
///
/// Idempotent: normalizing an already normalized path returns it unchanged.
/// Only fails for an empty path or when the working directory is unavailable.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_path_argument("path is empty"));
    }
    Ok(resolve_symlinks(&absolute(path)?))
}

/// Whether `target` is `base` itself or lies somewhere beneath it.
///
/// Both sides are made absolute and symlink-resolved independently before
/// comparing whole components, so `/foo/barbaz` is not under `/foo/bar` and
/// `/foo` is not under `/foo/bar`. Two empty paths are trivially contained;
/// exactly one empty path is an error.
pub fn is_path_under(base: &Path, target: &Path) -> Result<bool> {
    match (base.as_os_str().is_empty(), target.as_os_str().is_empty()) {
        (true, true) => return Ok(true),
        (true, false) => return Err(Error::invalid_path_argument("base path is empty")),
        (false, true) => return Err(Error::invalid_path_argument("target path is empty")),
        (false, false) => {},
    }
    let base = resolve_symlinks(&absolute(base)?);
    let target = resolve_symlinks(&absolute(target)?);
    Ok(target.starts_with(&base))
}

/// Detect `..` in a raw identifier, including percent-encoded and
/// double-encoded spellings such as `%2e%2e` or `%252e%252e`.
pub fn contains_path_traversal(input: &str) -> bool {
    let mut current: Cow<'_, str> = Cow::Borrowed(input);
    for _ in 0..=MAX_DECODE_ROUNDS {
        if current.contains("..") {
            return true;
        }
        // Lossy so an invalid UTF-8 escape cannot end the screen early.
        let bytes = urlencoding::decode_binary(current.as_bytes());
        let decoded = String::from_utf8_lossy(&bytes).into_owned();
        if decoded == current {
            break;
        }
        current = Cow::Owned(decoded);
    }
    false
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/a/b/c", "/a/b/c")]
    #[case("/a/./b/", "/a/b")]
    #[case("/a/b/../c", "/a/c")]
    #[case("/../a", "/a")]
    #[case("/a/b/../../..", "/")]
    #[case("a/../..", "..")]
    #[case("./a", "a")]
    #[case("a/..", ".")]
    fn cleans_lexically(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_path(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn normalize_rejects_empty() {
        assert!(matches!(
            normalize_path(Path::new("")),
            Err(Error::InvalidPathArgument { .. })
        ));
    }

    #[test]
    fn normalize_is_absolute_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x");
        std::fs::create_dir(&nested).unwrap();

        let once = normalize_path(&nested.join("..").join("x").join(".")).unwrap();
        assert!(once.is_absolute());
        assert_eq!(once, nested.canonicalize().unwrap());
        assert_eq!(normalize_path(&once).unwrap(), once);
    }

    #[test]
    fn normalize_keeps_missing_tail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not").join("there");
        let normalized = normalize_path(&missing).unwrap();
        assert_eq!(
            normalized,
            dir.path().canonicalize().unwrap().join("not").join("there")
        );
    }

    #[cfg(unix)]
    #[test]
    fn normalize_resolves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(
            normalize_path(&link).unwrap(),
            real.canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn normalize_tolerates_broken_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

        let normalized = normalize_path(&link).unwrap();
        assert_eq!(normalized, dir.path().canonicalize().unwrap().join("dangling"));
    }

    #[rstest]
    #[case("/foo/bar", "/foo/bar", true)]
    #[case("/foo/bar", "/foo/bar/baz", true)]
    #[case("/foo/bar", "/foo/bar/baz/../qux", true)]
    #[case("/foo/bar", "/foo", false)]
    #[case("/foo/bar", "/foo/barbaz", false)]
    #[case("/foo/bar", "/foo/bar/../other", false)]
    #[case("/foo/bar", "/elsewhere", false)]
    fn containment_is_component_wise(
        #[case] base: &str,
        #[case] target: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            is_path_under(Path::new(base), Path::new(target)).unwrap(),
            expected
        );
    }

    #[test]
    fn containment_empty_arguments() {
        assert!(is_path_under(Path::new(""), Path::new("")).unwrap());
        assert!(is_path_under(Path::new(""), Path::new("/a")).is_err());
        assert!(is_path_under(Path::new("/a"), Path::new("")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn containment_sees_through_escaping_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("Worktrees");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        let sneaky = base.join("sneaky");
        std::os::unix::fs::symlink(&outside, &sneaky).unwrap();

        // Lexically inside, physically outside.
        assert!(sneaky.starts_with(&base));
        assert!(!is_path_under(&base, &sneaky).unwrap());
        assert!(!is_path_under(&base, &sneaky.join("child")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn containment_through_symlinked_base() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir_all(real.join("acme")).unwrap();
        let alias = dir.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        assert!(is_path_under(&alias, &real.join("acme")).unwrap());
        assert!(is_path_under(&real, &alias.join("acme")).unwrap());
        // Not yet created, still provably inside.
        assert!(is_path_under(&alias, &alias.join("acme").join("new-branch")).unwrap());
    }

    #[rstest]
    #[case("..")]
    #[case("../../etc")]
    #[case("feature/../../x")]
    #[case("a..b")]
    #[case("%2e%2e")]
    #[case("%2E%2E%2Fetc")]
    #[case(".%2e")]
    #[case("%252e%252e")]
    #[case("%25252e%25252e")]
    #[case("..\\windows")]
    #[case("%2e%2e%ff")]
    #[case("%252e%252e%ff")]
    #[case("x%ff%2e%2e")]
    fn detects_traversal(#[case] input: &str) {
        assert!(contains_path_traversal(input), "{input:?} should be flagged");
    }

    #[rstest]
    #[case("main")]
    #[case("feature-x")]
    #[case("acme/feature-x")]
    #[case(".hidden")]
    #[case("v1.2.3")]
    #[case("100%")]
    #[case("%2e")]
    fn allows_ordinary_identifiers(#[case] input: &str) {
        assert!(!contains_path_traversal(input), "{input:?} should pass");
    }
}
