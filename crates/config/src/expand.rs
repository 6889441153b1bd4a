//! `${VAR}` substitution for raw config text and `~` expansion for paths.

use std::path::{Path, PathBuf};

/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace `${ENV_VAR}` placeholders using a custom lookup function.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // Empty or unterminated placeholder is kept literally.
                out.push_str("${");
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

/// Expand a leading `~` to the user's home directory.
///
/// Only `~` and `~/...` are expanded; `~user` forms are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let home = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf());
    expand_tilde_with(path, home.as_deref())
}

fn expand_tilde_with(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    if rest.as_os_str().is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "ARBOR_TEST_ROOT" => Some("/srv/code".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("projects_dir = \"${ARBOR_TEST_ROOT}/p\"", lookup),
            "projects_dir = \"/srv/code/p\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${ARBOR_MISSING_XYZ}", lookup),
            "${ARBOR_MISSING_XYZ}"
        );
    }

    #[test]
    fn keeps_malformed_placeholders() {
        assert_eq!(substitute_env_with("a ${ b", lookup), "a ${ b");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }

    #[test]
    fn expands_tilde_prefix() {
        let home = Path::new("/home/u");
        assert_eq!(
            expand_tilde_with(Path::new("~/Projects"), Some(home)),
            PathBuf::from("/home/u/Projects")
        );
        assert_eq!(expand_tilde_with(Path::new("~"), Some(home)), home);
    }

    #[test]
    fn leaves_other_paths_alone() {
        let home = Path::new("/home/u");
        assert_eq!(
            expand_tilde_with(Path::new("/abs/~/x"), Some(home)),
            PathBuf::from("/abs/~/x")
        );
        assert_eq!(
            expand_tilde_with(Path::new("~other/x"), Some(home)),
            PathBuf::from("~other/x")
        );
        assert_eq!(
            expand_tilde_with(Path::new("~/x"), None),
            PathBuf::from("~/x")
        );
    }
}
