use std::path::PathBuf;

/// Expands a leading `~` or `$HOME` to the user's home directory.
///
/// Paths without either prefix, or when the home directory is unknown, are
/// returned unchanged.
pub fn expand_home(input: &str) -> PathBuf {
    let rest = if let Some(rest) = input.strip_prefix('~') {
        rest
    } else if let Some(rest) = input.strip_prefix("$HOME") {
        rest
    } else {
        return PathBuf::from(input);
    };
    // `~user` style prefixes are not supported
    if !rest.is_empty() && !rest.starts_with('/') {
        return PathBuf::from(input);
    }
    match (dirs::home_dir(), rest.trim_start_matches('/')) {
        (Some(home), "") => home,
        (Some(home), rest) => home.join(rest),
        (None, _) => PathBuf::from(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/Documents"), home.join("Documents"));
        assert_eq!(expand_home("$HOME/a/b"), home.join("a/b"));
        assert_eq!(expand_home("~"), home);
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_home("relative/~"), PathBuf::from("relative/~"));
        assert_eq!(expand_home("~alice/docs"), PathBuf::from("~alice/docs"));
        assert_eq!(expand_home("$HOMEWORK"), PathBuf::from("$HOMEWORK"));
    }
}
