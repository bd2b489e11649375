use std::{
    env,
    io::{self, IsTerminal},
    path::PathBuf,
};

/// Environment variables that disable prompting when set to anything but
/// an empty string, `0` or `false`.
const NON_INTERACTIVE_VARS: [&str; 2] = ["CI", "CW_NON_INTERACTIVE"];

/// Expand a leading `~` in a filesystem path to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~')
        && (rest.is_empty() || rest.starts_with('/'))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest.trim_start_matches('/'));
    }
    PathBuf::from(path)
}

/// Whether an environment flag value counts as set.
fn flag_is_set(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false")
}

/// Whether the environment asks for non-interactive behavior.
fn non_interactive_env() -> bool {
    NON_INTERACTIVE_VARS
        .iter()
        .any(|name| env::var(name).is_ok_and(|value| flag_is_set(&value)))
}

/// Whether prompts can be shown: stdin is a terminal and neither `CI` nor
/// `CW_NON_INTERACTIVE` is set.
pub fn can_prompt() -> bool {
    io::stdin().is_terminal() && !non_interactive_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_expands_only_as_a_home_prefix() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/src"), home.join("src"));
        assert_eq!(expand_tilde("~other/src"), PathBuf::from("~other/src"));
        assert_eq!(expand_tilde("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn env_flag_values() {
        assert!(flag_is_set("1"));
        assert!(flag_is_set("true"));
        assert!(!flag_is_set(""));
        assert!(!flag_is_set("0"));
        assert!(!flag_is_set("FALSE"));
    }
}
