use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

/// Resolves a user supplied path into an absolute [`PathBuf`].
///
/// `$VAR` and `${VAR}` are expanded from the environment, a leading `~` is
/// replaced by the home directory and relative paths are joined onto the
/// current working directory.
///
/// # Errors
///
/// * [`PathError::Empty`] if the path is empty
/// * [`PathError::MissingEnvVar`] if a referenced variable is not set
/// * [`PathError::UnclosedVariable`] for a `${` without a closing brace
/// * [`PathError::CurrentDir`] if the working directory cannot be read
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();

    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let path_buf = PathBuf::from(expand_variables(path)?);

    if path_buf.is_absolute() {
        Ok(path_buf)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path_buf))
            .map_err(|err| PathError::CurrentDir { source: err })
    }
}

/// Returns `$HOME`, or an empty path when it is unset.
pub fn home_dir() -> PathBuf {
    env::var_os("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".config"))
}

fn expand_variables(path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut var_name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    var_name.push(c);
                }
                if !closed {
                    return Err(PathError::UnclosedVariable {
                        input: format!("${{{var_name}"),
                    });
                }
                push_env_var(&var_name, &mut result, path)?;
            }
            '$' => {
                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        var_name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    result.push('$');
                } else {
                    push_env_var(&var_name, &mut result, path)?;
                }
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    Ok(result)
}

fn push_env_var(var_name: &str, result: &mut String, original: &str) -> PathResult<()> {
    match var_name {
        "HOME" => result.push_str(&home_dir().to_string_lossy()),
        "XDG_CONFIG_HOME" => result.push_str(&xdg_config_home().to_string_lossy()),
        _ => {
            let value = env::var(var_name).map_err(|_| {
                PathError::MissingEnvVar {
                    var: var_name.into(),
                    input: original.into(),
                }
            })?;
            result.push_str(&value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_resolve_path_expands_variables() {
        env::set_var("WEBFEAT_TEST_DIR", "/srv/webfeat");
        assert_eq!(
            resolve_path("$WEBFEAT_TEST_DIR/config.toml").unwrap(),
            PathBuf::from("/srv/webfeat/config.toml")
        );
        assert_eq!(
            resolve_path("${WEBFEAT_TEST_DIR}/data").unwrap(),
            PathBuf::from("/srv/webfeat/data")
        );
        env::remove_var("WEBFEAT_TEST_DIR");
    }

    #[test]
    #[serial]
    fn test_resolve_path_tilde() {
        env::set_var("HOME", "/home/tester");
        assert_eq!(
            resolve_path("~/manifest.json").unwrap(),
            PathBuf::from("/home/tester/manifest.json")
        );
    }

    #[test]
    fn test_resolve_path_relative() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(resolve_path("manifest.json").unwrap(), cwd.join("manifest.json"));
    }

    #[test]
    #[serial]
    fn test_resolve_path_errors() {
        env::remove_var("WEBFEAT_SURELY_MISSING");
        assert!(matches!(resolve_path("  "), Err(PathError::Empty)));
        assert!(matches!(
            resolve_path("$WEBFEAT_SURELY_MISSING/x"),
            Err(PathError::MissingEnvVar { .. })
        ));
        assert!(matches!(
            resolve_path("${HOME"),
            Err(PathError::UnclosedVariable { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_xdg_config_home() {
        env::set_var("XDG_CONFIG_HOME", "/tmp/xdg");
        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/xdg"));
        env::remove_var("XDG_CONFIG_HOME");
        env::set_var("HOME", "/home/tester");
        assert_eq!(xdg_config_home(), PathBuf::from("/home/tester/.config"));
    }

    #[test]
    fn test_dollar_without_name_is_literal() {
        assert_eq!(expand_variables("/tmp/$/x").unwrap(), "/tmp/$/x");
    }
}
