use std::env;

/// Reads an environment variable. Unset and empty are both `None`.
pub fn get_env(env_key: &str) -> Option<String> {
    env::var(env_key).ok().filter(|value| !value.is_empty())
}
