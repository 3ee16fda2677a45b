use std::env;

pub(crate) const CODEX_HOME_ENV: &str = "CODEX_HOME";
pub(crate) const CONFIG_ENV: &str = "CODEX_SWITCH_CONFIG";
pub(crate) const SELECTOR_ENV: &str = "CODEX_SWITCH_SELECTOR";
pub(crate) const LOG_ENV: &str = "CODEX_SWITCH_LOG";
pub(crate) const RUST_LOG_ENV: &str = "RUST_LOG";

pub(crate) const DEFAULT_CODEX_DIR: &str = ".codex";
pub(crate) const DEFAULT_SELECTOR: &str = "fzf";
pub(crate) const DEFAULT_LOG_FILTER: &str = "warn";
pub(crate) const VERBOSE_LOG_FILTER: &str = "debug";

pub(crate) const AUTH_FILE: &str = "auth.json";
pub(crate) const PROFILES_DIR: &str = "profiles";
pub(crate) const PROFILE_EXTENSION: &str = "json";
pub(crate) const ACTIVE_MARKER_FILE: &str = ".codex-switch-active";
pub(crate) const LOCK_FILE: &str = ".codex-switch.lock";
pub(crate) const CONFIG_FILE: &str = "codex-switch.toml";

#[cfg(unix)]
pub(crate) const PRIVATE_FILE_MODE: u32 = 0o600;
#[cfg(unix)]
pub(crate) const PRIVATE_DIR_MODE: u32 = 0o700;

/// Returns the value of `key` when it is set to something non-empty.
pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Log filter directive: `CODEX_SWITCH_LOG`, then `RUST_LOG`, then `warn`.
pub(crate) fn default_log_filter() -> String {
    non_empty_env(LOG_ENV)
        .or_else(|| non_empty_env(RUST_LOG_ENV))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}
