use std::{
    fs as std_fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::defaults::{non_empty_env, CONFIG_ENV, DEFAULT_SELECTOR, SELECTOR_ENV};
use crate::home::CodexHomeLayout;
use crate::profile::StoreOptions;
use crate::SwitchError;

/// Contents of `codex-switch.toml`.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchConfig {
    /// External fuzzy finder used by `pick`; empty disables it.
    pub selector: String,
    pub sync_on_switch: bool,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            sync_on_switch: true,
        }
    }
}

impl SwitchConfig {
    /// Loads `$CODEX_SWITCH_CONFIG` or `<codex_dir>/codex-switch.toml`, then
    /// applies `CODEX_SWITCH_SELECTOR`. A missing file yields defaults.
    pub fn load(layout: &CodexHomeLayout) -> Result<Self, SwitchError> {
        let path = non_empty_env(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| layout.config_path());
        let mut config = Self::from_file(&path)?;
        if let Ok(selector) = std::env::var(SELECTOR_ENV) {
            config.selector = selector;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SwitchError> {
        let contents = match std_fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(config = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SwitchError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&contents).map_err(|source| SwitchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            sync_on_switch: self.sync_on_switch,
        }
    }

    /// Selector program, or `None` when the external finder is disabled.
    pub fn selector_program(&self) -> Option<&str> {
        let trimmed = self.selector.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_fzf_and_sync() {
        let config = SwitchConfig::parse("").unwrap();
        assert_eq!(config, SwitchConfig::default());
        assert_eq!(config.selector_program(), Some("fzf"));
        assert!(config.store_options().sync_on_switch);
    }

    #[test]
    fn parses_overrides() {
        let config = SwitchConfig::parse("selector = \"sk\"\nsync_on_switch = false\n").unwrap();
        assert_eq!(config.selector_program(), Some("sk"));
        assert!(!config.sync_on_switch);
    }

    #[test]
    fn empty_selector_disables_finder() {
        let config = SwitchConfig::parse("selector = \"  \"").unwrap();
        assert_eq!(config.selector_program(), None);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(SwitchConfig::parse("colour = true").is_err());
    }

    #[test]
    fn missing_file_is_default_and_bad_file_errors() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("codex-switch.toml");
        assert_eq!(SwitchConfig::from_file(&path).unwrap(), SwitchConfig::default());

        std_fs::write(&path, "sync_on_switch = \"yes\"").unwrap();
        let err = SwitchConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, SwitchError::ConfigParse { .. }), "{err:?}");
    }
}
