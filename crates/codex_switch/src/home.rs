use std::{
    fs as std_fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::defaults::{
    non_empty_env, ACTIVE_MARKER_FILE, AUTH_FILE, CODEX_HOME_ENV, CONFIG_FILE, DEFAULT_CODEX_DIR,
    LOCK_FILE, PROFILES_DIR, PROFILE_EXTENSION,
};
use crate::profile::ProfileName;
use crate::SwitchError;

/// Describes the on-disk layout of a Codex home as seen by the profile switcher.
///
/// `auth.json` is the live credential file read by the Codex CLI; saved
/// profiles live under `profiles/<name>.json`. The switcher keeps its own
/// bookkeeping next to them: `.codex-switch-active` records the active
/// profile name and `.codex-switch.lock` serializes concurrent invocations.
/// Call [`Self::materialize`] to create the directories with private
/// permissions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CodexHomeLayout {
    root: PathBuf,
    codex_home_env: Option<String>,
}

impl CodexHomeLayout {
    /// Creates a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            codex_home_env: None,
        }
    }

    /// Resolves the layout from `CODEX_HOME`, falling back to `~/.codex`.
    pub fn from_env() -> Result<Self, SwitchError> {
        match non_empty_env(CODEX_HOME_ENV) {
            Some(value) => Ok(Self {
                root: PathBuf::from(&value),
                codex_home_env: Some(value),
            }),
            None => {
                let home = dirs::home_dir().ok_or(SwitchError::HomeUnavailable)?;
                Ok(Self::new(home.join(DEFAULT_CODEX_DIR)))
            }
        }
    }

    /// Returns the codex directory.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// The raw `CODEX_HOME` value when the layout came from the environment.
    pub fn codex_home_env(&self) -> Option<&str> {
        self.codex_home_env.as_deref()
    }

    /// Path to the live `auth.json`.
    pub fn auth_path(&self) -> PathBuf {
        self.root.join(AUTH_FILE)
    }

    /// Directory holding saved profiles.
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(PROFILES_DIR)
    }

    /// Path to the saved profile `name`.
    pub fn profile_path(&self, name: &ProfileName) -> PathBuf {
        self.profiles_dir()
            .join(format!("{}.{PROFILE_EXTENSION}", name.as_str()))
    }

    pub fn active_marker_path(&self) -> PathBuf {
        self.root.join(ACTIVE_MARKER_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Default location of the switcher's TOML config.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Creates the codex directory and the profiles directory, then tightens
    /// both to `0700` on Unix. Safe to call repeatedly.
    pub fn materialize(&self) -> Result<(), SwitchError> {
        let profiles = self.profiles_dir();
        std_fs::create_dir_all(&profiles).map_err(|source| SwitchError::PrepareDir {
            path: profiles.clone(),
            source,
        })?;

        #[cfg(unix)]
        for path in [self.root(), profiles.as_path()] {
            crate::fs::set_private_dir(path)?;
        }
        Ok(())
    }

    /// Snapshot of the resolved paths for `path` output.
    pub fn paths(&self) -> ResolvedPaths {
        ResolvedPaths {
            codex_home: self.codex_home_env.clone(),
            codex_dir: self.root.clone(),
            auth: self.auth_path(),
            profiles_dir: self.profiles_dir(),
        }
    }
}

/// Resolved paths as reported by `codex-switch path`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResolvedPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codex_home: Option<String>,
    pub codex_dir: PathBuf,
    pub auth: PathBuf,
    pub profiles_dir: PathBuf,
}
