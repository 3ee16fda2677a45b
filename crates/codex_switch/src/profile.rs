use std::{
    fmt,
    fs as std_fs, io,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::defaults::PROFILE_EXTENSION;
use crate::fs::{atomic_copy, atomic_write, fingerprint, fingerprint_if_exists, StoreLock};
use crate::home::CodexHomeLayout;
use crate::SwitchError;

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid profile name regex"))
}

/// A validated profile name (`A-Z a-z 0-9 . _ -`, non-empty).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfileName(String);

impl ProfileName {
    pub fn parse(name: impl Into<String>) -> Result<Self, SwitchError> {
        let name = name.into();
        if name_regex().is_match(&name) {
            Ok(Self(name))
        } else {
            Err(SwitchError::InvalidName { name })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One saved profile as reported by `list`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProfileStatus {
    pub name: ProfileName,
    pub fingerprint: String,
    pub active: bool,
}

impl ProfileStatus {
    /// First 12 fingerprint characters, as shown in the text listing.
    pub fn short_fingerprint(&self) -> &str {
        self.fingerprint.get(..12).unwrap_or("")
    }
}

/// Behavior toggles for store operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StoreOptions {
    /// Copy the live auth file back into the outgoing profile on `use`.
    pub sync_on_switch: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sync_on_switch: true,
        }
    }
}

/// Saved Codex auth profiles under a [`CodexHomeLayout`].
///
/// Every operation validates names first, then takes the store lock, and
/// performs its existence checks and writes while the lock is held.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    layout: CodexHomeLayout,
    options: StoreOptions,
}

impl ProfileStore {
    pub fn new(layout: CodexHomeLayout) -> Self {
        Self::with_options(layout, StoreOptions::default())
    }

    pub fn with_options(layout: CodexHomeLayout, options: StoreOptions) -> Self {
        Self { layout, options }
    }

    pub fn layout(&self) -> &CodexHomeLayout {
        &self.layout
    }

    fn lock(&self) -> Result<StoreLock, SwitchError> {
        self.layout.materialize()?;
        StoreLock::acquire(self.layout.lock_path())
    }

    /// Creates the store directories.
    pub fn init(&self) -> Result<PathBuf, SwitchError> {
        self.layout.materialize()?;
        Ok(self.layout.profiles_dir())
    }

    /// Saves the live auth file as `name`, overwriting an existing profile,
    /// and marks it active. Returns the profile path.
    pub fn save(&self, name: &ProfileName) -> Result<PathBuf, SwitchError> {
        let profile_path = self.layout.profile_path(name);
        let _lock = self.lock()?;

        let auth = self.layout.auth_path();
        if !auth.is_file() {
            return Err(SwitchError::MissingAuth { path: auth });
        }

        atomic_copy(&auth, &profile_path)?;
        self.write_active(name)?;
        info!(profile = %name, "saved profile");
        Ok(profile_path)
    }

    /// Activates `name` by copying it over the live auth file.
    ///
    /// When sync is enabled and a different profile is currently active, the
    /// live auth file is first copied back into that profile so refreshed
    /// tokens are kept.
    pub fn use_profile(&self, name: &ProfileName) -> Result<PathBuf, SwitchError> {
        let profile_path = self.layout.profile_path(name);
        let _lock = self.lock()?;

        if !profile_path.is_file() {
            return Err(SwitchError::ProfileNotFound {
                name: name.to_string(),
            });
        }

        let auth = self.layout.auth_path();
        if self.options.sync_on_switch {
            self.sync_outgoing(name, &auth)?;
        }

        atomic_copy(&profile_path, &auth)?;
        self.write_active(name)?;
        info!(profile = %name, "switched profile");
        Ok(auth)
    }

    fn sync_outgoing(&self, incoming: &ProfileName, auth: &Path) -> Result<(), SwitchError> {
        let Some(outgoing) = self.read_active()? else {
            return Ok(());
        };
        if &outgoing == incoming {
            debug!(profile = %incoming, "re-activating current profile; skipping sync");
            return Ok(());
        }

        let outgoing_path = self.layout.profile_path(&outgoing);
        if !outgoing_path.is_file() || !auth.is_file() {
            debug!(profile = %outgoing, "nothing to sync");
            return Ok(());
        }

        atomic_copy(auth, &outgoing_path)?;
        debug!(profile = %outgoing, "synced live auth into outgoing profile");
        Ok(())
    }

    /// Removes the profile `name`, clearing the active marker if it named it.
    pub fn delete(&self, name: &ProfileName) -> Result<(), SwitchError> {
        let profile_path = self.layout.profile_path(name);
        let _lock = self.lock()?;

        if !profile_path.is_file() {
            return Err(SwitchError::ProfileNotFound {
                name: name.to_string(),
            });
        }

        std_fs::remove_file(&profile_path).map_err(|source| SwitchError::Remove {
            path: profile_path.clone(),
            source,
        })?;

        if self.read_active()?.as_ref() == Some(name) {
            self.clear_active()?;
        }
        info!(profile = %name, "deleted profile");
        Ok(())
    }

    /// Renames `old` to `new`, carrying the active marker along.
    pub fn rename(&self, old: &ProfileName, new: &ProfileName) -> Result<(), SwitchError> {
        let old_path = self.layout.profile_path(old);
        let new_path = self.layout.profile_path(new);
        let _lock = self.lock()?;

        if !old_path.is_file() {
            return Err(SwitchError::ProfileNotFound {
                name: old.to_string(),
            });
        }
        if new_path.exists() {
            return Err(SwitchError::ProfileExists {
                name: new.to_string(),
            });
        }

        std_fs::rename(&old_path, &new_path).map_err(|source| SwitchError::Rename {
            from: old_path.clone(),
            to: new_path.clone(),
            source,
        })?;
        crate::fs::set_private_file(&new_path)?;

        if self.read_active()?.as_ref() == Some(old) {
            self.write_active(new)?;
        }
        info!(from = %old, to = %new, "renamed profile");
        Ok(())
    }

    /// Lists saved profiles sorted by name.
    pub fn list(&self) -> Result<Vec<ProfileStatus>, SwitchError> {
        let _lock = self.lock()?;

        let dir = self.layout.profiles_dir();
        let entries = match std_fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SwitchError::ReadDir { path: dir, source }),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SwitchError::ReadDir {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().map(|kind| kind.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(name) = profile_name_from_path(&path) else {
                continue;
            };
            match fingerprint(&path) {
                Ok(fp) => found.push((name, fp)),
                // Deleted or unreadable between read_dir and open.
                Err(err) => warn!(path = %path.display(), error = %err, "skipping profile"),
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));

        let marker = self
            .read_active()?
            .filter(|name| found.iter().any(|(candidate, _)| candidate == name));
        let auth_fp = match marker {
            Some(_) => None,
            None => fingerprint_if_exists(&self.layout.auth_path())?,
        };

        Ok(found
            .into_iter()
            .map(|(name, fingerprint)| {
                let active = match (&marker, &auth_fp) {
                    (Some(active), _) => active == &name,
                    (None, Some(auth)) => auth == &fingerprint,
                    (None, None) => false,
                };
                ProfileStatus {
                    name,
                    fingerprint,
                    active,
                }
            })
            .collect())
    }

    /// Fingerprint of the live auth file.
    pub fn who(&self) -> Result<String, SwitchError> {
        let auth = self.layout.auth_path();
        fingerprint_if_exists(&auth)?.ok_or(SwitchError::NotLoggedIn { path: auth })
    }

    /// The profile [`list`](Self::list) reports as active, if any.
    pub fn active(&self) -> Result<Option<ProfileName>, SwitchError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|status| status.active)
            .map(|status| status.name))
    }

    fn read_active(&self) -> Result<Option<ProfileName>, SwitchError> {
        let path = self.layout.active_marker_path();
        let raw = match std_fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SwitchError::ReadMarker { path, source }),
        };
        match ProfileName::parse(raw.trim()) {
            Ok(name) => Ok(Some(name)),
            Err(_) => {
                warn!(marker = %path.display(), "ignoring malformed active marker");
                Ok(None)
            }
        }
    }

    fn write_active(&self, name: &ProfileName) -> Result<(), SwitchError> {
        atomic_write(
            &self.layout.active_marker_path(),
            format!("{name}\n").as_bytes(),
        )
    }

    fn clear_active(&self) -> Result<(), SwitchError> {
        let path = self.layout.active_marker_path();
        match std_fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SwitchError::Remove { path, source }),
        }
    }
}

fn profile_name_from_path(path: &Path) -> Option<ProfileName> {
    if path.extension()? != PROFILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    match ProfileName::parse(stem) {
        Ok(name) => Some(name),
        Err(_) => {
            debug!(path = %path.display(), "ignoring file with invalid profile name");
            None
        }
    }
}
