use std::path::PathBuf;

use thiserror::Error;

/// Errors that may occur while managing Codex auth profiles.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("invalid profile name: {name} (allowed: A-Z a-z 0-9 . _ -)")]
    InvalidName { name: String },
    #[error("missing auth file: {path}. Hint: run 'codex login' first")]
    MissingAuth { path: PathBuf },
    #[error("not logged in (missing {path})")]
    NotLoggedIn { path: PathBuf },
    #[error("profile not found: {name}")]
    ProfileNotFound { name: String },
    #[error("profile already exists: {name}")]
    ProfileExists { name: String },
    #[error("unrecognized command: {args}")]
    UnknownCommand { args: String },
    #[error("no profiles found")]
    NoProfiles,
    #[error("could not determine the home directory; set CODEX_HOME")]
    HomeUnavailable,
    #[error("failed to prepare directory `{path}`: {source}")]
    PrepareDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to acquire lock `{path}`: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy `{source_path}` to `{destination}`: {error}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove `{path}`: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to rename `{from}` to `{to}`: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set permissions on `{path}`: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list profiles in `{path}`: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read active marker `{path}`: {source}")]
    ReadMarker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fingerprint `{path}`: {source}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read config `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("selector `{program}` could not be spawned: {source}")]
    SelectorSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("selector I/O failed: {0}")]
    SelectorIo(#[source] std::io::Error),
    #[error("selector `{program}` exited with status {status}")]
    SelectorFailed { program: PathBuf, status: i32 },
    #[error("{command} does not support --json output")]
    InteractiveOnly { command: &'static str },
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}
