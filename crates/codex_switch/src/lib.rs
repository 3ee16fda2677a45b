//! Save, list and switch Codex CLI authentication profiles.
//!
//! A profile is a byte-for-byte copy of `$CODEX_HOME/auth.json` (default
//! `~/.codex/auth.json`) stored as `profiles/<name>.json`. Switching copies a
//! profile back over `auth.json` atomically and records the name in
//! `.codex-switch-active`.
//!
//! ## Store semantics
//! - Every mutating call holds an exclusive lock on `.codex-switch.lock`, so
//!   concurrent invocations serialize instead of interleaving writes.
//! - [`ProfileStore::use_profile`] first copies the live `auth.json` back into
//!   the outgoing active profile (token refreshes survive a switch).
//!   Re-activating the current profile skips that sync and restores the saved
//!   copy. Disable it with `sync_on_switch = false` in `codex-switch.toml`.
//! - [`ProfileStore::list`] trusts the active marker when it names an existing
//!   profile and falls back to comparing SHA-256 fingerprints with `auth.json`.
//! - Files are written `0600` and directories `0700` on Unix.
//!
//! ```rust,no_run
//! use codex_switch::{CodexHomeLayout, ProfileName, ProfileStore};
//! # fn main() -> Result<(), codex_switch::SwitchError> {
//! let store = ProfileStore::new(CodexHomeLayout::from_env()?);
//! store.save(&ProfileName::parse("work")?)?;
//! store.use_profile(&ProfileName::parse("personal")?)?;
//! for profile in store.list()? {
//!     println!("{} {}", profile.name, profile.active);
//! }
//! # Ok(()) }
//! ```
//!
//! ## Selector
//! `codex-switch pick` (or `use` without a name) pipes profile labels into
//! `fzf` when it is on `PATH` and otherwise shows a numbered prompt on stderr.
//! Override the finder with `selector = "..."` or `CODEX_SWITCH_SELECTOR`.

pub mod cli;
mod config;
mod defaults;
mod error;
pub mod fs;
mod home;
pub mod logging;
pub mod output;
mod profile;
pub mod selector;

pub use config::SwitchConfig;
pub use error::SwitchError;
pub use home::{CodexHomeLayout, ResolvedPaths};
pub use profile::{ProfileName, ProfileStatus, ProfileStore, StoreOptions};

/// Version reported by `codex-switch version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
