use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand};
use supports_color::Stream;
use tracing::debug;

use crate::config::SwitchConfig;
use crate::home::CodexHomeLayout;
use crate::output::{Outcome, OutputMode};
use crate::profile::{ProfileName, ProfileStore};
use crate::selector::{resolve_selector, Selector, SelectorOption};
use crate::{SwitchError, VERSION};

#[derive(Debug, Parser)]
#[command(name = "codex-switch", version)]
#[command(about = "Codex Profile Manager")]
#[command(
    long_about = "A robust CLI for managing and switching Codex authentication profiles.\n\n\
Profiles are copies of $CODEX_HOME/auth.json (default ~/.codex) kept under \
profiles/<name>.json. `codex-switch <name>` is shorthand for `codex-switch use <name>`."
)]
pub struct Cli {
    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug diagnostics to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text {
                color: supports_color::on(Stream::Stdout).is_some(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print tool version.
    Version,
    /// Set up profiles directory.
    Init,
    /// Save current auth as a profile.
    Save {
        /// Profile name (A-Z a-z 0-9 . _ -).
        name: String,
    },
    /// Switch to a saved profile; opens the selector when NAME is omitted.
    Use { name: Option<String> },
    /// List saved profiles.
    #[command(visible_alias = "ls")]
    List,
    /// Delete a profile.
    #[command(visible_alias = "rm")]
    Delete { name: String },
    /// Rename a profile.
    Rename { old: String, new: String },
    /// Show current auth fingerprint.
    Who,
    /// Show resolved paths.
    Path,
    /// Interactive profile selector.
    #[command(visible_alias = "ui")]
    Pick,
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Runs `command` against the store resolved from the environment.
///
/// `version` is answered before any path or config resolution so it works
/// without a home directory.
pub fn run(command: Command, mode: OutputMode) -> Result<Outcome, SwitchError> {
    if command == Command::Version {
        return Ok(Outcome::Version(VERSION));
    }

    let layout = CodexHomeLayout::from_env()?;
    let config = SwitchConfig::load(&layout)?;
    Session::new(layout, config, mode).execute(command)
}

/// A resolved store plus the settings one invocation runs with.
#[derive(Clone, Debug)]
pub struct Session {
    store: ProfileStore,
    config: SwitchConfig,
    mode: OutputMode,
}

impl Session {
    pub fn new(layout: CodexHomeLayout, config: SwitchConfig, mode: OutputMode) -> Self {
        let store = ProfileStore::with_options(layout, config.store_options());
        Self {
            store,
            config,
            mode,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn execute(&self, command: Command) -> Result<Outcome, SwitchError> {
        debug!(?command, "executing");
        match command {
            Command::Version => Ok(Outcome::Version(VERSION)),
            Command::Init => Ok(Outcome::Initialized {
                profiles_dir: self.store.init()?,
            }),
            Command::Save { name } => {
                let profile = ProfileName::parse(name)?;
                let path = self.store.save(&profile)?;
                Ok(Outcome::Saved { profile, path })
            }
            Command::Use { name: Some(name) } => self.switch(ProfileName::parse(name)?),
            Command::Use { name: None } => self.pick("use"),
            Command::List => Ok(Outcome::Listed(self.store.list()?)),
            Command::Delete { name } => {
                let profile = ProfileName::parse(name)?;
                self.store.delete(&profile)?;
                Ok(Outcome::Deleted { profile })
            }
            Command::Rename { old, new } => {
                let old = ProfileName::parse(old)?;
                let new = ProfileName::parse(new)?;
                self.store.rename(&old, &new)?;
                Ok(Outcome::Renamed { old, new })
            }
            Command::Who => Ok(Outcome::Who {
                fingerprint: self.store.who()?,
                profile: self.store.active()?,
            }),
            Command::Path => Ok(Outcome::Paths {
                paths: self.store.layout().paths(),
                terminal: io::stdout().is_terminal(),
            }),
            Command::Pick => self.pick("pick"),
            Command::External(args) => match <[String; 1]>::try_from(args) {
                Ok([name]) => self.switch(ProfileName::parse(name)?),
                Err(args) => Err(SwitchError::UnknownCommand {
                    args: args.join(" "),
                }),
            },
        }
    }

    fn switch(&self, profile: ProfileName) -> Result<Outcome, SwitchError> {
        let auth = self.store.use_profile(&profile)?;
        Ok(Outcome::Switched { profile, auth })
    }

    fn pick(&self, command: &'static str) -> Result<Outcome, SwitchError> {
        if self.mode == OutputMode::Json {
            return Err(SwitchError::InteractiveOnly { command });
        }
        let mut selector = resolve_selector(self.config.selector_program());
        self.pick_with(selector.as_mut())
    }

    /// Lists profiles, asks `selector` for one and switches to it.
    pub fn pick_with(&self, selector: &mut dyn Selector) -> Result<Outcome, SwitchError> {
        let profiles = self.store.list()?;
        if profiles.is_empty() {
            return Err(SwitchError::NoProfiles);
        }

        let options: Vec<_> = profiles.iter().map(SelectorOption::from_status).collect();
        match selector.select("Pick a profile", &options)? {
            Some(choice) => self.switch(ProfileName::parse(choice.value)?),
            None => Ok(Outcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::PromptSelector;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("codex-switch").chain(args.iter().copied()))
            .expect("parse args")
    }

    fn session(temp: &tempfile::TempDir) -> Session {
        Session::new(
            CodexHomeLayout::new(temp.path().join("codex")),
            SwitchConfig::default(),
            OutputMode::Text { color: false },
        )
    }

    #[test]
    fn clap_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands_and_aliases() {
        assert_eq!(parse(&["version"]).command, Some(Command::Version));
        assert_eq!(parse(&["ls"]).command, Some(Command::List));
        assert_eq!(parse(&["ui"]).command, Some(Command::Pick));
        assert_eq!(
            parse(&["rm", "work"]).command,
            Some(Command::Delete {
                name: "work".into()
            })
        );
        assert_eq!(parse(&["use"]).command, Some(Command::Use { name: None }));
        assert_eq!(parse(&[]).command, None);
    }

    #[test]
    fn json_flag_is_global() {
        let cli = parse(&["list", "--json"]);
        assert_eq!(cli.output_mode(), OutputMode::Json);
    }

    #[test]
    fn bare_name_is_external_subcommand() {
        assert_eq!(
            parse(&["work"]).command,
            Some(Command::External(vec!["work".into()]))
        );
    }

    #[test]
    fn help_subcommand_is_builtin() {
        let err = Cli::try_parse_from(["codex-switch", "help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn bare_name_switches_and_extra_args_error() {
        let temp = tempfile::tempdir().unwrap();
        let session = session(&temp);
        let layout = session.store().layout().clone();
        layout.materialize().unwrap();
        std::fs::write(layout.profile_path(&ProfileName::parse("work").unwrap()), "w").unwrap();

        let outcome = session
            .execute(Command::External(vec!["work".into()]))
            .unwrap();
        assert!(matches!(outcome, Outcome::Switched { .. }), "{outcome:?}");
        assert_eq!(std::fs::read_to_string(layout.auth_path()).unwrap(), "w");

        let err = session
            .execute(Command::External(vec!["work".into(), "extra".into()]))
            .unwrap_err();
        assert!(matches!(err, SwitchError::UnknownCommand { .. }), "{err:?}");
    }

    #[test]
    fn pick_switches_to_chosen_profile() {
        let temp = tempfile::tempdir().unwrap();
        let session = session(&temp);
        let layout = session.store().layout().clone();
        layout.materialize().unwrap();
        for name in ["alpha", "beta"] {
            std::fs::write(
                layout.profile_path(&ProfileName::parse(name).unwrap()),
                name,
            )
            .unwrap();
        }

        let mut menu = Vec::new();
        let mut selector = PromptSelector::new("2\n".as_bytes(), &mut menu);
        let outcome = session.pick_with(&mut selector).unwrap();
        assert!(matches!(outcome, Outcome::Switched { .. }), "{outcome:?}");
        assert_eq!(std::fs::read_to_string(layout.auth_path()).unwrap(), "beta");

        let mut selector = PromptSelector::new("".as_bytes(), io::sink());
        assert_eq!(session.pick_with(&mut selector).unwrap(), Outcome::Cancelled);
    }

    #[test]
    fn pick_without_profiles_errors() {
        let temp = tempfile::tempdir().unwrap();
        let mut selector = PromptSelector::new("1\n".as_bytes(), io::sink());
        let err = session(&temp).pick_with(&mut selector).unwrap_err();
        assert!(matches!(err, SwitchError::NoProfiles), "{err:?}");
    }

    #[test]
    fn pick_rejects_json_mode() {
        let temp = tempfile::tempdir().unwrap();
        let session = Session::new(
            CodexHomeLayout::new(temp.path()),
            SwitchConfig::default(),
            OutputMode::Json,
        );
        let err = session.execute(Command::Pick).unwrap_err();
        assert!(
            matches!(err, SwitchError::InteractiveOnly { command: "pick" }),
            "{err:?}"
        );
    }
}
