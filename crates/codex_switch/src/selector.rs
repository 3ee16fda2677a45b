//! Interactive profile pickers.
//!
//! [`FinderSelector`] pipes labels into an external fuzzy finder (`fzf` by
//! default) and maps the chosen line back to an option. [`PromptSelector`]
//! is the fallback when no finder is installed: a numbered menu on stderr
//! read from stdin.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    time::Duration,
};

use tracing::debug;

use crate::profile::ProfileStatus;
use crate::SwitchError;

const ABORT_EXIT_CODES: &[i32] = &[1, 130];

/// A labelled choice presented to the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorOption {
    pub label: String,
    pub value: String,
}

impl SelectorOption {
    pub fn from_status(status: &ProfileStatus) -> Self {
        let label = if status.active {
            format!("{} (active)", status.name)
        } else {
            status.name.to_string()
        };
        Self {
            label,
            value: status.name.to_string(),
        }
    }
}

/// Picks one option; `Ok(None)` means the user aborted.
pub trait Selector {
    fn select(
        &mut self,
        title: &str,
        options: &[SelectorOption],
    ) -> Result<Option<SelectorOption>, SwitchError>;
}

/// Runs an external finder with the labels on stdin.
#[derive(Clone, Debug)]
pub struct FinderSelector {
    program: PathBuf,
}

impl FinderSelector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Selector for FinderSelector {
    fn select(
        &mut self,
        title: &str,
        options: &[SelectorOption],
    ) -> Result<Option<SelectorOption>, SwitchError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--prompt")
            .arg(format!("{title}> "))
            .arg("--height")
            .arg("40%")
            .arg("--reverse")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = spawn_with_retry(&mut command, &self.program)?;
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| SwitchError::SelectorIo(io::Error::other("stdin unavailable")))?;
            for option in options {
                match writeln!(stdin, "{}", option.label) {
                    Ok(()) => {}
                    // The finder may exit before reading everything.
                    Err(err) if err.kind() == io::ErrorKind::BrokenPipe => break,
                    Err(err) => return Err(SwitchError::SelectorIo(err)),
                }
            }
        }

        let output = child.wait_with_output().map_err(SwitchError::SelectorIo)?;
        let code = output.status.code().unwrap_or(-1);
        if !output.status.success() {
            if ABORT_EXIT_CODES.contains(&code) {
                debug!(code, "selector aborted");
                return Ok(None);
            }
            return Err(SwitchError::SelectorFailed {
                program: self.program.clone(),
                status: code,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let picked = stdout.lines().next().unwrap_or("").trim_end();
        Ok(options.iter().find(|option| option.label == picked).cloned())
    }
}

/// Numbered menu fallback.
#[derive(Debug)]
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Selector for PromptSelector<R, W> {
    fn select(
        &mut self,
        title: &str,
        options: &[SelectorOption],
    ) -> Result<Option<SelectorOption>, SwitchError> {
        let io_err = SwitchError::SelectorIo;
        writeln!(self.output, "{title}").map_err(io_err)?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", index + 1, option.label).map_err(io_err)?;
        }

        loop {
            write!(self.output, "Select [1-{}]: ", options.len()).map_err(io_err)?;
            self.output.flush().map_err(io_err)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(io_err)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if answer.is_empty() {
                return Ok(None);
            }

            let by_index = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|n| options.get(n));
            let chosen = by_index.or_else(|| options.iter().find(|o| o.value == answer));
            match chosen {
                Some(option) => return Ok(Some(option.clone())),
                None => writeln!(self.output, "Invalid choice: {answer}").map_err(io_err)?,
            }
        }
    }
}

/// Finder when `program` resolves on `PATH`, otherwise the stdin prompt.
pub fn resolve_selector(program: Option<&str>) -> Box<dyn Selector> {
    if let Some(program) = program {
        match which::which(program) {
            Ok(path) => {
                debug!(selector = %path.display(), "using external finder");
                return Box::new(FinderSelector::new(path));
            }
            Err(err) => debug!(selector = program, error = %err, "finder not found"),
        }
    }
    Box::new(PromptSelector::new(io::stdin().lock(), io::stderr()))
}

fn spawn_with_retry(command: &mut Command, program: &Path) -> Result<Child, SwitchError> {
    let mut backoff = Duration::from_millis(2);
    for attempt in 0..5 {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) => {
                // ETXTBSY when the script was written a moment ago.
                let is_busy = source.raw_os_error() == Some(26);
                if is_busy && attempt < 4 {
                    std::thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
                    continue;
                }
                return Err(SwitchError::SelectorSpawn {
                    program: program.to_path_buf(),
                    source,
                });
            }
        }
    }

    unreachable!("spawn_with_retry should return before exhausting retries")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<SelectorOption> {
        vec![
            SelectorOption {
                label: "home".into(),
                value: "home".into(),
            },
            SelectorOption {
                label: "work (active)".into(),
                value: "work".into(),
            },
        ]
    }

    fn prompt(input: &str) -> (Option<SelectorOption>, String) {
        let mut out = Vec::new();
        let picked = PromptSelector::new(input.as_bytes(), &mut out)
            .select("Pick a profile", &options())
            .unwrap();
        (picked, String::from_utf8(out).unwrap())
    }

    #[test]
    fn prompt_accepts_index_and_name() {
        let (picked, menu) = prompt("2\n");
        assert_eq!(picked.unwrap().value, "work");
        assert!(menu.contains("  1) home"));
        assert!(menu.contains("  2) work (active)"));

        let (picked, _) = prompt("home\n");
        assert_eq!(picked.unwrap().value, "home");
    }

    #[test]
    fn prompt_retries_invalid_and_aborts_on_empty() {
        let (picked, menu) = prompt("9\n\n");
        assert!(picked.is_none());
        assert!(menu.contains("Invalid choice: 9"));

        let (picked, _) = prompt("");
        assert!(picked.is_none());
    }

    #[cfg(unix)]
    fn write_fake_finder(dir: &Path, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn finder_maps_selected_label_back() {
        let temp = tempfile::tempdir().unwrap();
        let fake = write_fake_finder(temp.path(), "fzf", "#!/bin/sh\ngrep work\n");
        let picked = FinderSelector::new(fake)
            .select("profile", &options())
            .unwrap();
        assert_eq!(picked.unwrap().value, "work");
    }

    #[cfg(unix)]
    #[test]
    fn finder_abort_and_failure_are_distinguished() {
        let temp = tempfile::tempdir().unwrap();
        let aborted = write_fake_finder(
            temp.path(),
            "fzf-abort",
            "#!/bin/sh\ncat >/dev/null\nexit 130\n",
        );
        assert!(FinderSelector::new(&aborted)
            .select("profile", &options())
            .unwrap()
            .is_none());

        let broken = write_fake_finder(
            temp.path(),
            "fzf-broken",
            "#!/bin/sh\ncat >/dev/null\nexit 2\n",
        );
        let err = FinderSelector::new(&broken)
            .select("profile", &options())
            .unwrap_err();
        assert!(
            matches!(err, SwitchError::SelectorFailed { status: 2, .. }),
            "{err:?}"
        );
    }

    #[test]
    fn missing_finder_reports_spawn_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = FinderSelector::new(temp.path().join("no-such-fzf"))
            .select("profile", &options())
            .unwrap_err();
        assert!(matches!(err, SwitchError::SelectorSpawn { .. }), "{err:?}");
    }
}
