use std::{fmt, io::Write, path::PathBuf};

use owo_colors::{OwoColorize, Style};
use serde_json::{json, Value};

use crate::home::ResolvedPaths;
use crate::profile::{ProfileName, ProfileStatus};
use crate::SwitchError;

/// Result of a command, rendered as text or JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Version(&'static str),
    Initialized { profiles_dir: PathBuf },
    Saved { profile: ProfileName, path: PathBuf },
    Switched { profile: ProfileName, auth: PathBuf },
    Deleted { profile: ProfileName },
    Renamed { old: ProfileName, new: ProfileName },
    Listed(Vec<ProfileStatus>),
    Who {
        fingerprint: String,
        profile: Option<ProfileName>,
    },
    Paths {
        paths: ResolvedPaths,
        terminal: bool,
    },
    /// The interactive selector was dismissed.
    Cancelled,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// Human-readable lines, ANSI-styled when `color` is set.
    Text { color: bool },
    Json,
}

pub fn render(
    outcome: &Outcome,
    mode: OutputMode,
    out: &mut impl Write,
) -> Result<(), SwitchError> {
    match mode {
        OutputMode::Json => render_json(outcome, out),
        OutputMode::Text { color } => render_text(outcome, color, out),
    }
}

/// `{"ok":false,"error":...}` for failures under `--json`.
pub fn render_error_json(err: &SwitchError, out: &mut impl Write) -> Result<(), SwitchError> {
    write_json_line(&json!({ "ok": false, "error": err.to_string() }), out)
}

fn write_json_line(value: &Value, out: &mut impl Write) -> Result<(), SwitchError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn render_json(outcome: &Outcome, out: &mut impl Write) -> Result<(), SwitchError> {
    let value = match outcome {
        Outcome::Version(version) => json!({ "ok": true, "version": version }),
        Outcome::Initialized { profiles_dir } => json!({
            "ok": true,
            "action": "init",
            "profiles_dir": profiles_dir.display().to_string()
        }),
        Outcome::Saved { profile, path } => json!({
            "ok": true,
            "action": "save",
            "profile": profile,
            "path": path.display().to_string()
        }),
        Outcome::Switched { profile, auth } => json!({
            "ok": true,
            "action": "use",
            "profile": profile,
            "auth": auth.display().to_string()
        }),
        Outcome::Deleted { profile } => {
            json!({ "ok": true, "action": "delete", "profile": profile })
        }
        Outcome::Renamed { old, new } => {
            json!({ "ok": true, "action": "rename", "old": old, "new": new })
        }
        Outcome::Listed(profiles) => json!({ "ok": true, "profiles": profiles }),
        Outcome::Who {
            fingerprint,
            profile,
        } => {
            let mut value = json!({ "ok": true, "fingerprint": fingerprint });
            if let Some(profile) = profile {
                value["profile"] = json!(profile);
            }
            value
        }
        Outcome::Paths { paths, .. } => {
            serde_json::to_writer_pretty(&mut *out, paths)?;
            writeln!(out)?;
            return Ok(());
        }
        Outcome::Cancelled => json!({ "ok": true, "action": "cancel" }),
    };
    write_json_line(&value, out)
}

fn success() -> Style {
    Style::new().green().bold()
}

fn accent() -> Style {
    Style::new().cyan().bold()
}

fn danger() -> Style {
    Style::new().red().bold()
}

fn heading() -> Style {
    Style::new().bold()
}

fn muted() -> Style {
    Style::new().dimmed()
}

fn paint(text: impl fmt::Display, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

fn render_text(outcome: &Outcome, color: bool, out: &mut impl Write) -> Result<(), SwitchError> {
    match outcome {
        Outcome::Version(version) => writeln!(out, "{version}")?,
        Outcome::Initialized { profiles_dir } => writeln!(
            out,
            "{} Initialized profiles directory: {}",
            paint("✓", success(), color),
            profiles_dir.display()
        )?,
        Outcome::Saved { profile, .. } => writeln!(
            out,
            "{} Saved profile: {}",
            paint("✓", success(), color),
            paint(profile, heading(), color)
        )?,
        Outcome::Switched { profile, .. } => writeln!(
            out,
            "{} Switched -> {}",
            paint("⚡", accent(), color),
            paint(profile, accent(), color)
        )?,
        Outcome::Deleted { profile } => writeln!(
            out,
            "{} Deleted profile: {}",
            paint("✗", danger(), color),
            paint(profile, heading(), color)
        )?,
        Outcome::Renamed { old, new } => writeln!(
            out,
            "{} Renamed: {old} → {}",
            paint("→", accent(), color),
            paint(new, heading(), color)
        )?,
        Outcome::Listed(profiles) => {
            writeln!(out)?;
            writeln!(out, "  {}", paint("Profiles", heading(), color))?;
            writeln!(out, "  {}", paint("----------------------------", muted(), color))?;
            if profiles.is_empty() {
                writeln!(out, "    (none saved yet; try `codex-switch save <name>`)")?;
            }
            for profile in profiles {
                let short = paint(profile.short_fingerprint(), muted(), color);
                if profile.active {
                    writeln!(
                        out,
                        "  {} {}  {short}  {}",
                        paint("▸", success(), color),
                        paint(&profile.name, success(), color),
                        paint("active", success(), color)
                    )?;
                } else {
                    writeln!(out, "    {}  {short}", profile.name)?;
                }
            }
            writeln!(out)?;
        }
        Outcome::Who { fingerprint, .. } => writeln!(out, "{fingerprint}")?,
        Outcome::Paths { paths, terminal } => render_paths(paths, *terminal, color, out)?,
        Outcome::Cancelled => {}
    }
    Ok(())
}

fn render_paths(
    paths: &ResolvedPaths,
    terminal: bool,
    color: bool,
    out: &mut impl Write,
) -> Result<(), SwitchError> {
    if !terminal {
        writeln!(out, "CODEX_HOME={}", paths.codex_home.as_deref().unwrap_or(""))?;
        writeln!(out, "CODEX_DIR={}", paths.codex_dir.display())?;
        writeln!(out, "AUTH={}", paths.auth.display())?;
        writeln!(out, "PROFILES_DIR={}", paths.profiles_dir.display())?;
        return Ok(());
    }

    writeln!(out, "  {}", paint("Resolved Paths", heading(), color))?;
    writeln!(out, "  {}", paint("----------------------------", muted(), color))?;
    writeln!(
        out,
        "  CODEX_HOME     = {}",
        paths.codex_home.as_deref().unwrap_or("(not set)")
    )?;
    writeln!(out, "  CODEX_DIR      = {}", paths.codex_dir.display())?;
    writeln!(out, "  AUTH           = {}", paths.auth.display())?;
    writeln!(out, "  PROFILES_DIR   = {}", paths.profiles_dir.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(outcome: &Outcome) -> String {
        let mut out = Vec::new();
        render(outcome, OutputMode::Text { color: false }, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn json_value(outcome: &Outcome) -> Value {
        let mut out = Vec::new();
        render(outcome, OutputMode::Json, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    fn name(value: &str) -> ProfileName {
        ProfileName::parse(value).unwrap()
    }

    #[test]
    fn list_text_marks_active_profile() {
        let outcome = Outcome::Listed(vec![
            ProfileStatus {
                name: name("home"),
                fingerprint: "0123456789abcdef".repeat(4),
                active: false,
            },
            ProfileStatus {
                name: name("work"),
                fingerprint: "fedcba9876543210".repeat(4),
                active: true,
            },
        ]);
        let rendered = text(&outcome);
        assert!(rendered.contains("    home  0123456789ab\n"), "{rendered}");
        assert!(rendered.contains("  ▸ work  fedcba987654  active\n"), "{rendered}");
    }

    #[test]
    fn switch_json_names_profile_and_auth() {
        let value = json_value(&Outcome::Switched {
            profile: name("work"),
            auth: PathBuf::from("/tmp/codex/auth.json"),
        });
        assert_eq!(value["ok"], true);
        assert_eq!(value["action"], "use");
        assert_eq!(value["profile"], "work");
        assert_eq!(value["auth"], "/tmp/codex/auth.json");
    }

    #[test]
    fn who_json_includes_profile_only_when_known() {
        let anonymous = json_value(&Outcome::Who {
            fingerprint: "abc".into(),
            profile: None,
        });
        assert!(anonymous.get("profile").is_none());

        let known = json_value(&Outcome::Who {
            fingerprint: "abc".into(),
            profile: Some(name("work")),
        });
        assert_eq!(known["profile"], "work");
    }

    #[test]
    fn plain_paths_are_key_value_lines() {
        let paths = ResolvedPaths {
            codex_home: None,
            codex_dir: PathBuf::from("/h/.codex"),
            auth: PathBuf::from("/h/.codex/auth.json"),
            profiles_dir: PathBuf::from("/h/.codex/profiles"),
        };
        let rendered = text(&Outcome::Paths {
            paths: paths.clone(),
            terminal: false,
        });
        assert_eq!(
            rendered,
            "CODEX_HOME=\nCODEX_DIR=/h/.codex\nAUTH=/h/.codex/auth.json\n\
             PROFILES_DIR=/h/.codex/profiles\n"
        );

        let table = text(&Outcome::Paths {
            paths,
            terminal: true,
        });
        assert!(table.contains("CODEX_HOME     = (not set)"));
    }

    #[test]
    fn error_json_has_ok_false() {
        let mut out = Vec::new();
        render_error_json(
            &SwitchError::ProfileNotFound {
                name: "ghost".into(),
            },
            &mut out,
        )
        .unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "profile not found: ghost");
    }

    #[test]
    fn text_is_styled_only_when_color_is_enabled() {
        let outcome = Outcome::Saved {
            profile: name("work"),
            path: PathBuf::from("/h/.codex/profiles/work.json"),
        };
        assert_eq!(text(&outcome), "✓ Saved profile: work\n");

        let mut out = Vec::new();
        render(&outcome, OutputMode::Text { color: true }, &mut out).unwrap();
        let styled = String::from_utf8(out).unwrap();
        assert!(styled.contains("\u{1b}["), "{styled:?}");
        assert!(styled.contains("work"), "{styled:?}");
    }
}
