use std::io::{self, Write};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use supports_color::Stream;
use codex_switch::{
    cli::{self, Cli},
    logging,
    output::{self, OutputMode},
    SwitchError,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let mode = cli.output_mode();

    let Some(command) = cli.command else {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    let result = cli::run(command, mode).and_then(|outcome| {
        let mut stdout = io::stdout().lock();
        output::render(&outcome, mode, &mut stdout)?;
        stdout.flush()?;
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, mode);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &SwitchError, mode: OutputMode) {
    tracing::debug!(error = ?err, "command failed");
    if mode == OutputMode::Json
        && output::render_error_json(err, &mut io::stdout().lock()).is_ok()
    {
        return;
    }
    if supports_color::on(Stream::Stderr).is_some() {
        eprintln!("{} {err}", "Error:".red().bold());
    } else {
        eprintln!("Error: {err}");
    }
}
