//! REPL – the interactive flyover shell.
//!
//! Supported slash-commands:
//!   /years        – list the years in the catalog
//!   /year <Y>     – fly through year Y
//!   /pause        – freeze on the current memory
//!   /resume       – continue (closes the fullscreen photo if open)
//!   /open         – open the visible photo fullscreen
//!   /close        – close the fullscreen photo
//!   /status       – show playback state
//!   /help         – show this list
//!   /quit | /exit – stop the flyover and exit

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use colored::Colorize;
use memoir_runtime::{FlyoverHandle, PlaybackSnapshot, SelectionController};
use memoir_types::{FlyoverError, PlaybackState, Year};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A parsed REPL line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Years,
    Year(Year),
    Pause,
    Resume,
    Open,
    Close,
    Status,
    Quit,
}

/// Parse one trimmed, non-empty input line.
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let cmd = words.next().unwrap_or_default();
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for {cmd}"));
    }
    let no_arg = |c: ReplCommand| match arg {
        None => Ok(c),
        Some(_) => Err(format!("{cmd} takes no argument")),
    };
    match cmd {
        "/help" => no_arg(ReplCommand::Help),
        "/years" => no_arg(ReplCommand::Years),
        "/year" => match arg {
            Some(y) => y
                .parse::<Year>()
                .map(ReplCommand::Year)
                .map_err(|_| format!("'{y}' is not a year")),
            None => Err("usage: /year <YEAR>".to_string()),
        },
        "/pause" => no_arg(ReplCommand::Pause),
        "/resume" => no_arg(ReplCommand::Resume),
        "/open" => no_arg(ReplCommand::Open),
        "/close" => no_arg(ReplCommand::Close),
        "/status" => no_arg(ReplCommand::Status),
        "/quit" | "/exit" => no_arg(ReplCommand::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled between lines; when set (Ctrl-C) the REPL exits.
pub fn run(
    selection: &mut SelectionController<FlyoverHandle>,
    flyover: &FlyoverHandle,
    shutdown: Arc<AtomicBool>,
) {
    let lines = spawn_stdin_reader();
    prompt();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }

        let command = match parse(line) {
            Ok(command) => command,
            Err(msg) => {
                println!(
                    "{} {msg}. Type {} for available commands.",
                    "Error:".red(),
                    "/help".bold()
                );
                prompt();
                continue;
            }
        };

        if command == ReplCommand::Quit {
            println!("{}", "Goodbye.".green());
            shutdown.store(true, Ordering::SeqCst);
            break;
        }
        if let Err(e) = dispatch(command, selection, flyover) {
            println!("{}: {e}", "Error".red());
        }
        prompt();
    }
}

fn dispatch(
    command: ReplCommand,
    selection: &mut SelectionController<FlyoverHandle>,
    flyover: &FlyoverHandle,
) -> Result<(), FlyoverError> {
    match command {
        ReplCommand::Help => cmd_help(),
        ReplCommand::Years => cmd_years(selection),
        ReplCommand::Year(year) => selection.select(year)?,
        ReplCommand::Pause => flyover.pause()?,
        ReplCommand::Resume => cmd_resume(flyover)?,
        ReplCommand::Open => match flyover.status().overlay {
            Some(handle) => flyover.activate_overlay(handle)?,
            None => println!("  {}", "No photo on screen.".dimmed()),
        },
        ReplCommand::Close => flyover.dismiss_fullscreen()?,
        ReplCommand::Status => print_status(&flyover.status()),
        ReplCommand::Quit => {}
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Memoir Commands".bold().underline());
    println!("  {}       – list the years in the catalog", "/years".bold().cyan());
    println!("  {}    – fly through year Y", "/year <Y>".bold().cyan());
    println!("  {}       – freeze on the current memory", "/pause".bold().cyan());
    println!("  {}      – continue the flyover", "/resume".bold().cyan());
    println!("  {}        – open the visible photo fullscreen", "/open".bold().cyan());
    println!("  {}       – close the fullscreen photo", "/close".bold().cyan());
    println!("  {}      – show playback state", "/status".bold().cyan());
    println!("  {} – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_years(selection: &SelectionController<FlyoverHandle>) {
    let controls = selection.controls();
    if controls.is_empty() {
        println!("  {}", "The catalog is empty.".dimmed());
        return;
    }
    for control in controls {
        if control.selected {
            println!("  {} {}", "▶".green(), control.label.bold());
        } else {
            println!("    {}", control.label);
        }
    }
}

fn cmd_resume(flyover: &FlyoverHandle) -> Result<(), FlyoverError> {
    let status = flyover.status();
    if status.fullscreen.is_some() {
        return flyover.dismiss_fullscreen();
    }
    match status.year {
        Some(year) => flyover.resume(year),
        None => {
            println!("  {}", "Nothing to resume.".dimmed());
            Ok(())
        }
    }
}

fn print_status(status: &PlaybackSnapshot) {
    let state = match status.state {
        PlaybackState::Idle => "idle".dimmed(),
        PlaybackState::Playing => "playing".green(),
        PlaybackState::Paused => "paused".yellow(),
    };
    println!("{}", "Flyover Status".bold().underline());
    println!("  State      : {state}");
    if let Some(year) = status.year {
        println!("  Year       : {}", year.to_string().bold());
    }
    if status.len > 0 {
        println!("  Next       : {} of {}", status.cursor + 1, status.len);
    }
    if let Some(current) = &status.current {
        println!("  On screen  : {} ({})", current.caption, current.label().dimmed());
    }
    if let Some(photo) = &status.fullscreen {
        println!("  Fullscreen : {}", photo.photo.bold());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt() {
    print!("{} ", "memoir>".bold().cyan());
    io::stdout().flush().ok();
}

/// Read stdin on its own thread so the REPL can notice Ctrl-C between lines.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("{}: {e}", "Read error".red());
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let cases = [
            ("/help", ReplCommand::Help),
            ("/years", ReplCommand::Years),
            ("/year 2023", ReplCommand::Year(2023)),
            ("/pause", ReplCommand::Pause),
            ("/resume", ReplCommand::Resume),
            ("/open", ReplCommand::Open),
            ("/close", ReplCommand::Close),
            ("/status", ReplCommand::Status),
            ("/quit", ReplCommand::Quit),
            ("/exit", ReplCommand::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(parse(line), Ok(expected), "{line}");
        }
    }

    #[test]
    fn year_requires_a_number() {
        assert!(parse("/year").is_err());
        assert!(parse("/year twenty").unwrap_err().contains("not a year"));
        assert!(parse("/year -1").is_err());
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(parse("/pause now").is_err());
        assert!(parse("/year 2022 2023").is_err());
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(parse("/fly"), Err("unknown command '/fly'".to_string()));
    }
}
