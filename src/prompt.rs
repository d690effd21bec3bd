use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal,
};
use dialoguer::Input;

/// What to do when a restore destination already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionChoice {
    Overwrite,
    Rename(PathBuf),
    Cancel,
}

pub trait Prompter {
    fn confirm(&self, message: &str) -> Result<bool>;
    fn resolve_collision(&self, dest: &Path) -> Result<CollisionChoice>;
}

/// Single-key prompts on the controlling terminal.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        Ok(ask_key(message, "y/n")? == Some('y'))
    }

    fn resolve_collision(&self, dest: &Path) -> Result<CollisionChoice> {
        loop {
            let question = format!(
                "file {} exists, overwrite, rename, or cancel?",
                dest.display()
            );
            match ask_key(&question, "o/r/c")? {
                Some('o') => return Ok(CollisionChoice::Overwrite),
                Some('r') => {
                    let answer: String = Input::new()
                        .with_prompt("input a new path")
                        .interact_text()?;
                    let path = PathBuf::from(answer);
                    // Only accept a destination that is actually free.
                    if std::fs::symlink_metadata(&path).is_err() {
                        return Ok(CollisionChoice::Rename(path));
                    }
                    eprintln!("{} exists too", path.display());
                }
                _ => return Ok(CollisionChoice::Cancel),
            }
        }
    }
}

/// Answers yes to every question and skips collisions; used by batch
/// paths and tests.
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(true)
    }

    fn resolve_collision(&self, _dest: &Path) -> Result<CollisionChoice> {
        Ok(CollisionChoice::Cancel)
    }
}

/// Restores cooked mode on every exit path, early returns and panics
/// included.
struct RawModeGuard;

impl RawModeGuard {
    fn acquire() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Prints `message [options]: ` and reads exactly one key, lowercased.
/// Ctrl-C reads as no answer. A piped stdin reads a line instead of a
/// key so scripted runs can answer prompts.
fn ask_key(message: &str, options: &str) -> Result<Option<char>> {
    print!("{message} [{options}]: ");
    io::stdout().flush()?;

    if !io::stdin().is_terminal() {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        println!();
        return Ok(line.trim().chars().next().map(|c| c.to_ascii_lowercase()));
    }

    let answer = {
        let _guard = RawModeGuard::acquire()?;
        loop {
            if let Event::Key(key) = event::read()? {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    break None;
                }
                if let KeyCode::Char(c) = key.code {
                    break Some(c.to_ascii_lowercase());
                }
                if key.code == KeyCode::Esc || key.code == KeyCode::Enter {
                    break None;
                }
            }
        }
    };

    match answer {
        Some(c) => println!("{c}"),
        None => println!(),
    }
    Ok(answer)
}
