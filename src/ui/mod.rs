//! The interactive selector: a full-screen table over a file list with
//! multi-selection, fuzzy filtering and cycling sorts.

mod model;
mod view;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, widgets::TableState};

use crate::{fileview::FileEntry, humanize, pathutil};

pub use model::SelectorModel;

/// What the selector is being used for. Listing is read-only; the
/// Interactive entry point can hand off to Restoring or Cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Trashing,
    Listing,
    Restoring,
    Cleaning,
    Interactive,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trashing => "Trashing",
            Self::Listing => "Listing",
            Self::Restoring => "Restoring",
            Self::Cleaning => "Cleaning",
            Self::Interactive => "Interactive",
        }
    }
}

/// Runs the selector and returns the chosen entries plus the mode the
/// user left in (`r`/`c` switch Interactive to Restoring/Cleaning).
///
/// With `once` set there is nothing to interact with: the whole list
/// (preselected or not) is the answer.
pub fn select(
    files: Vec<FileEntry>,
    select_all: bool,
    once: bool,
    workdir: &str,
    mode: Mode,
) -> Result<(Vec<FileEntry>, Mode)> {
    let mut model = SelectorModel::new(files, select_all, false, workdir, mode);

    if once {
        return Ok((model.take_selected(), model.mode()));
    }

    run_loop(&mut model)?;
    Ok((model.take_selected(), model.mode()))
}

/// Read-only browsing of a file list; `once` prints the table to stdout
/// for pipelines instead of entering the TUI.
pub fn show(mut files: Vec<FileEntry>, once: bool, workdir: &str) -> Result<()> {
    if once {
        crate::sort::SortKey::default().sort(&mut files);
        print_table(&files, workdir);
        return Ok(());
    }

    let mut model = SelectorModel::new(files, false, true, workdir, Mode::Listing);
    run_loop(&mut model)
}

/// Owns raw mode and the alternate screen; `Drop` puts the terminal
/// back no matter how the loop ends.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}

fn run_loop(model: &mut SelectorModel) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let mut table_state = TableState::default();

    if let Ok(area) = guard.terminal.size() {
        model.resize(area.width, area.height);
    }

    loop {
        table_state.select(Some(model.cursor()));
        guard
            .terminal
            .draw(|frame| view::render(frame, model, &mut table_state))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => model.handle_key(key),
            Event::Resize(width, height) => model.resize(width, height),
            _ => {}
        }

        if model.finished() {
            return Ok(());
        }
    }
}

/// Plain text rendering of the same columns the TUI shows, for
/// `list --non-interactive`.
fn print_table(files: &[FileEntry], workdir: &str) {
    let mut rows = Vec::with_capacity(files.len());
    for file in files {
        let dir = file.path().parent().map(|p| p.to_path_buf()).unwrap_or_default();
        rows.push((
            pathutil::percent_decode(file.name()),
            pathutil::unexpand(&dir, workdir),
            humanize::relative_time(file.modified()),
            if file.is_dir() && file.size() == 0 {
                "───".to_string()
            } else {
                humanize::format_size(file.size())
            },
        ));
    }

    let name_w = rows.iter().map(|r| r.0.len()).max().unwrap_or(8).max(8);
    let path_w = rows.iter().map(|r| r.1.len()).max().unwrap_or(4).max(4);
    let date_w = rows.iter().map(|r| r.2.len()).max().unwrap_or(7).max(7);

    println!("{:<name_w$}  {:<path_w$}  {:<date_w$}  size", "filename", "path", "trashed");
    for (name, path, date, size) in rows {
        println!("{name:<name_w$}  {path:<path_w$}  {date:<date_w$}  {size}");
    }
}
