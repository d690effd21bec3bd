use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{fileview::FileEntry, sort::SortKey, ui::Mode};

/// The selector's whole state. Pure with respect to the terminal: keys
/// and resizes come in through methods, rendering only reads.
pub struct SelectorModel {
    files: Vec<FileEntry>,
    visible: Vec<FileEntry>,
    cursor: usize,
    selected: HashSet<String>,
    selected_size: i64,
    sort: SortKey,
    filter_text: String,
    filtering: bool,
    mode: Mode,
    readonly: bool,
    workdir: String,
    width: u16,
    height: u16,
    finished: bool,
}

impl SelectorModel {
    pub fn new(
        files: Vec<FileEntry>,
        select_all: bool,
        readonly: bool,
        workdir: &str,
        mode: Mode,
    ) -> Self {
        let mut model = Self {
            files,
            visible: Vec::new(),
            cursor: 0,
            selected: HashSet::new(),
            selected_size: 0,
            sort: SortKey::default(),
            filter_text: String::new(),
            filtering: false,
            mode,
            readonly,
            workdir: workdir.to_string(),
            width: 80,
            height: 24,
            finished: false,
        };
        model.resort();
        if select_all {
            model.select_all();
        }
        model
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn workdir(&self) -> &str {
        &self.workdir
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn filtering(&self) -> bool {
        self.filtering
    }

    pub fn visible(&self) -> &[FileEntry] {
        &self.visible
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn selected_size(&self) -> i64 {
        self.selected_size
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn is_selected(&self, entry: &FileEntry) -> bool {
        self.selected.contains(&entry.key())
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// The selected entries in display order. Consumes the selection.
    pub fn take_selected(&mut self) -> Vec<FileEntry> {
        let selected = std::mem::take(&mut self.selected);
        self.visible
            .iter()
            .filter(|f| selected.contains(&f.key()))
            .cloned()
            .collect()
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp_cursor();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.filtering {
            self.handle_filter_key(key);
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-(self.page() as isize)),
            KeyCode::PageDown => self.move_cursor(self.page() as isize),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.clamp_to_end(),
            KeyCode::Char(' ') => self.toggle_cursor(),
            KeyCode::Char('a') => self.select_all(),
            KeyCode::Char('n') => self.unselect_all(),
            KeyCode::Char('i') | KeyCode::Tab => self.invert_selection(),
            KeyCode::Enter | KeyCode::Char('y') => self.confirm(),
            KeyCode::Char('r') => self.execute(Mode::Restoring),
            KeyCode::Char('c') => self.execute(Mode::Cleaning),
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.resort();
            }
            KeyCode::Char('S') => {
                self.sort = self.sort.prev();
                self.resort();
            }
            KeyCode::Char('/') => self.filtering = true,
            KeyCode::Esc => {
                if !self.filter_text.is_empty() {
                    self.filter_text.clear();
                    self.apply_filter();
                }
            }
            KeyCode::Char('q') => self.quit(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.filter_text.clear();
                self.filtering = false;
            }
            KeyCode::Enter => self.filtering = false,
            KeyCode::Backspace => {
                self.filter_text.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filtering = false;
                self.quit();
                return;
            }
            KeyCode::Char(c) => self.filter_text.push(c),
            _ => {}
        }
        self.apply_filter();
    }

    /// Quit with nothing: `q` and ctrl-c drop the selection.
    fn quit(&mut self) {
        self.selected.clear();
        self.selected_size = 0;
        self.finished = true;
    }

    /// Enter/y finish a non-Interactive selection.
    fn confirm(&mut self) {
        if !self.readonly && self.mode != Mode::Interactive && !self.visible.is_empty() {
            self.finished = true;
        }
    }

    /// `r`/`c` turn an Interactive session into a restore or clean run.
    fn execute(&mut self, target: Mode) {
        if self.mode != Mode::Interactive || self.selected.is_empty() || self.visible.is_empty() {
            return;
        }
        self.mode = target;
        self.finished = true;
    }

    fn toggle_cursor(&mut self) {
        if self.readonly || self.visible.is_empty() {
            return;
        }
        let entry = &self.visible[self.cursor];
        let key = entry.key();
        let size = entry.size();
        if self.selected.remove(&key) {
            self.selected_size -= size;
        } else {
            self.selected.insert(key);
            self.selected_size += size;
        }
    }

    fn select_all(&mut self) {
        if self.readonly || self.visible.is_empty() {
            return;
        }
        self.selected.clear();
        self.selected_size = 0;
        for entry in &self.visible {
            self.selected.insert(entry.key());
            self.selected_size += entry.size();
        }
    }

    fn unselect_all(&mut self) {
        if self.readonly {
            return;
        }
        self.selected.clear();
        self.selected_size = 0;
    }

    fn invert_selection(&mut self) {
        if self.readonly || self.visible.is_empty() {
            return;
        }
        for entry in &self.visible {
            let key = entry.key();
            if self.selected.remove(&key) {
                self.selected_size -= entry.size();
            } else {
                self.selected.insert(key);
                self.selected_size += entry.size();
            }
        }
    }

    fn resort(&mut self) {
        self.sort.sort(&mut self.files);
        self.apply_filter();
    }

    /// Rebuilds the visible list from the sorted full list. Anything
    /// the filter hides also leaves the selection.
    fn apply_filter(&mut self) {
        self.visible.clear();
        for entry in &self.files {
            if fuzzy_match(&self.filter_text, entry.name()) {
                self.visible.push(entry.clone());
            } else if self.selected.remove(&entry.key()) {
                self.selected_size -= entry.size();
            }
        }
        self.clamp_cursor();
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.visible.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    fn clamp_cursor(&mut self) {
        if self.visible.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len() - 1;
        }
    }

    fn clamp_to_end(&mut self) {
        self.cursor = self.visible.len().saturating_sub(1);
    }

    fn page(&self) -> usize {
        self.height.saturating_sub(6).max(1) as usize
    }
}

/// Case-insensitive subsequence match, empty pattern matches all.
fn fuzzy_match(pattern: &str, name: &str) -> bool {
    let mut chars = name.chars().flat_map(char::to_lowercase);
    pattern
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| chars.any(|n| n == p))
}
