use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Cell, Row, Table, TableState},
};

use crate::{
    humanize, pathutil,
    ui::{Mode, SelectorModel},
};

const CHECK: &str = "☑";
const UNCHECK: &str = "☐";
const BAR: &str = "───";
const DOT: &str = " • ";

// Column shares of the terminal width.
const FILENAME_W: u16 = 46;
const PATH_W: u16 = 25;
const DATE_W: u16 = 15;
const SIZE_W: u16 = 12;
const CHECK_W: u16 = 2;

pub fn render(frame: &mut Frame, model: &SelectorModel, state: &mut TableState) {
    let [header_area, table_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(Line::raw(header(model)), header_area);

    let table = build_table(model);
    frame.render_stateful_widget(table, table_area, state);

    frame.render_widget(Line::raw(footer(model)), footer_area);
}

fn build_table(model: &SelectorModel) -> Table<'static> {
    let date_title = match model.mode() {
        Mode::Trashing => "modified",
        _ => "trashed",
    };

    let inner = model.width().saturating_sub(4).max(20);
    let share = |percent: u16| inner * percent / 100;

    let mut titles = vec![Cell::from("filename"), Cell::from("path")];
    titles.push(Cell::from(date_title));
    titles.push(Cell::from("size"));

    let mut widths = vec![
        Constraint::Length(share(FILENAME_W)),
        Constraint::Length(share(PATH_W)),
        Constraint::Length(share(DATE_W)),
        Constraint::Length(share(SIZE_W)),
    ];

    if model.readonly() {
        // No check column; its share goes to the filename.
        widths[0] = Constraint::Length(share(FILENAME_W) + share(CHECK_W));
    } else {
        titles.push(Cell::from(UNCHECK));
        widths.push(Constraint::Length(share(CHECK_W)));
    }

    let rows: Vec<Row> = if model.visible().is_empty() {
        let mut cells = vec![
            Cell::from("no files matched filter!"),
            Cell::from(BAR),
            Cell::from(BAR),
            Cell::from(BAR),
        ];
        if !model.readonly() {
            cells.push(Cell::from(UNCHECK));
        }
        vec![Row::new(cells)]
    } else {
        model
            .visible()
            .iter()
            .map(|file| {
                let dir = file
                    .path()
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_default();
                let size = if file.is_dir() && file.size() == 0 {
                    BAR.to_string()
                } else {
                    humanize::format_size(file.size())
                };

                let mut cells = vec![
                    Cell::from(pathutil::percent_decode(file.name())),
                    Cell::from(pathutil::unexpand(&dir, model.workdir())),
                    Cell::from(humanize::relative_time(file.modified())),
                    Cell::from(size),
                ];
                if !model.readonly() {
                    cells.push(Cell::from(if model.is_selected(file) {
                        CHECK
                    } else {
                        UNCHECK
                    }));
                }
                Row::new(cells)
            })
            .collect()
    };

    Table::new(rows, widths)
        .header(Row::new(titles).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::bordered())
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
}

fn header(model: &SelectorModel) -> String {
    let counts = format!(
        "{}/{}{DOT}{}",
        model.selected_count(),
        model.visible().len(),
        humanize::format_size(model.selected_size())
    );
    let select_keys = format!("a all{DOT}n none{DOT}i invert");

    match model.mode() {
        _ if model.filtering() => {
            format!(" Filtering{DOT}esc clear{DOT}enter apply")
        }
        Mode::Interactive => {
            format!(" r restore{DOT}c clean{DOT}{select_keys}   {counts}")
        }
        Mode::Listing => {
            let filtered = if model.filter_text().is_empty() {
                ""
            } else {
                " (filtered)"
            };
            format!(" Showing{filtered} {} files in trash", model.visible().len())
        }
        mode => {
            let wd = if model.workdir().is_empty() {
                String::new()
            } else {
                format!(
                    " in {}",
                    pathutil::unexpand(std::path::Path::new(model.workdir()), "")
                )
            };
            format!(" {}{wd}{DOT}{select_keys}   {counts}", mode.label())
        }
    }
}

fn footer(model: &SelectorModel) -> String {
    let filter = if model.filter_text().is_empty() {
        String::new()
    } else {
        format!(" ({})", model.filter_text())
    };

    let mut keys: Vec<String> = Vec::new();
    if !model.readonly() {
        keys.push("space toggle".to_string());
        if model.mode() != Mode::Interactive {
            keys.push("enter/y confirm".to_string());
        }
    }
    keys.push(format!("/ filter{filter}"));
    keys.push(format!("s/S sort ({})", model.sort_key().label()));
    keys.push("q quit".to_string());

    format!("  {}", keys.join(DOT))
}
