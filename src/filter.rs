use chrono::{DateTime, Datelike, Local};
use globset::{Glob, GlobMatcher};
use chrono_english::{Dialect, parse_date_string};
use regex::Regex;

use crate::{
    error::{ConfigKind, Error, Result},
    fileview::{FileEntry, MODE_DIR},
    humanize, pathutil,
};

/// Raw filter configuration as it arrives from the command line.
/// Everything is optional; empty means "don't care".
#[derive(Debug, Default, Clone)]
pub struct FilterOptions {
    pub on: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub glob: Option<String>,
    pub not_glob: Option<String>,
    pub regex: Option<String>,
    pub not_regex: Option<String>,
    pub names: Vec<String>,
    pub files_only: bool,
    pub dirs_only: bool,
    pub ignore_hidden: bool,
    pub min_size: Option<String>,
    pub max_size: Option<String>,
    pub mode: Option<String>,
}

/// Compiled predicate over [`FileEntry`]. Construction parses every
/// enabled option eagerly so bad input fails before any side effect.
#[derive(Debug)]
pub struct Filter {
    on: Option<DateTime<Local>>,
    after: Option<DateTime<Local>>,
    before: Option<DateTime<Local>>,
    glob: Option<GlobMatcher>,
    not_glob: Option<GlobMatcher>,
    regex: Option<Regex>,
    not_regex: Option<Regex>,
    names: Vec<String>,
    files_only: bool,
    dirs_only: bool,
    ignore_hidden: bool,
    min_size: i64,
    max_size: i64,
    mode: Option<u32>,
}

impl Filter {
    pub fn new(options: FilterOptions) -> Result<Self> {
        let now = Local::now();

        let mut filter = Self {
            on: parse_date(options.on.as_deref(), now)?,
            after: parse_date(options.after.as_deref(), now)?,
            before: parse_date(options.before.as_deref(), now)?,
            glob: compile_glob(options.glob.as_deref())?,
            not_glob: compile_glob(options.not_glob.as_deref())?,
            regex: compile_regex(options.regex.as_deref())?,
            not_regex: compile_regex(options.not_regex.as_deref())?,
            names: Vec::new(),
            files_only: options.files_only,
            dirs_only: options.dirs_only,
            ignore_hidden: options.ignore_hidden,
            min_size: parse_bound(options.min_size.as_deref())?,
            max_size: parse_bound(options.max_size.as_deref())?,
            mode: parse_mode(options.mode.as_deref())?,
        };

        for name in &options.names {
            filter.add_name(name);
        }

        Ok(filter)
    }

    /// Adds a basename to the allow-list. Used for positional arguments
    /// that turned out not to be real paths.
    pub fn add_name(&mut self, name: &str) {
        let cleaned = pathutil::lexical_clean(std::path::Path::new(name));
        self.names.push(cleaned.display().to_string());
    }

    /// The walker prunes hidden subtrees when this is set.
    pub fn ignores_hidden(&self) -> bool {
        self.ignore_hidden
    }

    /// True when no condition is enabled, so callers can distinguish an
    /// empty trash from a filter that matched nothing.
    pub fn blank(&self) -> bool {
        self.on.is_none()
            && self.after.is_none()
            && self.before.is_none()
            && self.glob.is_none()
            && self.not_glob.is_none()
            && self.regex.is_none()
            && self.not_regex.is_none()
            && self.names.is_empty()
            && !self.files_only
            && !self.dirs_only
            && !self.ignore_hidden
            && self.min_size == 0
            && self.max_size == 0
            && self.mode.is_none()
    }

    /// Applies every enabled condition as a conjunction.
    pub fn matches(&self, entry: &FileEntry) -> bool {
        let name = entry.name();
        let modified = entry.modified();
        let size = entry.size();

        // `on` takes precedence over the before/after window.
        if let Some(on) = self.on {
            if !same_day(on, modified) {
                return false;
            }
        } else {
            if let Some(after) = self.after {
                if modified <= after {
                    return false;
                }
            }
            if let Some(before) = self.before {
                if modified >= before {
                    return false;
                }
            }
        }

        if let Some(re) = &self.regex {
            if !re.is_match(name) {
                return false;
            }
        }

        if let Some(glob) = &self.glob {
            if !glob.is_match(name) {
                return false;
            }
        }

        if let Some(re) = &self.not_regex {
            if re.is_match(name) {
                return false;
            }
        }

        if let Some(glob) = &self.not_glob {
            if glob.is_match(name) {
                return false;
            }
        }

        if !self.names.is_empty() && !self.names.iter().any(|n| n == name) {
            return false;
        }

        if self.files_only && entry.is_dir() {
            return false;
        }

        if self.dirs_only && !entry.is_dir() {
            return false;
        }

        if self.ignore_hidden && name.starts_with('.') {
            return false;
        }

        if self.max_size != 0 && size > self.max_size {
            return false;
        }

        if self.min_size != 0 && size < self.min_size {
            return false;
        }

        if let Some(want) = self.mode {
            let mode = entry.mode();
            // A bare permission pattern matches directories of that
            // permission too.
            if mode != want && mode & !MODE_DIR != want {
                return false;
            }
        }

        true
    }
}

fn parse_date(input: Option<&str>, now: DateTime<Local>) -> Result<Option<DateTime<Local>>> {
    match input {
        None | Some("") => Ok(None),
        Some(s) => parse_date_string(s, now, Dialect::Us)
            .map(Some)
            .map_err(|_| Error::config(ConfigKind::Date, s)),
    }
}

fn compile_glob(input: Option<&str>) -> Result<Option<GlobMatcher>> {
    match input {
        None | Some("") => Ok(None),
        Some(s) => Glob::new(s)
            .map(|g| Some(g.compile_matcher()))
            .map_err(|_| Error::config(ConfigKind::Regex, s)),
    }
}

fn compile_regex(input: Option<&str>) -> Result<Option<Regex>> {
    match input {
        None | Some("") => Ok(None),
        Some(s) => Regex::new(s)
            .map(Some)
            .map_err(|_| Error::config(ConfigKind::Regex, s)),
    }
}

fn parse_bound(input: Option<&str>) -> Result<i64> {
    match input {
        None | Some("") => Ok(0),
        Some(s) => humanize::parse_size(s).ok_or_else(|| Error::config(ConfigKind::Size, s)),
    }
}

fn parse_mode(input: Option<&str>) -> Result<Option<u32>> {
    match input {
        None | Some("") => Ok(None),
        Some(s) => humanize::parse_mode(s)
            .map(Some)
            .ok_or_else(|| Error::config(ConfigKind::Mode, s)),
    }
}

fn same_day(a: DateTime<Local>, b: DateTime<Local>) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileview::DiskFile;
    use chrono::Duration;
    use std::path::PathBuf;

    fn entry(name: &str, size: i64, modified: DateTime<Local>, is_dir: bool) -> FileEntry {
        let mode = if is_dir { 0o755 | MODE_DIR } else { 0o644 };
        FileEntry::Disk(DiskFile {
            name: name.to_string(),
            dir: PathBuf::from("/tmp/test"),
            size,
            modified,
            is_dir,
            mode,
        })
    }

    fn file(name: &str) -> FileEntry {
        entry(name, 100, Local::now(), false)
    }

    fn build(options: FilterOptions) -> Filter {
        Filter::new(options).unwrap()
    }

    #[test]
    fn test_blank_matches_everything() {
        let f = build(FilterOptions::default());
        assert!(f.blank());
        for e in [
            file("anything.txt"),
            file(".hidden"),
            entry("dir", 0, Local::now(), true),
        ] {
            assert!(f.matches(&e));
        }
    }

    #[test]
    fn test_glob() {
        let f = build(FilterOptions {
            glob: Some("*.txt".to_string()),
            ..Default::default()
        });
        assert!(!f.blank());
        assert!(f.matches(&file("notes.txt")));
        assert!(!f.matches(&file("notes.md")));
    }

    #[test]
    fn test_not_glob() {
        let f = build(FilterOptions {
            not_glob: Some("*.log".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&file("app.txt")));
        assert!(!f.matches(&file("app.log")));
    }

    #[test]
    fn test_regex_and_negation() {
        let f = build(FilterOptions {
            regex: Some(r"^photo_\d+".to_string()),
            not_regex: Some(r"\.raw$".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&file("photo_001.jpg")));
        assert!(!f.matches(&file("photo_001.raw")));
        assert!(!f.matches(&file("scan_001.jpg")));
    }

    #[test]
    fn test_bad_regex_is_config_error() {
        let err = Filter::new(FilterOptions {
            regex: Some("*(".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigInvalid {
                kind: ConfigKind::Regex,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_date_is_config_error() {
        let err = Filter::new(FilterOptions {
            on: Some("the heat death of the universe".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigInvalid {
                kind: ConfigKind::Date,
                ..
            }
        ));
    }

    #[test]
    fn test_names_allow_list() {
        let mut f = build(FilterOptions::default());
        f.add_name("keep.txt");
        f.add_name("./also.txt");
        assert!(!f.blank());
        assert!(f.matches(&file("keep.txt")));
        assert!(f.matches(&file("also.txt")));
        assert!(!f.matches(&file("drop.txt")));
    }

    #[test]
    fn test_kind_restrictions() {
        let files_only = build(FilterOptions {
            files_only: true,
            ..Default::default()
        });
        let dirs_only = build(FilterOptions {
            dirs_only: true,
            ..Default::default()
        });
        let d = entry("stuff", 0, Local::now(), true);
        let f = file("stuff.txt");
        assert!(files_only.matches(&f));
        assert!(!files_only.matches(&d));
        assert!(dirs_only.matches(&d));
        assert!(!dirs_only.matches(&f));
    }

    #[test]
    fn test_ignore_hidden() {
        let f = build(FilterOptions {
            ignore_hidden: true,
            ..Default::default()
        });
        assert!(f.matches(&file("visible.txt")));
        assert!(!f.matches(&file(".bashrc")));
    }

    #[test]
    fn test_size_bounds() {
        let f = build(FilterOptions {
            min_size: Some("1K".to_string()),
            max_size: Some("1M".to_string()),
            ..Default::default()
        });
        assert!(!f.matches(&entry("small", 100, Local::now(), false)));
        assert!(f.matches(&entry("medium", 10_240, Local::now(), false)));
        assert!(!f.matches(&entry("huge", 10 << 20, Local::now(), false)));
    }

    #[test]
    fn test_conjunction() {
        // glob + min size together: only the large .txt file survives.
        let now = Local::now();
        let f = build(FilterOptions {
            glob: Some("*.txt".to_string()),
            min_size: Some("1KB".to_string()),
            ..Default::default()
        });
        let a = entry("a.txt", 100, now, false);
        let b = entry("b.md", 2048, now, false);
        let c = entry("c.txt", 50 * 1024, now - Duration::days(365), false);
        assert!(!f.matches(&a));
        assert!(!f.matches(&b));
        assert!(f.matches(&c));
    }

    #[test]
    fn test_on_day() {
        let now = Local::now();
        let f = build(FilterOptions {
            on: Some("today".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&entry("today.txt", 1, now, false)));
        assert!(!f.matches(&entry("old.txt", 1, now - Duration::days(3), false)));
    }

    #[test]
    fn test_before_after_window() {
        let now = Local::now();
        let f = build(FilterOptions {
            after: Some("2 days ago".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&entry("fresh.txt", 1, now, false)));
        assert!(!f.matches(&entry("stale.txt", 1, now - Duration::days(7), false)));

        let f = build(FilterOptions {
            before: Some("yesterday".to_string()),
            ..Default::default()
        });
        assert!(!f.matches(&entry("fresh.txt", 1, now, false)));
        assert!(f.matches(&entry("stale.txt", 1, now - Duration::days(7), false)));
    }

    #[test]
    fn test_mode_matches_files_and_dirs() {
        let f = build(FilterOptions {
            mode: Some("755".to_string()),
            ..Default::default()
        });
        let script = FileEntry::Disk(DiskFile {
            name: "run.sh".to_string(),
            dir: PathBuf::from("/tmp"),
            size: 10,
            modified: Local::now(),
            is_dir: false,
            mode: 0o755,
        });
        let dir = entry("bin", 0, Local::now(), true);
        let private = FileEntry::Disk(DiskFile {
            name: "secret".to_string(),
            dir: PathBuf::from("/tmp"),
            size: 10,
            modified: Local::now(),
            is_dir: false,
            mode: 0o600,
        });
        assert!(f.matches(&script));
        assert!(f.matches(&dir));
        assert!(!f.matches(&private));
    }
}
