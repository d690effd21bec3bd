use std::cmp::Ordering;

use crate::fileview::FileEntry;

/// The orderings the selector cycles through with `s`/`S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    NameRev,
    Date,
    DateRev,
    Path,
    PathRev,
    Size,
    SizeRev,
    Ext,
    ExtRev,
    DirsFirst,
    DirsLast,
}

impl SortKey {
    /// Explicit ring rather than integer arithmetic, so adding a
    /// variant is a compile error here instead of a silent skip.
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::NameRev,
            Self::NameRev => Self::Date,
            Self::Date => Self::DateRev,
            Self::DateRev => Self::Path,
            Self::Path => Self::PathRev,
            Self::PathRev => Self::Size,
            Self::Size => Self::SizeRev,
            Self::SizeRev => Self::Ext,
            Self::Ext => Self::ExtRev,
            Self::ExtRev => Self::DirsFirst,
            Self::DirsFirst => Self::DirsLast,
            Self::DirsLast => Self::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Name => Self::DirsLast,
            Self::NameRev => Self::Name,
            Self::Date => Self::NameRev,
            Self::DateRev => Self::Date,
            Self::Path => Self::DateRev,
            Self::PathRev => Self::Path,
            Self::Size => Self::PathRev,
            Self::SizeRev => Self::Size,
            Self::Ext => Self::SizeRev,
            Self::ExtRev => Self::Ext,
            Self::DirsFirst => Self::ExtRev,
            Self::DirsLast => Self::DirsFirst,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NameRev => "name (r)",
            Self::Date => "date",
            Self::DateRev => "date (r)",
            Self::Path => "path",
            Self::PathRev => "path (r)",
            Self::Size => "size",
            Self::SizeRev => "size (r)",
            Self::Ext => "extension",
            Self::ExtRev => "extension (r)",
            Self::DirsFirst => "directories first",
            Self::DirsLast => "directories last",
        }
    }

    pub fn compare(self, a: &FileEntry, b: &FileEntry) -> Ordering {
        match self {
            Self::Name => total(by_name(a, b), a, b),
            Self::NameRev => total(by_name(a, b).reverse(), a, b),
            Self::Date => total(a.modified().cmp(&b.modified()), a, b),
            Self::DateRev => total(a.modified().cmp(&b.modified()).reverse(), a, b),
            Self::Path => total(a.path().cmp(&b.path()), a, b),
            Self::PathRev => total(a.path().cmp(&b.path()).reverse(), a, b),
            Self::Size => total(a.size().cmp(&b.size()), a, b),
            Self::SizeRev => total(a.size().cmp(&b.size()).reverse(), a, b),
            Self::Ext => total(by_ext(a, b), a, b),
            Self::ExtRev => total(by_ext(a, b).reverse(), a, b),
            // The directory orderings are deliberately partial; composed
            // with a stable sort they keep the previous order within a
            // kind.
            Self::DirsFirst => b.is_dir().cmp(&a.is_dir()),
            Self::DirsLast => a.is_dir().cmp(&b.is_dir()),
        }
    }

    /// Stable sort; sorting an already-sorted list is a no-op.
    pub fn sort(self, files: &mut [FileEntry]) {
        files.sort_by(|a, b| self.compare(a, b));
    }
}

fn total(primary: Ordering, a: &FileEntry, b: &FileEntry) -> Ordering {
    primary.then_with(|| a.key().cmp(&b.key()))
}

fn by_name(a: &FileEntry, b: &FileEntry) -> Ordering {
    // `10.txt` sorts after `9.txt`, not before `1.txt`.
    if let (Some(x), Some(y)) = (numeric_stem(a.name()), numeric_stem(b.name())) {
        return x.cmp(&y);
    }
    a.name().to_lowercase().cmp(&b.name().to_lowercase())
}

fn by_ext(a: &FileEntry, b: &FileEntry) -> Ordering {
    extension_of(a.name()).cmp(&extension_of(b.name()))
}

fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn numeric_stem(name: &str) -> Option<u64> {
    std::path::Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok())
}
