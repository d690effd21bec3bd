use std::{io, path::PathBuf};

/// Which piece of user-supplied configuration failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Regex,
    Date,
    Size,
    Mode,
}

impl ConfigKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Date => "date",
            Self::Size => "size",
            Self::Mode => "mode",
        }
    }
}

/// Error type shared by the trash engine, filter and codec modules.
///
/// Command-level code wraps these in `anyhow` with extra context; the
/// variants here are the ones callers actually branch on.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Bad user input, rejected before any side effect.
    #[error("invalid {} '{input}'", .kind.as_str())]
    ConfigInvalid { kind: ConfigKind, input: String },

    /// An input path does not exist.
    #[error("no such file or directory: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Moving the file would cross a device boundary.
    #[error("'{}' is on a different filesystem from its trash directory", .0.display())]
    CrossFilesystem(PathBuf),

    /// A `.trashinfo` file has gone missing.
    #[error("missing trashinfo file: {}", .0.display())]
    SidecarMissing(PathBuf),

    /// A `.trashinfo` file exists but is not parseable.
    #[error("malformed trashinfo file: {}", .0.display())]
    SidecarMalformed(PathBuf),

    /// A `.trashinfo` file carries an unparseable DeletionDate.
    #[error("bad deletion date '{value}' in {}", .path.display())]
    SidecarDateUnparseable { path: PathBuf, value: String },

    /// A trashed payload disappeared out-of-band.
    #[error("trashed file is gone: {}", .0.display())]
    PayloadMissing(PathBuf),

    /// Any underlying syscall failure.
    #[error("I/O error on {}", .0.display())]
    Io(PathBuf, #[source] io::Error),
}

impl Error {
    pub fn config(kind: ConfigKind, input: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            kind,
            input: input.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io(path.into(), error)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
