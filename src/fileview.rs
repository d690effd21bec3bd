use std::{
    fs::Metadata,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};

/// Type bit carried in [`FileEntry::mode`] for directories, so a mode
/// filter can tell `drwxr-xr-x` from `-rwxr-xr-x`.
pub const MODE_DIR: u32 = 0o040000;

/// A file sitting on disk, as found by the walker or named on the
/// command line.
#[derive(Debug, Clone)]
pub struct DiskFile {
    pub name: String,
    pub dir: PathBuf,
    pub size: i64,
    pub modified: DateTime<Local>,
    pub is_dir: bool,
    pub mode: u32,
}

impl DiskFile {
    /// Builds the view from an already-read [`Metadata`], as the walker
    /// does for each directory entry.
    pub fn from_metadata(name: &str, dir: &Path, meta: &Metadata) -> Self {
        Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            size: if meta.is_dir() { 0 } else { meta.len() as i64 },
            modified: mtime_of(meta),
            is_dir: meta.is_dir(),
            mode: view_mode(meta),
        }
    }

    /// Stats a user-supplied path, resolving it to an absolute location.
    pub fn from_path(path: &Path) -> Result<Self> {
        let abs = crate::pathutil::clean_path(path);
        let meta = std::fs::symlink_metadata(&abs).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::PathNotFound(path.to_path_buf())
            } else {
                Error::io(&abs, e)
            }
        })?;

        let name = abs
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| abs.display().to_string());
        let dir = abs.parent().unwrap_or(Path::new("/")).to_path_buf();

        Ok(Self::from_metadata(&name, &dir, &meta))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// A file living under some trash root's `files/`, reconstructed from
/// its `.trashinfo` sidecar. `trashed_at` is the deletion timestamp,
/// not the filesystem mtime.
#[derive(Debug, Clone)]
pub struct TrashedItem {
    pub name: String,
    pub payload_path: PathBuf,
    pub original_path: PathBuf,
    pub sidecar_path: PathBuf,
    pub trashed_at: DateTime<Local>,
    pub size: i64,
    pub is_dir: bool,
    pub mode: u32,
}

/// The uniform metadata view consumed by filters, sorts and the UI.
#[derive(Debug, Clone)]
pub enum FileEntry {
    Disk(DiskFile),
    Trashed(TrashedItem),
}

impl FileEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Disk(f) => &f.name,
            Self::Trashed(t) => &t.name,
        }
    }

    /// The path shown to the user: the on-disk location for disk files,
    /// the pre-deletion location for trashed items.
    pub fn path(&self) -> PathBuf {
        match self {
            Self::Disk(f) => f.path(),
            Self::Trashed(t) => t.original_path.clone(),
        }
    }

    /// Wall time used by time filters and the date column. For trashed
    /// items this is the deletion date.
    pub fn modified(&self) -> DateTime<Local> {
        match self {
            Self::Disk(f) => f.modified,
            Self::Trashed(t) => t.trashed_at,
        }
    }

    /// Directories report their recorded aggregate, or 0 when none is
    /// known.
    pub fn size(&self) -> i64 {
        match self {
            Self::Disk(f) => f.size,
            Self::Trashed(t) => t.size,
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            Self::Disk(f) => f.is_dir,
            Self::Trashed(t) => t.is_dir,
        }
    }

    /// Permission bits plus [`MODE_DIR`] for directories.
    pub fn mode(&self) -> u32 {
        match self {
            Self::Disk(f) => f.mode,
            Self::Trashed(t) => t.mode,
        }
    }

    /// Stable key, unique within one result set. Payload paths are
    /// unique even when two trashed items share an original path.
    pub fn key(&self) -> String {
        match self {
            Self::Disk(f) => f.path().display().to_string(),
            Self::Trashed(t) => t.payload_path.display().to_string(),
        }
    }
}

pub fn mtime_of(meta: &Metadata) -> DateTime<Local> {
    meta.modified()
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now())
}

pub fn view_mode(meta: &Metadata) -> u32 {
    let perms = meta.permissions().mode() & 0o7777;
    if meta.is_dir() { perms | MODE_DIR } else { perms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_disk_file_from_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("hello.txt");
        fs::write(&file, "hello").unwrap();

        let view = DiskFile::from_path(&file).unwrap();
        assert_eq!(view.name, "hello.txt");
        assert_eq!(view.size, 5);
        assert!(!view.is_dir);
        assert_eq!(view.path(), file);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let err = DiskFile::from_path(Path::new("/nonexistent/nope")).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn test_directory_mode_carries_dir_bit() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("sub");
        fs::create_dir(&dir).unwrap();

        let view = DiskFile::from_path(&dir).unwrap();
        assert!(view.is_dir);
        assert_eq!(view.size, 0);
        assert_eq!(view.mode & MODE_DIR, MODE_DIR);
    }
}
