use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{
    fileview::{DiskFile, FileEntry},
    filter::Filter,
    pathutil,
};

/// Finds files under `dir` that pass `filter`, either one level deep or
/// as a full depth-first walk. Symlinks are reported as themselves and
/// never followed.
pub fn find_files(dir: &Path, recursive: bool, filter: &Filter) -> Vec<FileEntry> {
    let dir = if dir.as_os_str().is_empty() {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        pathutil::clean_path(dir)
    };

    debug!(
        "looking for files{} in {}",
        if recursive { " recursively" } else { "" },
        dir.display()
    );

    let mut found = Vec::new();
    if recursive {
        walk_dir(&dir, filter, &mut found);
    } else {
        read_dir(&dir, filter, &mut found);
    }
    found
}

fn read_dir(dir: &Path, filter: &Filter, found: &mut Vec<FileEntry>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().into_owned();
        // DirEntry metadata does not traverse symlinks, which is what
        // we want: a symlink is listed, its target never touched.
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("cannot stat {}: {e}", entry.path().display());
                continue;
            }
        };

        let candidate = FileEntry::Disk(DiskFile::from_metadata(&name, dir, &meta));
        if filter.matches(&candidate) {
            found.push(candidate);
        }
    }
}

fn walk_dir(dir: &Path, filter: &Filter, found: &mut Vec<FileEntry>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            // Unreadable subtrees are skipped, not fatal.
            warn!("cannot read directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("cannot stat {}: {e}", entry.path().display());
                continue;
            }
        };

        let is_dir = meta.is_dir();
        let hidden = name.starts_with('.');

        let candidate = FileEntry::Disk(DiskFile::from_metadata(&name, dir, &meta));
        if filter.matches(&candidate) {
            found.push(candidate);
        }

        // Hidden directories prune their whole subtree.
        if is_dir && !(hidden && filter.ignores_hidden()) {
            walk_dir(&entry.path(), filter, found);
        }
    }
}
