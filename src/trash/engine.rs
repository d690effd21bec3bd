use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::Local;
use log::{debug, info, warn};
use rand::{Rng, distributions::Alphanumeric};

use crate::{
    error::{Error, Result},
    fileview::{FileEntry, TrashedItem, view_mode},
    filter::Filter,
    pathutil,
    prompt::{CollisionChoice, Prompter},
    trash::{DirSizesStore, FILES_DIR, INFO_DIR, TRASHINFO_EXT, roots, sidecar::Sidecar},
};

const SUFFIX_LEN: usize = 8;

/// Outcome of a batch operation that may stop partway through.
pub struct BatchResult {
    pub completed: usize,
    pub error: Option<anyhow::Error>,
}

impl BatchResult {
    fn done(completed: usize) -> Self {
        Self {
            completed,
            error: None,
        }
    }

    fn stopped(completed: usize, error: impl Into<anyhow::Error>) -> Self {
        Self {
            completed,
            error: Some(error.into()),
        }
    }
}

/// Moves one file into the trash responsible for its volume, together
/// with its sidecar. Either both land or neither does.
pub fn trash_file(path: &Path) -> Result<()> {
    let abs = pathutil::clean_path(path);
    if fs::symlink_metadata(&abs).is_err() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }

    let root = roots::resolve_trash_root(&abs)?;
    trash_into(&root, &abs)
}

fn trash_into(root: &Path, abs: &Path) -> Result<()> {
    let stem = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::PathNotFound(abs.to_path_buf()))?;

    let (sidecar_path, payload_path) = pick_unique_names(root, &stem);

    fs::rename(abs, &payload_path).map_err(|e| {
        if e.kind() == io::ErrorKind::CrossesDevices {
            Error::CrossFilesystem(abs.to_path_buf())
        } else {
            Error::io(abs, e)
        }
    })?;

    let sidecar = Sidecar::new(abs.to_path_buf(), Local::now());
    if let Err(e) = sidecar.write_to(&sidecar_path) {
        // Never leave a payload without its sidecar; put it back.
        let _ = fs::rename(&payload_path, abs);
        return Err(e);
    }

    debug!("trashed {} as {}", abs.display(), payload_path.display());
    Ok(())
}

/// Trashes a batch, logging failures and carrying on. Returns how many
/// made it.
pub fn trash_all(entries: &[FileEntry]) -> usize {
    let mut trashed = 0;
    for entry in entries {
        let path = entry.path();
        match trash_file(&path) {
            Ok(()) => trashed += 1,
            Err(e) => warn!("cannot trash '{}': {e}", path.display()),
        }
    }
    trashed
}

/// Returns a `(sidecar, payload)` pair that collides with nothing in
/// `root`: the bare stem when free, otherwise the stem plus a random
/// suffix checked against both subtrees.
fn pick_unique_names(root: &Path, stem: &str) -> (PathBuf, PathBuf) {
    let info_dir = root.join(INFO_DIR);
    let files_dir = root.join(FILES_DIR);

    let sidecar = info_dir.join(format!("{stem}.{TRASHINFO_EXT}"));
    let payload = files_dir.join(stem);
    if !exists(&sidecar) && !exists(&payload) {
        return (sidecar, payload);
    }

    debug!("{stem} exists in trash, generating a random name");
    loop {
        let suffix = random_suffix();
        let sidecar = info_dir.join(format!("{stem}{suffix}.{TRASHINFO_EXT}"));
        let payload = files_dir.join(format!("{stem}{suffix}"));
        if !exists(&sidecar) && !exists(&payload) {
            return (sidecar, payload);
        }
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Enumerates every known trash root, yielding the items that pass the
/// filter. Broken sidecars are warned about and skipped; a missing
/// payload still yields its row so the user can see it.
pub fn list_all(
    original_dir: Option<&Path>,
    filter: &Filter,
    sizes: &DirSizesStore,
) -> Vec<FileEntry> {
    list_roots(&roots::all_trash_roots(), original_dir, filter, sizes)
}

fn list_roots(
    roots: &[PathBuf],
    original_dir: Option<&Path>,
    filter: &Filter,
    sizes: &DirSizesStore,
) -> Vec<FileEntry> {
    let mut found = Vec::new();
    for root in roots {
        list_root(root, original_dir, filter, sizes, &mut found);
    }
    found
}

fn list_root(
    root: &Path,
    original_dir: Option<&Path>,
    filter: &Filter,
    sizes: &DirSizesStore,
    found: &mut Vec<FileEntry>,
) {
    let info_dir = root.join(INFO_DIR);
    let Ok(entries) = fs::read_dir(&info_dir) else {
        return;
    };
    debug!("scanning {}", info_dir.display());

    for entry in entries.flatten() {
        let sidecar_path = entry.path();
        if sidecar_path.extension().is_none_or(|e| e != TRASHINFO_EXT) {
            continue;
        }
        if entry.metadata().map(|m| m.is_dir()).unwrap_or(true) {
            continue;
        }

        let sidecar = match Sidecar::load(&sidecar_path) {
            Ok(sidecar) => sidecar,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        if let Some(ogdir) = original_dir {
            if sidecar.original_path.parent() != Some(ogdir) {
                continue;
            }
        }

        let Some(stem) = sidecar_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
        else {
            continue;
        };
        let payload_path = root.join(FILES_DIR).join(&stem);

        let name = sidecar
            .original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.clone());

        // lstat: a trashed symlink is trashed, not its target.
        let item = match fs::symlink_metadata(&payload_path) {
            Ok(meta) => {
                let size = if meta.is_dir() {
                    sizes.lookup(&stem).unwrap_or(0)
                } else {
                    meta.len() as i64
                };
                TrashedItem {
                    name,
                    payload_path,
                    original_path: sidecar.original_path,
                    sidecar_path,
                    trashed_at: sidecar.deleted_at,
                    size,
                    is_dir: meta.is_dir(),
                    mode: view_mode(&meta),
                }
            }
            Err(_) => {
                warn!("{}", Error::PayloadMissing(payload_path.clone()));
                TrashedItem {
                    name,
                    payload_path,
                    original_path: sidecar.original_path,
                    sidecar_path,
                    trashed_at: sidecar.deleted_at,
                    size: 0,
                    is_dir: false,
                    mode: 0,
                }
            }
        };

        let entry = FileEntry::Trashed(item);
        if filter.matches(&entry) {
            found.push(entry);
        }
    }
}

/// Restores each item to its original location, prompting when the
/// destination exists. Stops at the first hard error, reporting how
/// many came back first.
pub fn restore(entries: &[FileEntry], prompter: &dyn Prompter) -> BatchResult {
    let mut restored = 0;

    for entry in entries {
        let FileEntry::Trashed(item) = entry else {
            continue;
        };

        // Tolerate historical sidecars that stored %20 for spaces.
        let decoded = pathutil::percent_decode(&item.original_path.display().to_string());
        let mut dest = PathBuf::from(decoded);
        info!("restoring {} back to {}", item.name, dest.display());

        if fs::symlink_metadata(&dest).is_ok() {
            match prompter.resolve_collision(&dest) {
                Ok(CollisionChoice::Overwrite) => {}
                Ok(CollisionChoice::Rename(path)) => dest = path,
                Ok(CollisionChoice::Cancel) => continue,
                Err(e) => return BatchResult::stopped(restored, e),
            }
        }

        if let Some(parent) = dest.parent() {
            if !parent.is_dir() {
                if let Err(e) = fs::create_dir_all(parent) {
                    return BatchResult::stopped(restored, Error::io(parent, e));
                }
            }
        }

        if let Err(e) = fs::rename(&item.payload_path, &dest) {
            let err = if e.kind() == io::ErrorKind::NotFound {
                Error::PayloadMissing(item.payload_path.clone())
            } else {
                Error::io(&item.payload_path, e)
            };
            return BatchResult::stopped(restored, err);
        }
        if let Err(e) = fs::remove_file(&item.sidecar_path) {
            return BatchResult::stopped(restored, Error::io(&item.sidecar_path, e));
        }

        restored += 1;
    }

    BatchResult::done(restored)
}

/// Permanently removes each item, payload first, then sidecar. Stops
/// at the first error; a payload that already vanished is an error,
/// not a success.
pub fn purge(entries: &[FileEntry]) -> BatchResult {
    let mut removed = 0;

    for entry in entries {
        let FileEntry::Trashed(item) = entry else {
            continue;
        };
        info!("removing {} permanently", item.name);

        let result = match fs::symlink_metadata(&item.payload_path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&item.payload_path),
            Ok(_) => fs::remove_file(&item.payload_path),
            Err(_) => {
                return BatchResult::stopped(
                    removed,
                    Error::PayloadMissing(item.payload_path.clone()),
                );
            }
        };
        if let Err(e) = result {
            return BatchResult::stopped(removed, Error::io(&item.payload_path, e));
        }

        if let Err(e) = fs::remove_file(&item.sidecar_path) {
            return BatchResult::stopped(removed, Error::io(&item.sidecar_path, e));
        }

        removed += 1;
    }

    BatchResult::done(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOptions;
    use crate::prompt::AutoPrompter;
    use anyhow::Result as PromptResult;
    use tempfile::TempDir;

    fn trash_root() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(FILES_DIR)).unwrap();
        fs::create_dir_all(tmp.path().join(INFO_DIR)).unwrap();
        tmp
    }

    fn blank() -> Filter {
        Filter::new(FilterOptions::default()).unwrap()
    }

    fn listed(root: &TempDir) -> Vec<FileEntry> {
        let sizes = DirSizesStore::default();
        list_roots(
            &[root.path().to_path_buf()],
            None,
            &blank(),
            &sizes,
        )
    }

    struct RenameTo(PathBuf);

    impl Prompter for RenameTo {
        fn confirm(&self, _message: &str) -> PromptResult<bool> {
            Ok(true)
        }

        fn resolve_collision(&self, _dest: &Path) -> PromptResult<CollisionChoice> {
            Ok(CollisionChoice::Rename(self.0.clone()))
        }
    }

    struct Overwriting;

    impl Prompter for Overwriting {
        fn confirm(&self, _message: &str) -> PromptResult<bool> {
            Ok(true)
        }

        fn resolve_collision(&self, _dest: &Path) -> PromptResult<CollisionChoice> {
            Ok(CollisionChoice::Overwrite)
        }
    }

    #[test]
    fn test_trash_creates_payload_and_sidecar() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("hello.txt");
        fs::write(&file, "hello").unwrap();

        trash_into(root.path(), &file).unwrap();

        assert!(!file.exists());
        let payload = root.path().join(FILES_DIR).join("hello.txt");
        assert_eq!(fs::read_to_string(&payload).unwrap(), "hello");

        let info = root.path().join(INFO_DIR).join("hello.txt.trashinfo");
        let content = fs::read_to_string(&info).unwrap();
        assert!(content.starts_with("[Trash Info]\n"));
        assert!(content.contains(&format!("Path={}\n", file.display())));
        assert!(content.contains("DeletionDate="));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_trash_missing_path() {
        let err = trash_file(Path::new("/no/such/thing")).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn test_collision_gets_random_suffix() {
        let root = trash_root();
        let src = TempDir::new().unwrap();

        for content in ["first", "second"] {
            let file = src.path().join("dup.txt");
            fs::write(&file, content).unwrap();
            trash_into(root.path(), &file).unwrap();
        }

        let mut names: Vec<String> = fs::read_dir(root.path().join(FILES_DIR))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "dup.txt");
        assert_eq!(names[1].len(), "dup.txt".len() + SUFFIX_LEN);
        assert!(names[1].starts_with("dup.txt"));
        let suffix = &names[1]["dup.txt".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));

        // Both sidecars point at the same original.
        let items = listed(&root);
        assert_eq!(items.len(), 2);
        for item in &items {
            assert_eq!(item.path(), src.path().join("dup.txt"));
        }
    }

    #[test]
    fn test_enumerate_yields_trashed_item() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("doc.md");
        fs::write(&file, "# doc").unwrap();

        trash_into(root.path(), &file).unwrap();
        let items = listed(&root);
        assert_eq!(items.len(), 1);

        let FileEntry::Trashed(item) = &items[0] else {
            panic!("expected a trashed item");
        };
        assert_eq!(item.name, "doc.md");
        assert_eq!(item.original_path, file);
        assert_eq!(item.size, 5);
        let age = Local::now() - item.trashed_at;
        assert!(age.num_seconds() < 60);
    }

    #[test]
    fn test_enumerate_filters_by_original_dir() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("doc.md");
        fs::write(&file, "x").unwrap();
        trash_into(root.path(), &file).unwrap();

        let sizes = DirSizesStore::default();
        let roots = [root.path().to_path_buf()];
        let hit = list_roots(&roots, Some(src.path()), &blank(), &sizes);
        assert_eq!(hit.len(), 1);
        let miss = list_roots(&roots, Some(Path::new("/elsewhere")), &blank(), &sizes);
        assert!(miss.is_empty());
    }

    #[test]
    fn test_enumerate_keeps_missing_payload_row() {
        let root = trash_root();
        fs::write(
            root.path().join(INFO_DIR).join("ghost.trashinfo"),
            "[Trash Info]\nPath=/tmp/ghost\nDeletionDate=2024-06-01T10:00:00\n",
        )
        .unwrap();

        let items = listed(&root);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].size(), 0);
    }

    #[test]
    fn test_enumerate_skips_broken_sidecars() {
        let root = trash_root();
        fs::write(root.path().join(INFO_DIR).join("bad.trashinfo"), "oops").unwrap();
        fs::write(root.path().join(INFO_DIR).join("notes.txt"), "not a sidecar").unwrap();
        assert!(listed(&root).is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("back.txt");
        fs::write(&file, "data").unwrap();

        trash_into(root.path(), &file).unwrap();
        assert!(!file.exists());

        let items = listed(&root);
        let result = restore(&items, &AutoPrompter);
        assert!(result.error.is_none());
        assert_eq!(result.completed, 1);

        assert_eq!(fs::read_to_string(&file).unwrap(), "data");
        assert!(listed(&root).is_empty());
    }

    #[test]
    fn test_restore_recreates_missing_parents() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let nested = src.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("deep.txt");
        fs::write(&file, "deep").unwrap();

        trash_into(root.path(), &file).unwrap();
        fs::remove_dir_all(src.path().join("a")).unwrap();

        let items = listed(&root);
        let result = restore(&items, &AutoPrompter);
        assert!(result.error.is_none());
        assert!(file.exists());
    }

    #[test]
    fn test_restore_collision_rename() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("doc");
        fs::write(&file, "old").unwrap();

        trash_into(root.path(), &file).unwrap();
        // A new file has taken the original spot.
        fs::write(&file, "new").unwrap();

        let renamed = src.path().join("doc.bak");
        let items = listed(&root);
        let result = restore(&items, &RenameTo(renamed.clone()));
        assert!(result.error.is_none());
        assert_eq!(result.completed, 1);

        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
        assert_eq!(fs::read_to_string(&renamed).unwrap(), "old");
        assert!(listed(&root).is_empty());
    }

    #[test]
    fn test_restore_collision_cancel_skips() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("doc");
        fs::write(&file, "old").unwrap();
        trash_into(root.path(), &file).unwrap();
        fs::write(&file, "new").unwrap();

        let items = listed(&root);
        let result = restore(&items, &AutoPrompter);
        assert!(result.error.is_none());
        assert_eq!(result.completed, 0);

        // Still in the trash, original untouched.
        assert_eq!(listed(&root).len(), 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
    }

    #[test]
    fn test_restore_collision_overwrite() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let file = src.path().join("doc");
        fs::write(&file, "old").unwrap();
        trash_into(root.path(), &file).unwrap();
        fs::write(&file, "new").unwrap();

        let items = listed(&root);
        let result = restore(&items, &Overwriting);
        assert_eq!(result.completed, 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "old");
    }

    #[test]
    fn test_purge_removes_both_halves() {
        let root = trash_root();
        let src = TempDir::new().unwrap();
        let dir = src.path().join("bundle");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("inner.txt"), "x").unwrap();

        trash_into(root.path(), &dir).unwrap();
        let items = listed(&root);

        let result = purge(&items);
        assert!(result.error.is_none());
        assert_eq!(result.completed, 1);
        assert!(listed(&root).is_empty());
        assert!(
            fs::read_dir(root.path().join(FILES_DIR))
                .unwrap()
                .next()
                .is_none()
        );
    }

    #[test]
    fn test_purge_missing_payload_is_an_error() {
        let root = trash_root();
        fs::write(
            root.path().join(INFO_DIR).join("ghost.trashinfo"),
            "[Trash Info]\nPath=/tmp/ghost\nDeletionDate=2024-06-01T10:00:00\n",
        )
        .unwrap();

        let items = listed(&root);
        let result = purge(&items);
        assert_eq!(result.completed, 0);
        assert!(result.error.is_some());
    }
}
