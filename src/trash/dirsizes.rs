use std::{collections::HashMap, fs, path::Path, path::PathBuf, time::UNIX_EPOCH};

use log::{debug, warn};

use crate::{pathutil, trash::FILES_DIR};

const DIRECTORYSIZES: &str = "directorysizes";

#[derive(Debug, Clone, Copy)]
struct DirSize {
    size: i64,
    mtime: i64,
}

/// Aggregate sizes for trashed directories, backed by each trash
/// root's `directorysizes` file so enumeration never has to `du` the
/// same directory twice.
#[derive(Debug, Default)]
pub struct DirSizesStore {
    entries: HashMap<String, DirSize>,
}

impl DirSizesStore {
    /// Reads every root's `directorysizes`. Malformed lines are logged
    /// and skipped; a missing file just means nothing is cached yet.
    pub fn load(roots: &[PathBuf]) -> Self {
        let mut entries = HashMap::new();

        for root in roots {
            let file = root.join(DIRECTORYSIZES);
            let Ok(content) = fs::read_to_string(&file) else {
                continue;
            };
            for line in content.lines() {
                match parse_line(line) {
                    Some((name, record)) => {
                        entries.insert(name, record);
                    }
                    None => warn!("malformed line '{line}' in {}", file.display()),
                }
            }
        }

        Self { entries }
    }

    /// The recorded aggregate for a payload basename, if any.
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.entries.get(name).map(|record| record.size)
    }

    /// Discovers directories that have no record yet, computes their
    /// aggregates, and rewrites each root's `directorysizes`. The
    /// rewrite goes through a temp file so readers never see a torn
    /// cache.
    pub fn flush(&mut self, roots: &[PathBuf]) {
        for root in roots {
            let files_dir = root.join(FILES_DIR);
            let Ok(entries) = fs::read_dir(&files_dir) else {
                continue;
            };

            let mut names = Vec::new();
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                let Ok(meta) = entry.metadata() else { continue };
                if !meta.is_dir() {
                    continue;
                }

                if !self.entries.contains_key(&name) {
                    let mtime = meta
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_secs() as i64)
                        .unwrap_or(0);
                    let size = disk_usage(&entry.path());
                    debug!("recording {name}: {size} bytes");
                    self.entries.insert(name.clone(), DirSize { size, mtime });
                }
                names.push(name);
            }

            if let Err(e) = self.write_root(root, &names) {
                warn!("cannot write {}: {e}", root.join(DIRECTORYSIZES).display());
            }
        }
    }

    fn write_root(&self, root: &Path, names: &[String]) -> std::io::Result<()> {
        let mut out = String::new();
        for name in names {
            if let Some(record) = self.entries.get(name) {
                out.push_str(&format!(
                    "{} {} {}\n",
                    record.size,
                    record.mtime,
                    pathutil::percent_encode(name)
                ));
            }
        }

        let target = root.join(DIRECTORYSIZES);
        let tmp = root.join(format!("{DIRECTORYSIZES}.tmp"));
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &target)
    }
}

fn parse_line(line: &str) -> Option<(String, DirSize)> {
    let mut fields = line.splitn(3, ' ');
    let size = fields.next()?.parse().ok()?;
    let mtime = fields.next()?.parse().ok()?;
    let name = fields.next()?;
    if name.is_empty() {
        return None;
    }
    Some((pathutil::percent_decode(name), DirSize { size, mtime }))
}

/// Recursive byte count. Symlinks count as themselves.
fn disk_usage(dir: &Path) -> i64 {
    let mut total = 0;
    let Ok(entries) = fs::read_dir(dir) else {
        return total;
    };
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if meta.is_dir() {
            total += disk_usage(&entry.path());
        } else {
            total += meta.len() as i64;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root_with_dir(name: &str, content_bytes: usize) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(FILES_DIR).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("data.bin"), vec![0u8; content_bytes]).unwrap();
        tmp
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = DirSizesStore::load(&[tmp.path().to_path_buf()]);
        assert!(store.lookup("anything").is_none());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(DIRECTORYSIZES),
            "120 1700000000 good\nnot a line\n99 x bad\n",
        )
        .unwrap();

        let store = DirSizesStore::load(&[tmp.path().to_path_buf()]);
        assert_eq!(store.lookup("good"), Some(120));
        assert!(store.lookup("bad").is_none());
    }

    #[test]
    fn test_flush_discovers_and_persists() {
        let tmp = root_with_dir("bundle", 2048);
        let roots = vec![tmp.path().to_path_buf()];

        let mut store = DirSizesStore::load(&roots);
        assert!(store.lookup("bundle").is_none());

        store.flush(&roots);
        assert_eq!(store.lookup("bundle"), Some(2048));

        // A fresh load sees the record that flush wrote out.
        let reloaded = DirSizesStore::load(&roots);
        assert_eq!(reloaded.lookup("bundle"), Some(2048));
    }

    #[test]
    fn test_names_with_spaces_round_trip() {
        let tmp = root_with_dir("my stuff", 10);
        let roots = vec![tmp.path().to_path_buf()];

        let mut store = DirSizesStore::load(&roots);
        store.flush(&roots);

        let written = fs::read_to_string(tmp.path().join(DIRECTORYSIZES)).unwrap();
        assert!(written.contains("my%20stuff"));

        let reloaded = DirSizesStore::load(&roots);
        assert_eq!(reloaded.lookup("my stuff"), Some(10));
    }

    #[test]
    fn test_flush_drops_departed_entries() {
        let tmp = root_with_dir("keeper", 1);
        let roots = vec![tmp.path().to_path_buf()];
        fs::write(
            tmp.path().join(DIRECTORYSIZES),
            "500 1700000000 long%20gone\n",
        )
        .unwrap();

        let mut store = DirSizesStore::load(&roots);
        store.flush(&roots);

        let written = fs::read_to_string(tmp.path().join(DIRECTORYSIZES)).unwrap();
        assert!(written.contains("keeper"));
        assert!(!written.contains("long%20gone"));
    }
}
